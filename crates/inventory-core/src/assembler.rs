//! Machine assembly across the whole inventory
//!
//! A [`ResolutionSession`] is constructed once per run from the parsed
//! inventory, the variable layers, the provisioner overlay, and the
//! invocation context. [`ResolutionSession::run`] computes candidates,
//! selection, and the ordered machine map in explicit steps; there is no
//! memoize-on-first-access state. Per-project site variables are resolved
//! once and cached for every machine that targets the project.

use std::collections::HashMap;

use serde::Serialize;
use serde::ser::SerializeMap;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::graph::GroupGraph;
use crate::inventory::{Inventory, SiteVarsDoc};
use crate::machine::{Machine, SitePathMap, derive_site_hosts, derive_site_paths};
use crate::merge::deep_merge;
use crate::resolver::{Contribution, combine_for_groups, resolve_for_groups};
use crate::selection::{Invocation, select};

/// The ordered variable layers every project resolution folds
#[derive(Debug, Clone, Default)]
pub struct VariableLayers {
    /// Site defaults, lowest precedence
    pub site_vars_default: Vec<Contribution>,
    /// Site globals, override defaults
    pub site_vars_global: Vec<Contribution>,
    /// Per-project documents (project-wide layer + per-site layers)
    pub project_vars: HashMap<String, SiteVarsDoc>,
}

/// The machine map, keyed by group name, in boot order
#[derive(Debug, Clone, Default)]
pub struct MachineMap {
    entries: Vec<(String, Machine)>,
}

impl MachineMap {
    pub fn get(&self, name: &str) -> Option<&Machine> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, machine)| machine)
    }

    /// Machine names in boot order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Machine)> {
        self.entries.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MachineMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, machine) in &self.entries {
            map.serialize_entry(name, machine)?;
        }
        map.end()
    }
}

/// Outcome of a resolution run
#[derive(Debug, Clone)]
pub struct Resolution {
    /// All machines, selected-first so boot order matches selection order
    pub machines: MachineMap,
    /// Names the invocation selected, in selection order
    ///
    /// Provisioning is conditioned on a machine being the *last* selected
    /// one, so callers must preserve this order.
    pub selected: Vec<String>,
}

/// One resolution run over a fully loaded inventory
#[derive(Debug, Clone)]
pub struct ResolutionSession {
    inventory: Inventory,
    layers: VariableLayers,
    vconfig: Mapping,
    local_vconfigs: HashMap<String, Mapping>,
    invocation: Invocation,
}

/// Per-project site info, resolved once and shared across machines
struct ProjectSites {
    paths: SitePathMap,
    hosts: Vec<String>,
    multisite_subdomains: bool,
}

impl ResolutionSession {
    pub fn new(
        inventory: Inventory,
        layers: VariableLayers,
        vconfig: Mapping,
        invocation: Invocation,
    ) -> Self {
        Self {
            inventory,
            layers,
            vconfig,
            local_vconfigs: HashMap::new(),
            invocation,
        }
    }

    /// Install per-project provisioner overrides (`vagrant.local.yml`
    /// contents, keyed by project name)
    pub fn with_local_vconfigs(mut self, local_vconfigs: HashMap<String, Mapping>) -> Self {
        self.local_vconfigs = local_vconfigs;
        self
    }

    /// Resolve the full machine map and the invocation's selection
    ///
    /// Fails fast on the first malformed input; no partial map is returned.
    pub fn run(self) -> Result<Resolution> {
        let graph = self.inventory.graph();
        let dev_projects: Vec<String> = self
            .inventory
            .projects_with_dev()
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();

        // Base fields first: ip, overlay, autostart. Target projects and the
        // merged vconfig are needed before site variables are.
        let mut bases: Vec<(String, Machine, Vec<String>)> = Vec::new();
        for (name, def) in self.inventory.machine_candidates() {
            let host = def.dev_host().ok_or_else(|| Error::HostValue {
                group: name.clone(),
            })?;
            let mut machine = Machine::from_host_value(&name, host)?;
            let targets = self.target_projects(&name, &graph, &dev_projects);

            let base_project = machine
                .base_project()
                .map(String::from)
                .or_else(|| targets.first().cloned());
            let mut vconfig = self.vconfig.clone();
            if let Some(local) = base_project
                .as_deref()
                .and_then(|p| self.local_vconfigs.get(p))
            {
                for (key, value) in local {
                    vconfig.insert(key.clone(), value.clone());
                }
            }
            machine.apply_vconfig(vconfig);

            tracing::debug!(group = name, ?targets, "machine candidate");
            bases.push((name, machine, targets));
        }

        // Selection drives assembly order: machines named on the invocation
        // come first, in the order named.
        let flags: Vec<(String, bool)> = bases
            .iter()
            .map(|(name, machine, _)| (name.clone(), machine.vagrant_autostart))
            .collect();
        let selected = select(&flags, &self.invocation);

        let mut ordered: Vec<(String, Machine, Vec<String>)> = Vec::new();
        for name in &selected {
            if let Some(pos) = bases.iter().position(|(n, _, _)| n == name) {
                ordered.push(bases.remove(pos));
            }
        }
        ordered.extend(bases);

        // Site info, memoized per project (write-once, read-many).
        let mut project_cache: HashMap<String, ProjectSites> = HashMap::new();
        let mut entries = Vec::with_capacity(ordered.len());
        for (name, mut machine, targets) in ordered {
            for project in &targets {
                if !project_cache.contains_key(project) {
                    let sites = self.resolve_project_sites(project, &graph)?;
                    project_cache.insert(project.clone(), sites);
                }
                let sites = &project_cache[project];
                for (site, paths) in sites.paths.iter() {
                    machine.site_paths.insert(site.to_string(), paths.clone());
                }
                machine.extend_site_hosts(&sites.hosts);
                // Overwritten on each iteration: only the last target
                // project's flag survives for multi-project machines.
                machine.multisite_subdomains = sites.multisite_subdomains;
            }
            entries.push((name, machine));
        }

        Ok(Resolution {
            machines: MachineMap { entries },
            selected,
        })
    }

    /// Projects a group's machine serves
    ///
    /// The universal `all-projects` root targets every dev-configured
    /// project; any other group targets its dev-configured descendant
    /// projects, falling back to the group itself when there are none.
    /// Sorted so multi-project machines get a stable default base project.
    fn target_projects(
        &self,
        group: &str,
        graph: &GroupGraph,
        dev_projects: &[String],
    ) -> Vec<String> {
        let mut targets: Vec<String> = if group == "all-projects" {
            dev_projects.to_vec()
        } else {
            graph
                .descendants(group)
                .into_iter()
                .filter(|child| dev_projects.contains(child))
                .collect()
        };

        if targets.is_empty() {
            vec![group.to_string()]
        } else {
            targets.sort();
            targets
        }
    }

    /// Resolve one project's site paths, hostnames, and multisite flag
    fn resolve_project_sites(&self, project: &str, graph: &GroupGraph) -> Result<ProjectSites> {
        let doc = self
            .layers
            .project_vars
            .get(project)
            .ok_or_else(|| Error::ProjectVars {
                project: project.to_string(),
            })?;

        let groups_to_match =
            graph.effective_parents(project, self.inventory.explicit_parents(project));

        let base = resolve_for_groups(
            &groups_to_match,
            &[
                &self.layers.site_vars_default,
                &self.layers.site_vars_global,
                &doc.site_vars_for_project,
            ],
        );

        let mut paths = SitePathMap::default();
        let mut hosts = Vec::new();
        let mut multisite_subdomains = false;
        for (site, site_layer) in &doc.site_vars {
            // Fresh clone per site: one site's variables must not leak into
            // the next site of the same project.
            let mut vars = base.clone();
            deep_merge(&mut vars, &combine_for_groups(&groups_to_match, site_layer));

            paths.insert(site.clone(), derive_site_paths(site, &vars));
            hosts.extend(derive_site_hosts(project, site, &vars)?);
            multisite_subdomains |= site_multisite_subdomains(&vars);
        }

        tracing::debug!(project, sites = paths.len(), "resolved project site vars");
        Ok(ProjectSites {
            paths,
            hosts,
            multisite_subdomains,
        })
    }
}

/// Whether a site's merged variables enable subdomain-style multisite
fn site_multisite_subdomains(vars: &Value) -> bool {
    let multisite = vars.get("multisite");
    let enabled = multisite
        .and_then(|m| m.get("enabled"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let subdomains = multisite
        .and_then(|m| m.get("subdomains"))
        .and_then(Value::as_bool)
        .unwrap_or(false);
    enabled && subdomains
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn multisite_requires_both_enabled_and_subdomains() {
        assert!(site_multisite_subdomains(&yaml(
            "{multisite: {enabled: true, subdomains: true}}"
        )));
        assert!(!site_multisite_subdomains(&yaml(
            "{multisite: {enabled: true}}"
        )));
        assert!(!site_multisite_subdomains(&yaml(
            "{multisite: {subdomains: true}}"
        )));
        assert!(!site_multisite_subdomains(&yaml("{}")));
    }
}
