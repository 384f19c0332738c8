//! Input data model for the inventory document and variable files
//!
//! The inventory document has a required `projects` mapping and an optional
//! `groups` mapping; both are decoded order-preserving, since document order
//! drives ancestor iteration and the default machine order. Parsing the YAML
//! text itself is the caller's concern; this module only classifies
//! already-parsed values.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::graph::GroupGraph;
use crate::resolver::Contribution;

/// One named node of the inventory: an environment, role, or project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupDef {
    /// Host table keyed by environment (`development`, `staging`, ...)
    #[serde(default)]
    pub web: Option<Value>,

    /// Declared child groups, in order
    #[serde(default)]
    pub children: Vec<String>,

    /// Explicit parentage outside the graph (projects only)
    #[serde(default)]
    pub parents: Vec<String>,
}

impl GroupDef {
    /// The raw `web.development` host value, if any
    pub fn dev_host(&self) -> Option<&Value> {
        self.web.as_ref().and_then(|web| web.get("development"))
    }

    /// Whether this group has development configuration
    pub fn has_dev(&self) -> bool {
        self.dev_host().is_some()
    }
}

/// The parsed inventory document, order-preserving
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    /// `projects` section: project name -> definition
    pub projects: Vec<(String, GroupDef)>,
    /// `groups` section: group name -> definition
    pub groups: Vec<(String, GroupDef)>,
}

impl Inventory {
    /// Decode an inventory document
    ///
    /// `projects` is required; `groups` is optional. Unknown keys inside a
    /// definition are ignored (the provisioning side reads them, the resolver
    /// does not).
    pub fn from_value(doc: &Value) -> Result<Self> {
        let projects = doc
            .get("projects")
            .ok_or_else(|| Error::inventory("missing required `projects` mapping"))?;
        let projects = decode_section("projects", projects)?;

        let groups = match doc.get("groups") {
            Some(groups) => decode_section("groups", groups)?,
            None => Vec::new(),
        };

        Ok(Self { projects, groups })
    }

    /// Projects that have development configuration, in document order
    pub fn projects_with_dev(&self) -> Vec<(&str, &GroupDef)> {
        self.projects
            .iter()
            .filter(|(_, def)| def.has_dev())
            .map(|(name, def)| (name.as_str(), def))
            .collect()
    }

    /// The parent/child adjacency declared by the `groups` section
    pub fn graph(&self) -> GroupGraph {
        GroupGraph::new(
            self.groups
                .iter()
                .map(|(name, def)| (name.clone(), def.children.clone()))
                .collect(),
        )
    }

    /// Explicit `parents` declared for a project, if any
    pub fn explicit_parents(&self, name: &str) -> &[String] {
        self.projects
            .iter()
            .find(|(project, _)| project == name)
            .map(|(_, def)| def.parents.as_slice())
            .unwrap_or(&[])
    }

    /// Machine candidates: dev-configured groups, then dev-configured
    /// projects, in document order
    ///
    /// A project sharing a name with a group replaces the group's definition
    /// but keeps the group's position.
    pub fn machine_candidates(&self) -> Vec<(String, GroupDef)> {
        let mut candidates: Vec<(String, GroupDef)> = self
            .groups
            .iter()
            .filter(|(_, def)| def.has_dev())
            .cloned()
            .collect();

        for (name, def) in self.projects_with_dev() {
            if let Some(existing) = candidates.iter_mut().find(|(n, _)| n == name) {
                existing.1 = def.clone();
            } else {
                candidates.push((name.to_string(), def.clone()));
            }
        }
        candidates
    }
}

fn decode_section(section: &str, value: &Value) -> Result<Vec<(String, GroupDef)>> {
    let mapping = value
        .as_mapping()
        .ok_or_else(|| Error::inventory(format!("`{section}` must be a mapping")))?;

    let mut entries = Vec::with_capacity(mapping.len());
    for (name, def) in mapping {
        let name = name
            .as_str()
            .ok_or_else(|| Error::inventory(format!("`{section}` keys must be strings")))?;
        let def: GroupDef = serde_yaml::from_value(def.clone())
            .map_err(|err| Error::inventory(format!("`{section}.{name}`: {err}")))?;
        entries.push((name.to_string(), def));
    }
    Ok(entries)
}

/// Classified shape of a `web.development` host entry
///
/// A single classification step instead of shape-sniffing at every use: a
/// bare string is the address; a list of strings contributes its first
/// element as the address; a list of mappings contributes the first mapping
/// as a bag of machine-level overlay fields.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Literal(String),
    List(Vec<String>),
    OverlayList(Vec<Mapping>),
}

impl HostValue {
    /// Classify a raw host value; `None` means the shape is unusable
    pub fn classify(value: &Value) -> Option<Self> {
        match value {
            Value::String(address) => Some(Self::Literal(address.clone())),
            Value::Sequence(items) => match items.first()? {
                Value::String(_) => Some(Self::List(
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .collect(),
                )),
                Value::Mapping(_) => Some(Self::OverlayList(
                    items
                        .iter()
                        .filter_map(|v| v.as_mapping().cloned())
                        .collect(),
                )),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A project's site-variable document
///
/// `site_vars` maps each site key to its own contributions layer;
/// `site_vars_for_project` is an optional project-wide contributions layer
/// folded before the per-site layers.
#[derive(Debug, Clone, Default)]
pub struct SiteVarsDoc {
    pub site_vars: Vec<(String, Vec<Contribution>)>,
    pub site_vars_for_project: Vec<Contribution>,
}

impl SiteVarsDoc {
    /// Decode a per-project site-variable document
    pub fn from_value(project: &str, doc: &Value) -> Result<Self> {
        let site_vars = doc
            .get("site_vars")
            .and_then(Value::as_mapping)
            .ok_or_else(|| {
                Error::inventory(format!(
                    "project `{project}`: site variables must contain a `site_vars` mapping"
                ))
            })?;

        let mut sites = Vec::with_capacity(site_vars.len());
        for (site, layer) in site_vars {
            let site = site.as_str().ok_or_else(|| {
                Error::inventory(format!("project `{project}`: site keys must be strings"))
            })?;
            sites.push((site.to_string(), Contribution::layer_from_value(layer)?));
        }

        let for_project = match doc.get("site_vars_for_project") {
            Some(layer) => Contribution::layer_from_value(layer)?,
            None => Vec::new(),
        };

        Ok(Self {
            site_vars: sites,
            site_vars_for_project: for_project,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn inventory_requires_projects() {
        let err = Inventory::from_value(&yaml("{groups: {}}")).unwrap_err();
        assert!(matches!(err, Error::Inventory { .. }));
    }

    #[test]
    fn sections_preserve_document_order() {
        let inv = Inventory::from_value(&yaml(
            "projects:\n  zeta: {web: {development: 1.2.3.4}}\n  alpha: {web: {development: 1.2.3.5}}\n",
        ))
        .unwrap();
        let names: Vec<&str> = inv.projects.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn projects_without_dev_are_not_candidates() {
        let inv = Inventory::from_value(&yaml(
            "projects:\n  live: {web: {production: 9.9.9.9}}\n  dev: {web: {development: 1.1.1.1}}\n",
        ))
        .unwrap();
        let names: Vec<String> = inv
            .machine_candidates()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["dev"]);
    }

    #[test]
    fn project_definition_replaces_same_named_group_in_place() {
        let inv = Inventory::from_value(&yaml(
            "projects:\n  shared: {web: {development: 2.2.2.2}}\n\
             groups:\n  shared: {web: {development: 1.1.1.1}}\n  other: {web: {development: 3.3.3.3}}\n",
        ))
        .unwrap();
        let candidates = inv.machine_candidates();
        assert_eq!(candidates[0].0, "shared");
        assert_eq!(
            candidates[0].1.dev_host(),
            Some(&yaml("2.2.2.2"))
        );
        assert_eq!(candidates[1].0, "other");
    }

    #[test]
    fn classify_host_value_shapes() {
        assert_eq!(
            HostValue::classify(&yaml("10.0.0.5")),
            Some(HostValue::Literal("10.0.0.5".to_string()))
        );
        assert_eq!(
            HostValue::classify(&yaml("[10.0.0.5, 10.0.0.6]")),
            Some(HostValue::List(vec![
                "10.0.0.5".to_string(),
                "10.0.0.6".to_string()
            ]))
        );
        assert!(matches!(
            HostValue::classify(&yaml("[{ansible_host: 10.0.0.6}]")),
            Some(HostValue::OverlayList(_))
        ));
        assert_eq!(HostValue::classify(&yaml("[]")), None);
        assert_eq!(HostValue::classify(&yaml("42")), None);
    }

    #[test]
    fn site_vars_doc_requires_site_vars_mapping() {
        let err = SiteVarsDoc::from_value("p1", &yaml("{}")).unwrap_err();
        assert!(err.to_string().contains("p1"));
    }

    #[test]
    fn site_vars_doc_decodes_sites_in_order() {
        let doc = SiteVarsDoc::from_value(
            "p1",
            &yaml(
                "site_vars:\n  b.dev:\n    - all: {x: 1}\n  a.dev:\n    - all: {x: 2}\n\
                 site_vars_for_project:\n  - all: {y: 1}\n",
            ),
        )
        .unwrap();
        let sites: Vec<&str> = doc.site_vars.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(sites, vec!["b.dev", "a.dev"]);
        assert_eq!(doc.site_vars_for_project.len(), 1);
    }
}
