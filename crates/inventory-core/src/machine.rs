//! The resolved machine record and its per-site derivations

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde::ser::SerializeMap;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::inventory::HostValue;

// Template placeholders in path/hostname values, e.g. `{{ site }}` in
// `/srv/www/{{ site }}/current`. Bodies are greedy.
static SITE_TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{ site.*\}\}").expect("valid template regex"));
static PROJECT_TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{ project.*\}\}").expect("valid template regex"));

/// Substitute the site key into a `{{ site }}` template
pub fn substitute_site(template: &str, site: &str) -> String {
    SITE_TEMPLATE.replace_all(template, site).into_owned()
}

/// Substitute the project name into a `{{ project }}` template
pub fn substitute_project(template: &str, project: &str) -> String {
    PROJECT_TEMPLATE.replace_all(template, project).into_owned()
}

/// Resolved filesystem paths for one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitePaths {
    /// Host-side working tree, `{{ site }}` substituted
    pub local: String,
    /// Deploy-side current-release path
    pub current: String,
}

/// Site key -> resolved paths, in site declaration order
///
/// Sites appear in the output in the order their project document declares
/// them, so the map is an ordered vector rather than a sorted tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitePathMap {
    entries: Vec<(String, SitePaths)>,
}

impl SitePathMap {
    pub fn get(&self, site: &str) -> Option<&SitePaths> {
        self.entries
            .iter()
            .find(|(s, _)| s == site)
            .map(|(_, paths)| paths)
    }

    pub fn contains_key(&self, site: &str) -> bool {
        self.get(site).is_some()
    }

    /// Insert, replacing an existing site's paths in place
    pub fn insert(&mut self, site: String, paths: SitePaths) {
        if let Some(entry) = self.entries.iter_mut().find(|(s, _)| *s == site) {
            entry.1 = paths;
        } else {
            self.entries.push((site, paths));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SitePaths)> {
        self.entries.iter().map(|(s, paths)| (s.as_str(), paths))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::ops::Index<&str> for SitePathMap {
    type Output = SitePaths;

    fn index(&self, site: &str) -> &SitePaths {
        self.get(site)
            .unwrap_or_else(|| panic!("no paths for site `{site}`"))
    }
}

impl Serialize for SitePathMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (site, paths) in &self.entries {
            map.serialize_entry(site, paths)?;
        }
        map.end()
    }
}

/// Final resolved configuration unit handed to the provisioning step
#[derive(Debug, Clone, Serialize)]
pub struct Machine {
    /// Network address of the machine
    pub ip: String,
    /// Provisioner overlay settings active for this machine
    pub vconfig: Mapping,
    /// Site key -> resolved paths, across every target project
    pub site_paths: SitePathMap,
    /// Canonical and redirect hostnames, deduplicated first-seen
    pub site_hosts: Vec<String>,
    /// Whether the (last) target project requests subdomain multisite
    pub multisite_subdomains: bool,
    /// Selected by default when an `up` invocation names no machines
    pub vagrant_autostart: bool,
    /// Remaining machine-level overlay fields (`base_project`,
    /// `vagrant_primary`, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Machine {
    /// Build the base machine record from a classified host value
    ///
    /// The record starts with an empty `vconfig`; [`Machine::apply_vconfig`]
    /// installs the overlay once per-project local overrides are known.
    pub fn from_host_value(group: &str, host: &Value) -> Result<Self> {
        let mut ip = String::new();
        let mut extra = BTreeMap::new();

        match HostValue::classify(host).ok_or_else(|| Error::HostValue {
            group: group.to_string(),
        })? {
            HostValue::Literal(address) => ip = address,
            HostValue::List(addresses) => {
                ip = addresses
                    .first()
                    .cloned()
                    .ok_or_else(|| Error::HostValue {
                        group: group.to_string(),
                    })?;
            }
            HostValue::OverlayList(overlays) => {
                let first = overlays.first().ok_or_else(|| Error::HostValue {
                    group: group.to_string(),
                })?;
                for (key, value) in first {
                    let key = key.as_str().ok_or_else(|| Error::HostValue {
                        group: group.to_string(),
                    })?;
                    if key == "ansible_host" {
                        ip = value
                            .as_str()
                            .ok_or_else(|| Error::HostValue {
                                group: group.to_string(),
                            })?
                            .to_string();
                    } else {
                        extra.insert(key.to_string(), value.clone());
                    }
                }
            }
        }

        let host_autostart = extra
            .remove("vagrant_autostart")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        Ok(Self {
            ip,
            vconfig: Mapping::new(),
            site_paths: SitePathMap::default(),
            site_hosts: Vec::new(),
            multisite_subdomains: false,
            vagrant_autostart: host_autostart,
            extra,
        })
    }

    /// Install the provisioner overlay for this machine
    ///
    /// The autostart flag falls back to `vconfig.vagrant_autostart` unless
    /// the host entry already set it to true; a host-level `false` is not
    /// sticky.
    pub fn apply_vconfig(&mut self, vconfig: Mapping) {
        if !self.vagrant_autostart {
            self.vagrant_autostart = vconfig
                .get("vagrant_autostart")
                .and_then(Value::as_bool)
                .unwrap_or(false);
        }
        self.vconfig = vconfig;
    }

    /// The project whose general configs this machine boots from, if set
    pub fn base_project(&self) -> Option<&str> {
        self.extra.get("base_project").and_then(Value::as_str)
    }

    /// Append hostnames, keeping first-seen order and dropping duplicates
    pub fn extend_site_hosts(&mut self, hosts: &[String]) {
        for host in hosts {
            if !self.site_hosts.contains(host) {
                self.site_hosts.push(host.clone());
            }
        }
    }
}

/// Derive a site's resolved paths from its merged variables
pub fn derive_site_paths(site: &str, vars: &Value) -> SitePaths {
    SitePaths {
        local: substitute_site(
            vars.get("local_path").and_then(Value::as_str).unwrap_or(""),
            site,
        ),
        current: vars
            .get("current_path")
            .and_then(Value::as_str)
            .unwrap_or("current")
            .to_string(),
    }
}

/// Derive a site's hostname list from its merged variables
///
/// Each `site_hosts` entry must be a mapping with a `canonical` host;
/// anything else fails the whole resolution, since a broken hostname list
/// corrupts the generated provisioning templates and must not be skipped
/// silently.
pub fn derive_site_hosts(project: &str, site: &str, vars: &Value) -> Result<Vec<String>> {
    let malformed = || Error::SiteHosts {
        project: project.to_string(),
        site: site.to_string(),
    };

    let entries = vars
        .get("site_hosts")
        .and_then(Value::as_sequence)
        .ok_or_else(malformed)?;

    let mut hosts = Vec::new();
    for entry in entries {
        let canonical = entry
            .as_mapping()
            .and_then(|_| entry.get("canonical"))
            .and_then(Value::as_str)
            .ok_or_else(malformed)?;
        hosts.push(substitute_site(canonical, site));

        if let Some(redirects) = entry.get("redirects").and_then(Value::as_sequence) {
            for redirect in redirects.iter().filter_map(Value::as_str) {
                hosts.push(substitute_site(redirect, site));
            }
        }
    }
    Ok(hosts)
}
