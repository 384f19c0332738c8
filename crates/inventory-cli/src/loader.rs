//! Loads the provisioning tree's YAML documents into a resolution session
//!
//! File layout mirrors the provisioning repository:
//!
//! ```text
//! <root>/hosts/hosts.yml                        inventory document
//! <root>/group_vars/all/site_vars_default.yml   defaults layer
//! <root>/group_vars/all/site_vars.yml           globals layer
//! <root>/group_vars/all/main.yml                project_path template
//! <root>/<project_path>/vars/all/site_vars.yml  per-project layers
//! <root>/<project_path>/vagrant.local.yml       per-project overlay
//! ```
//!
//! The inventory document and `main.yml` are required; variable layers that
//! are missing on disk are empty layers, and projects without a site-vars
//! file are skipped here (resolution fails later only if a machine actually
//! targets them).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use inventory_core::{
    Contribution, Inventory, Invocation, ResolutionSession, SiteVarsDoc, VariableLayers,
    substitute_project,
};

use crate::error::{CliError, Result};

const HOSTS_FILE: &str = "hosts/hosts.yml";
const SITE_VARS_DEFAULT_FILE: &str = "group_vars/all/site_vars_default.yml";
const SITE_VARS_GLOBAL_FILE: &str = "group_vars/all/site_vars.yml";
const MAIN_VARS_FILE: &str = "group_vars/all/main.yml";
const PROJECT_SITE_VARS_FILE: &str = "vars/all/site_vars.yml";
const PROJECT_LOCAL_VCONFIG_FILE: &str = "vagrant.local.yml";

/// Build a resolution session from the files under `root`
pub fn load_session(
    root: &Path,
    vconfig_file: Option<&Path>,
    invocation: Invocation,
) -> Result<ResolutionSession> {
    let inventory = Inventory::from_value(&read_yaml(&root.join(HOSTS_FILE))?)?;

    let site_vars_default = read_layer(&root.join(SITE_VARS_DEFAULT_FILE), "site_vars_default")?;
    let site_vars_global = read_layer(&root.join(SITE_VARS_GLOBAL_FILE), "site_vars_global")?;

    let main_vars = read_yaml(&root.join(MAIN_VARS_FILE))?;
    let project_path_template = main_vars
        .get("project_path")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CliError::user(format!("{MAIN_VARS_FILE} must define a `project_path` template"))
        })?
        .to_string();

    let mut project_vars = HashMap::new();
    let mut local_vconfigs = HashMap::new();
    for (project, _) in inventory.projects_with_dev() {
        let project_dir = root.join(substitute_project(&project_path_template, project));

        let site_vars_path = project_dir.join(PROJECT_SITE_VARS_FILE);
        if site_vars_path.is_file() {
            let doc = SiteVarsDoc::from_value(project, &read_yaml(&site_vars_path)?)?;
            project_vars.insert(project.to_string(), doc);
        } else {
            tracing::debug!(project, ?site_vars_path, "no site vars file - skipping");
        }

        let local_path = project_dir.join(PROJECT_LOCAL_VCONFIG_FILE);
        if local_path.is_file() {
            local_vconfigs.insert(project.to_string(), read_mapping(&local_path)?);
        }
    }

    let vconfig = match vconfig_file {
        Some(path) => read_mapping(path)?,
        None => Mapping::new(),
    };

    let layers = VariableLayers {
        site_vars_default,
        site_vars_global,
        project_vars,
    };
    Ok(ResolutionSession::new(inventory, layers, vconfig, invocation)
        .with_local_vconfigs(local_vconfigs))
}

/// Read a contributions layer stored under `key` in an optional file
fn read_layer(path: &Path, key: &str) -> Result<Vec<Contribution>> {
    if !path.is_file() {
        tracing::debug!(?path, "no variable layer file - empty layer");
        return Ok(Vec::new());
    }
    let doc = read_yaml(path)?;
    let layer = doc.get(key).cloned().unwrap_or(Value::Null);
    Ok(Contribution::layer_from_value(&layer)?)
}

fn read_mapping(path: &Path) -> Result<Mapping> {
    match read_yaml(path)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(CliError::user(format!(
            "{} must be a YAML mapping",
            path.display()
        ))),
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: PathBuf::from(path),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| CliError::Parse {
        path: PathBuf::from(path),
        source,
    })
}
