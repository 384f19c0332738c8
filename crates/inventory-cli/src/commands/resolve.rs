//! `inventory resolve` - print the full machine map

use std::path::Path;

use inventory_core::Invocation;

use crate::error::Result;
use crate::loader::load_session;

pub fn run_resolve(dir: &Path, format: &str, vconfig: Option<&Path>) -> Result<()> {
    let session = load_session(dir, vconfig, Invocation::default())?;
    let resolution = session.run()?;

    let output = match format {
        "yaml" => serde_yaml::to_string(&resolution.machines)?,
        _ => serde_json::to_string_pretty(&resolution.machines)?,
    };
    println!("{output}");
    Ok(())
}
