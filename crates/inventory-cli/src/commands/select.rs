//! `inventory select` - print the machines an invocation would select

use std::path::Path;

use inventory_core::Invocation;

use crate::error::Result;
use crate::loader::load_session;

pub fn run_select(dir: &Path, vconfig: Option<&Path>, tokens: &[String]) -> Result<()> {
    let invocation = Invocation::new(tokens.iter().cloned());
    let session = load_session(dir, vconfig, invocation)?;
    let resolution = session.run()?;

    for name in &resolution.selected {
        println!("{name}");
    }
    Ok(())
}
