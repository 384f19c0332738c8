//! Development inventory CLI
//!
//! The command-line interface for resolving per-machine configuration from
//! the provisioning tree's inventory and variable files.

mod cli;
mod commands;
mod error;
mod loader;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Resolve {
            dir,
            format,
            vconfig,
        } => commands::run_resolve(&dir, &format, vconfig.as_deref()),
        Commands::Select {
            dir,
            vconfig,
            tokens,
        } => commands::run_select(&dir, vconfig.as_deref(), &tokens),
    }
}
