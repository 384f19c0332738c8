//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Development inventory resolver - resolve per-machine configuration
#[derive(Parser, Debug)]
#[command(name = "inventory")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Resolve the full machine map and print it
    ///
    /// Reads hosts/hosts.yml, the group_vars variable layers, and each
    /// project's vars/all/site_vars.yml under the given root.
    Resolve {
        /// Root of the provisioning tree (contains hosts/, group_vars/)
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Output format
        #[arg(long, default_value = "json", value_parser = ["json", "yaml"])]
        format: String,

        /// Provisioner overlay file (YAML mapping)
        #[arg(long)]
        vconfig: Option<PathBuf>,
    },

    /// Print the machines a provisioning invocation would select
    ///
    /// Examples:
    ///   inventory select -- up
    ///   inventory select -- up web /^api/
    ///   inventory select -- reload --provision db
    Select {
        /// Root of the provisioning tree (contains hosts/, group_vars/)
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Provisioner overlay file (YAML mapping)
        #[arg(long)]
        vconfig: Option<PathBuf>,

        /// Invocation tokens: the provisioning command and its arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },
}
