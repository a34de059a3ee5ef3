// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the run, selfcheck, and init subcommands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cricheck")]
#[command(about = "Conformance checks for container-runtime image services")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress per-scenario progress output
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the conformance suite against an engine socket
    Run {
        /// Engine socket path (overrides the configuration file)
        #[arg(long)]
        socket: Option<String>,

        /// Explicit configuration file instead of discovery
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the suite against the built-in in-memory backend
    Selfcheck,

    /// Initialize a cricheck.yml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}
