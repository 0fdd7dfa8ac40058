//! CLI argument definitions for Trellis.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "trellis",
    version,
    about = "Resolve package dependencies against a local registry",
    long_about = "Trellis reads the top-level requirements in Trellis.toml and picks one \
                  version of every package they reach, preferring the latest version that \
                  agrees with every requirement seen so far."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Where the inputs of a resolution come from.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Path to the manifest (defaults to ./Trellis.toml)
    #[arg(long)]
    pub manifest: Option<PathBuf>,
    /// Registry directory (overrides the configured one)
    #[arg(long)]
    pub registry: Option<PathBuf>,
    /// Resolution policy: constraint-aware, latest-only
    #[arg(long)]
    pub policy: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve dependencies and print the chosen versions
    Resolve {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Display the resolved dependency tree
    Tree {
        #[command(flatten)]
        project: ProjectArgs,
        /// Max display depth
        #[arg(long)]
        depth: Option<usize>,
        /// Show what depends on the given package
        #[arg(short, long)]
        invert: Option<String>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
