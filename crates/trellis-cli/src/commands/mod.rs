//! Command dispatch and handler modules.

mod resolve;
mod tree;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve { project } => resolve::exec(&project),
        Command::Tree {
            project,
            depth,
            invert,
        } => tree::exec(&project, depth, invert.as_deref()),
    }
}
