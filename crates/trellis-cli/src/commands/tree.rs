//! Handler for `trellis tree`.

use miette::Result;
use trellis_resolver::graph::{DependencyGraph, ResolvedNode};
use trellis_util::errors::TrellisError;

use crate::cli::ProjectArgs;
use crate::project::Project;

pub fn exec(args: &ProjectArgs, depth: Option<usize>, invert: Option<&str>) -> Result<()> {
    let project = Project::load(args)?;
    let resolution = project.resolve()?;

    let root = ResolvedNode::new(
        project.manifest.package.name.clone(),
        project.manifest.package.version.clone(),
    );
    let graph = DependencyGraph::from_resolution(root, &project.constraints, &resolution);

    let output = match invert {
        Some(name) => {
            let inverted = graph.print_inverted_tree(name);
            if inverted.is_empty() {
                return Err(TrellisError::Generic {
                    message: format!("package `{name}` is not in the dependency graph"),
                }
                .into());
            }
            inverted
        }
        None => graph.print_tree(depth),
    };
    print!("{output}");
    Ok(())
}
