//! Handler for `trellis resolve`.

use miette::Result;

use crate::cli::ProjectArgs;
use crate::project::Project;

pub fn exec(args: &ProjectArgs) -> Result<()> {
    let project = Project::load(args)?;
    let resolution = project.resolve()?;

    for (name, version) in resolution.pairs() {
        println!("{name} {version}");
    }
    Ok(())
}
