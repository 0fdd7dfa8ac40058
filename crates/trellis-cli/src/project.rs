//! Loading the inputs of a resolution and running it.

use std::path::PathBuf;

use indicatif::ProgressBar;
use miette::Result;
use trellis_core::config::{GlobalConfig, ResolvePolicy};
use trellis_core::manifest::Manifest;
use trellis_core::MANIFEST_FILE;
use trellis_resolver::registry::{RegistryContainer, RegistryError, RegistryProvider};
use trellis_resolver::requirement::parse_requirement;
use trellis_resolver::{
    PackageContainerConstraint, Resolution, ResolveError, Resolver, ResolverDelegate,
    ResolverOptions,
};
use trellis_util::errors::TrellisError;
use trellis_util::progress;

use crate::cli::ProjectArgs;

/// A manifest with its requirements parsed, plus where to resolve them.
pub struct Project {
    pub manifest: Manifest,
    pub constraints: Vec<PackageContainerConstraint<String>>,
    pub registry: PathBuf,
    pub policy: ResolvePolicy,
}

impl Project {
    /// Read the manifest and global config, with command-line flags taking precedence.
    pub fn load(args: &ProjectArgs) -> Result<Self> {
        let manifest_path = match &args.manifest {
            Some(path) => path.clone(),
            None => std::env::current_dir()
                .map_err(TrellisError::Io)?
                .join(MANIFEST_FILE),
        };
        if !manifest_path.is_file() {
            return Err(TrellisError::Manifest {
                message: format!("Could not find {MANIFEST_FILE} at {}", manifest_path.display()),
            }
            .into());
        }
        let manifest = Manifest::from_path(&manifest_path)?;
        let config = GlobalConfig::load()?;

        let policy = match args.policy.as_deref() {
            Some(name) => ResolvePolicy::from_name(name).ok_or_else(|| TrellisError::Config {
                message: format!(
                    "unknown resolve policy `{name}` (expected constraint-aware or latest-only)"
                ),
            })?,
            None => config.resolve.policy,
        };
        let registry = args
            .registry
            .clone()
            .unwrap_or_else(|| config.registry_path());

        let mut constraints = Vec::with_capacity(manifest.dependencies.len());
        for (name, requirement) in &manifest.dependencies {
            let set = parse_requirement(requirement).map_err(|e| TrellisError::Manifest {
                message: format!("invalid requirement for `{name}`: {e}"),
            })?;
            constraints.push(PackageContainerConstraint::new(name.clone(), set));
        }

        tracing::debug!(
            "Loaded {} with {} requirements (registry {}, {policy})",
            manifest_path.display(),
            constraints.len(),
            registry.display()
        );
        Ok(Self {
            manifest,
            constraints,
            registry,
            policy,
        })
    }

    /// Resolve the manifest's requirements against the registry.
    pub fn resolve(&self) -> Result<Resolution<RegistryContainer>> {
        if !self.registry.is_dir() {
            return Err(TrellisError::Registry {
                message: format!("registry directory {} does not exist", self.registry.display()),
            }
            .into());
        }

        if self.constraints.is_empty() {
            progress::status_warn(
                "Warning",
                &format!("no dependencies declared in {MANIFEST_FILE}"),
            );
        }

        let pb = progress::spinner("Resolving dependencies...");
        let delegate = StatusDelegate { pb: pb.clone() };
        let resolver = Resolver::new(
            self.constraints.iter().cloned(),
            RegistryProvider::new(&self.registry),
            delegate,
        )
        .with_options(ResolverOptions {
            policy: self.policy,
        });
        let result = resolver.resolve_packages();
        pb.finish_and_clear();

        let resolution = result.map_err(into_trellis_error)?;
        progress::status_info(
            "Resolved",
            &format!(
                "{} packages ({} fetched)",
                resolution.len(),
                resolution.fetched
            ),
        );
        Ok(resolution)
    }
}

/// Prints a status line for every package loaded from the registry.
struct StatusDelegate {
    pb: ProgressBar,
}

impl ResolverDelegate<String> for StatusDelegate {
    fn added(&self, identifier: &String) {
        self.pb
            .suspend(|| progress::status("Fetching", identifier));
    }
}

fn into_trellis_error(err: ResolveError<RegistryError>) -> TrellisError {
    match err {
        ResolveError::Provider(e) => TrellisError::Registry {
            message: e.to_string(),
        },
        unsatisfiable @ ResolveError::Unsatisfiable { .. } => TrellisError::Resolution {
            message: unsatisfiable.to_string(),
        },
    }
}
