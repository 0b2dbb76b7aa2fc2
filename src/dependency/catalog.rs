//! Dependency resolution against a `buildpack.toml` catalog

use crate::dependency::DependencyDescriptor;
use crate::error::{VsdbgError, VsdbgResult};
use crate::retrieval::Platform;
use async_trait::async_trait;
use semver::{Version, VersionReq};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Picks the best matching dependency for an id, version constraint and stack
#[async_trait]
pub trait Resolver: Send + Sync {
    /// An empty `version` means any version.
    async fn resolve(
        &self,
        path: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> VsdbgResult<DependencyDescriptor>;
}

#[derive(Debug, Default, Deserialize)]
struct BuildpackToml {
    #[serde(default)]
    metadata: CatalogMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CatalogMetadata {
    #[serde(default)]
    default_versions: HashMap<String, String>,

    #[serde(default)]
    dependencies: Vec<DependencyDescriptor>,
}

/// Resolves from `[[metadata.dependencies]]` in a buildpack TOML file
///
/// Descriptors tagged with an `os`/`arch` other than the target platform
/// are ignored.
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    platform: Platform,
}

impl CatalogResolver {
    /// Resolve for the platform this process runs on
    pub fn new() -> Self {
        Self::for_platform(Platform::host())
    }

    pub fn for_platform(platform: Platform) -> Self {
        Self { platform }
    }
}

impl Default for CatalogResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Resolver for CatalogResolver {
    async fn resolve(
        &self,
        path: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> VsdbgResult<DependencyDescriptor> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| VsdbgError::io(format!("reading {}", path.display()), e))?;
        let catalog: BuildpackToml = toml::from_str(&content)?;
        select(catalog.metadata, id, version, stack, &self.platform)
    }
}

fn select(
    catalog: CatalogMetadata,
    id: &str,
    version: &str,
    stack: &str,
    platform: &Platform,
) -> VsdbgResult<DependencyDescriptor> {
    let constraint = match version {
        "" | "default" => catalog
            .default_versions
            .get(id)
            .cloned()
            .unwrap_or_else(|| "*".to_string()),
        other => other.to_string(),
    };
    let req = VersionReq::parse(&constraint).map_err(|e| VsdbgError::VersionConstraint {
        constraint: constraint.clone(),
        source: e,
    })?;

    let mut supported = Vec::new();
    let mut best: Option<(Version, DependencyDescriptor)> = None;

    for dependency in catalog.dependencies {
        if dependency.id != id
            || !dependency.supports_stack(stack)
            || !platform.accepts(dependency.os.as_deref(), dependency.arch.as_deref())
        {
            continue;
        }
        let parsed = match Version::parse(&dependency.version) {
            Ok(v) => v,
            Err(e) => {
                warn!("Skipping {} {}: {}", dependency.id, dependency.version, e);
                continue;
            }
        };
        supported.push(parsed.clone());

        if !req.matches(&parsed) {
            continue;
        }
        if best.as_ref().map_or(true, |(current, _)| parsed > *current) {
            best = Some((parsed, dependency));
        }
    }

    match best {
        Some((version, dependency)) => {
            debug!("Resolved {} {} for stack {}", id, version, stack);
            Ok(dependency)
        }
        None => {
            supported.sort();
            supported.dedup();
            Err(VsdbgError::Resolution {
                id: id.to_string(),
                constraint,
                stack: stack.to_string(),
                supported: supported
                    .iter()
                    .map(Version::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        }
    }
}
