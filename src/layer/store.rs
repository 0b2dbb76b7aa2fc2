//! Durable layer storage
//!
//! A layer named `<name>` lives at `<layers>/<name>/` and is described by
//! `<layers>/<name>.toml`:
//!
//! ```toml
//! [types]
//! build = false
//! launch = true
//! cache = false
//!
//! [metadata]
//! dependency-checksum = "sha256:..."
//! ```
//!
//! Environment contributions are one file per variable and operation
//! (`<layer>/env/PATH.append`), SBOM documents sit next to the layer TOML.

use crate::error::{VsdbgError, VsdbgResult};
use crate::sbom::{FormattedSbom, SbomFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Metadata key holding the checksum of the installed dependency
pub const DEPENDENCY_CHECKSUM_KEY: &str = "dependency-checksum";

/// Environment modifications keyed by `<VAR>.<op>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment(BTreeMap<String, String>);

impl Environment {
    /// Append `value` to `name`, joined by `delim`
    pub fn append(&mut self, name: &str, value: impl Into<String>, delim: &str) {
        self.0.insert(format!("{}.append", name), value.into());
        self.0.insert(format!("{}.delim", name), delim.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// A named layer directory and everything recorded about it
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub name: String,
    pub path: PathBuf,

    pub build: bool,
    pub launch: bool,
    pub cache: bool,

    pub metadata: toml::Table,

    /// Applied to both the build and launch environment
    pub shared_env: Environment,
    pub build_env: Environment,
    pub launch_env: Environment,

    pub sbom: Vec<FormattedSbom>,
}

impl Layer {
    /// Checksum of the dependency the layer was built from
    pub fn dependency_checksum(&self) -> Option<&str> {
        self.metadata
            .get(DEPENDENCY_CHECKSUM_KEY)
            .and_then(|v| v.as_str())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerTypes {
    #[serde(default)]
    build: bool,
    #[serde(default)]
    launch: bool,
    #[serde(default)]
    cache: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerFile {
    #[serde(default)]
    types: LayerTypes,
    #[serde(default)]
    metadata: toml::Table,
}

/// Reads and writes layers below one layers directory
#[derive(Debug, Clone)]
pub struct LayerStore {
    path: PathBuf,
}

impl LayerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn layer_toml(&self, name: &str) -> PathBuf {
        self.path.join(format!("{}.toml", name))
    }

    fn sbom_path(&self, name: &str, format: SbomFormat) -> PathBuf {
        self.path.join(format!("{}.sbom.{}", name, format.extension()))
    }

    /// Load a layer and the metadata of its previous build.
    ///
    /// A layer that was never written comes back empty.
    pub async fn get(&self, name: &str) -> VsdbgResult<Layer> {
        let toml_path = self.layer_toml(name);
        let file = match tokio::fs::read_to_string(&toml_path).await {
            Ok(content) => {
                toml::from_str::<LayerFile>(&content).map_err(|e| VsdbgError::ConfigInvalid {
                    path: toml_path.clone(),
                    reason: e.to_string(),
                })?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => LayerFile::default(),
            Err(e) => {
                return Err(VsdbgError::io(
                    format!("reading layer metadata {}", toml_path.display()),
                    e,
                ))
            }
        };

        Ok(Layer {
            name: name.to_string(),
            path: self.path.join(name),
            build: file.types.build,
            launch: file.types.launch,
            cache: file.types.cache,
            metadata: file.metadata,
            ..Layer::default()
        })
    }

    /// Discard a layer's contents and metadata, leaving an empty directory
    pub async fn reset(&self, layer: &mut Layer) -> VsdbgResult<()> {
        debug!("Resetting layer {}", layer.path.display());

        match tokio::fs::remove_dir_all(&layer.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(VsdbgError::io(
                    format!("removing layer {}", layer.path.display()),
                    e,
                ))
            }
        }

        remove_if_present(&self.layer_toml(&layer.name)).await?;
        for format in SbomFormat::all() {
            remove_if_present(&self.sbom_path(&layer.name, *format)).await?;
        }

        tokio::fs::create_dir_all(&layer.path)
            .await
            .map_err(|e| VsdbgError::io(format!("creating layer {}", layer.path.display()), e))?;

        layer.build = false;
        layer.launch = false;
        layer.cache = false;
        layer.metadata.clear();
        layer.shared_env.clear();
        layer.build_env.clear();
        layer.launch_env.clear();
        layer.sbom.clear();
        Ok(())
    }

    /// Persist a layer's types, metadata, environment and SBOM documents
    pub async fn write(&self, layer: &Layer) -> VsdbgResult<()> {
        tokio::fs::create_dir_all(&layer.path)
            .await
            .map_err(|e| VsdbgError::io(format!("creating layer {}", layer.path.display()), e))?;

        let file = LayerFile {
            types: LayerTypes {
                build: layer.build,
                launch: layer.launch,
                cache: layer.cache,
            },
            metadata: layer.metadata.clone(),
        };
        let toml_path = self.layer_toml(&layer.name);
        tokio::fs::write(&toml_path, toml::to_string_pretty(&file)?)
            .await
            .map_err(|e| VsdbgError::io(format!("writing {}", toml_path.display()), e))?;

        write_env(&layer.path.join("env"), &layer.shared_env).await?;
        write_env(&layer.path.join("env.build"), &layer.build_env).await?;
        write_env(&layer.path.join("env.launch"), &layer.launch_env).await?;

        for sbom in &layer.sbom {
            let sbom_path = self.sbom_path(&layer.name, sbom.format);
            tokio::fs::write(&sbom_path, &sbom.content)
                .await
                .map_err(|e| VsdbgError::io(format!("writing {}", sbom_path.display()), e))?;
        }

        debug!("Wrote layer {}", layer.name);
        Ok(())
    }
}

async fn write_env(dir: &Path, env: &Environment) -> VsdbgResult<()> {
    if env.is_empty() {
        return Ok(());
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| VsdbgError::io(format!("creating {}", dir.display()), e))?;
    for (key, value) in env.iter() {
        let path = dir.join(key);
        tokio::fs::write(&path, value)
            .await
            .map_err(|e| VsdbgError::io(format!("writing {}", path.display()), e))?;
    }
    Ok(())
}

async fn remove_if_present(path: &Path) -> VsdbgResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(VsdbgError::io(format!("removing {}", path.display()), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn environment_append() {
        let mut env = Environment::default();
        env.append("PATH", "/layers/vsdbg", ":");
        assert_eq!(env.get("PATH.append"), Some("/layers/vsdbg"));
        assert_eq!(env.get("PATH.delim"), Some(":"));

        env.append("DOTNET_ROOT", "/layers/dotnet", ":");
        assert_eq!(env.iter().count(), 4);
    }

    #[tokio::test]
    async fn get_missing_layer_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = LayerStore::new(dir.path());

        let layer = store.get("vsdbg").await.unwrap();
        assert_eq!(layer.name, "vsdbg");
        assert_eq!(layer.path, dir.path().join("vsdbg"));
        assert!(layer.metadata.is_empty());
        assert!(!layer.build && !layer.launch && !layer.cache);
    }

    #[tokio::test]
    async fn write_then_get() {
        let dir = TempDir::new().unwrap();
        let store = LayerStore::new(dir.path());

        let mut layer = store.get("vsdbg").await.unwrap();
        layer.launch = true;
        layer
            .metadata
            .insert(DEPENDENCY_CHECKSUM_KEY.into(), "sha256:abc".into());
        layer.shared_env.append("PATH", layer.path.display().to_string(), ":");
        layer.launch_env.append("VSDBG_LOG", "1", ",");
        layer.sbom.push(FormattedSbom {
            format: SbomFormat::Syft,
            content: b"{}".to_vec(),
        });
        store.write(&layer).await.unwrap();

        let read = store.get("vsdbg").await.unwrap();
        assert!(read.launch);
        assert!(!read.build);
        assert_eq!(read.dependency_checksum(), Some("sha256:abc"));

        let env_dir = dir.path().join("vsdbg").join("env");
        assert_eq!(
            std::fs::read_to_string(env_dir.join("PATH.append")).unwrap(),
            dir.path().join("vsdbg").display().to_string()
        );
        assert_eq!(std::fs::read_to_string(env_dir.join("PATH.delim")).unwrap(), ":");
        assert!(dir.path().join("vsdbg").join("env.launch").join("VSDBG_LOG.append").exists());
        assert!(!dir.path().join("vsdbg").join("env.build").exists());
        assert!(dir.path().join("vsdbg.sbom.syft.json").exists());
    }

    #[tokio::test]
    async fn reset_clears_contents_and_metadata() {
        let dir = TempDir::new().unwrap();
        let store = LayerStore::new(dir.path());

        let mut layer = store.get("vsdbg").await.unwrap();
        layer.cache = true;
        layer
            .metadata
            .insert(DEPENDENCY_CHECKSUM_KEY.into(), "sha256:abc".into());
        layer.sbom.push(FormattedSbom {
            format: SbomFormat::CycloneDx,
            content: b"{}".to_vec(),
        });
        store.write(&layer).await.unwrap();
        std::fs::write(layer.path.join("stale"), "x").unwrap();
        assert!(dir.path().join("vsdbg.sbom.cdx.json").exists());

        store.reset(&mut layer).await.unwrap();

        assert!(layer.path.is_dir());
        assert!(!layer.path.join("stale").exists());
        assert!(!dir.path().join("vsdbg.toml").exists());
        assert!(!dir.path().join("vsdbg.sbom.cdx.json").exists());
        assert!(layer.sbom.is_empty());
        assert!(layer.metadata.is_empty());
        assert!(!layer.cache);
        assert_eq!(store.get("vsdbg").await.unwrap().dependency_checksum(), None);
    }

    #[tokio::test]
    async fn get_rejects_invalid_toml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("vsdbg.toml"), "[types\n").unwrap();

        let err = LayerStore::new(dir.path()).get("vsdbg").await.unwrap_err();
        assert!(matches!(err, VsdbgError::ConfigInvalid { .. }));
    }
}
