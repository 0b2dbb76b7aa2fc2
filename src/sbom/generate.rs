//! SBOM generation

use crate::error::{VsdbgError, VsdbgResult};
use crate::sbom::{SbomArtifact, SbomDocument};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Produces an SBOM for a directory
#[async_trait]
pub trait SbomGenerator: Send + Sync {
    async fn generate(&self, path: &Path) -> VsdbgResult<SbomDocument>;
}

/// Inventories every regular file under a directory with its SHA-256
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectorySbomGenerator;

#[async_trait]
impl SbomGenerator for DirectorySbomGenerator {
    async fn generate(&self, path: &Path) -> VsdbgResult<SbomDocument> {
        let root = path.to_path_buf();
        tokio::task::spawn_blocking(move || inventory(&root))
            .await
            .map_err(|e| VsdbgError::Internal(format!("SBOM task failed: {}", e)))?
    }
}

fn inventory(root: &Path) -> VsdbgResult<SbomDocument> {
    let mut artifacts = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let context = format!("walking {}", root.display());
            VsdbgError::io(context, io::Error::from(e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file = entry.path();
        let (sha256, size) = hash_file(file)
            .map_err(|e| VsdbgError::io(format!("hashing {}", file.display()), e))?;
        let relative = file.strip_prefix(root).unwrap_or(file);
        artifacts.push(SbomArtifact {
            path: relative.to_string_lossy().into_owned(),
            size,
            sha256,
        });
    }

    debug!("SBOM for {}: {} files", root.display(), artifacts.len());
    Ok(SbomDocument {
        root: root.to_path_buf(),
        artifacts,
    })
}

fn hash_file(path: &Path) -> io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let size = io::copy(&mut file, &mut hasher)?;
    Ok((hex::encode(hasher.finalize()), size))
}
