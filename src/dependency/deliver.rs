//! Dependency delivery
//!
//! Streams the archive once: bytes are hashed as they are unpacked and the
//! digest is compared against the descriptor when the stream ends.

use crate::dependency::DependencyDescriptor;
use crate::error::{VsdbgError, VsdbgResult};
use crate::retrieval::{http_get, HashingReader};
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

const DEPENDENCY_MAPPING_TYPE: &str = "dependency-mapping";

/// Fetches a dependency, verifies it and unpacks it into a directory
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(
        &self,
        dependency: &DependencyDescriptor,
        cnb_path: &Path,
        destination: &Path,
        platform_path: &Path,
    ) -> VsdbgResult<()>;
}

/// Delivers tar.gz archives from HTTP(S) or the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveDelivery;

#[async_trait]
impl Delivery for ArchiveDelivery {
    async fn deliver(
        &self,
        dependency: &DependencyDescriptor,
        cnb_path: &Path,
        destination: &Path,
        platform_path: &Path,
    ) -> VsdbgResult<()> {
        let dependency = dependency.clone();
        let cnb_path = cnb_path.to_path_buf();
        let destination = destination.to_path_buf();
        let platform_path = platform_path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            deliver_blocking(&dependency, &cnb_path, &destination, &platform_path)
        })
        .await
        .map_err(|e| VsdbgError::Internal(format!("delivery task failed: {}", e)))?
    }
}

fn deliver_blocking(
    dependency: &DependencyDescriptor,
    cnb_path: &Path,
    destination: &Path,
    platform_path: &Path,
) -> VsdbgResult<()> {
    let (algorithm, expected) = dependency.checksum_parts();
    if algorithm != "sha256" {
        return Err(VsdbgError::delivery(
            &dependency.uri,
            format!("unsupported checksum algorithm '{}'", algorithm),
        ));
    }

    let uri = match mapped_uri(platform_path, expected)? {
        Some(mapped) => {
            info!("Dependency {} mapped to {}", dependency.uri, mapped);
            mapped
        }
        None => dependency.uri.clone(),
    };

    let source = open(&uri, cnb_path)?;
    let mut reader = HashingReader::new(source);

    fs::create_dir_all(destination)
        .map_err(|e| VsdbgError::io(format!("creating {}", destination.display()), e))?;

    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(reader));
    let unpacked = unpack(&mut archive, destination, dependency.strip_components);
    reader = archive.into_inner().into_inner();
    unpacked.map_err(|e| VsdbgError::delivery(&uri, e.to_string()))?;

    io::copy(&mut reader, &mut io::sink()).map_err(|e| VsdbgError::delivery(&uri, e.to_string()))?;
    let (actual, size) = reader.finish();

    if actual != expected {
        return Err(VsdbgError::delivery(
            &uri,
            format!("checksum mismatch: expected sha256:{} but got sha256:{}", expected, actual),
        ));
    }

    debug!("Delivered {} ({} bytes) into {}", uri, size, destination.display());
    Ok(())
}

/// Open a dependency URI as a byte stream.
///
/// Relative filesystem paths are resolved against the buildpack root.
fn open(uri: &str, cnb_path: &Path) -> VsdbgResult<Box<dyn Read + Send>> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return Ok(Box::new(http_get(uri)?));
    }

    let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
    let path = if path.is_relative() {
        cnb_path.join(path)
    } else {
        path.to_path_buf()
    };

    let file = File::open(&path).map_err(|e| VsdbgError::delivery(uri, e.to_string()))?;
    Ok(Box::new(file))
}

/// Look up a platform dependency-mapping binding for a SHA-256 digest.
///
/// Bindings live at `<platform>/bindings/<name>/` with a `type` file; a
/// mapping binding holds one file per digest whose content is the URI.
fn mapped_uri(platform_path: &Path, digest: &str) -> VsdbgResult<Option<String>> {
    let bindings = platform_path.join("bindings");
    let entries = match fs::read_dir(&bindings) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(VsdbgError::io(
                format!("reading bindings in {}", bindings.display()),
                e,
            ))
        }
    };

    for entry in entries.flatten() {
        let binding = entry.path();
        let kind = match fs::read_to_string(binding.join("type")) {
            Ok(kind) => kind,
            Err(_) => continue,
        };
        if kind.trim() != DEPENDENCY_MAPPING_TYPE {
            continue;
        }
        match fs::read_to_string(binding.join(digest)) {
            Ok(uri) => return Ok(Some(uri.trim().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(VsdbgError::io(
                    format!("reading binding {}", binding.display()),
                    e,
                ))
            }
        }
    }
    Ok(None)
}

/// Unpack every entry below `destination`, dropping the first `strip`
/// path components. Entries whose path climbs out with `..` are skipped.
///
/// Nothing is ever written through a symlink: an entry whose path crosses
/// an existing symlink is rejected, as are symlinks that are absolute or
/// climb above the archive root, and hard links.
fn unpack<R: Read>(archive: &mut tar::Archive<R>, destination: &Path, strip: usize) -> io::Result<()> {
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        let relative: PathBuf = path
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .skip(strip)
            .collect();
        if relative.as_os_str().is_empty() {
            continue;
        }
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            warn!("Skipping archive entry outside destination: {}", path.display());
            continue;
        }

        let kind = entry.header().entry_type();
        if kind.is_hard_link() {
            return Err(unsafe_entry(format!(
                "hard link {} is not supported",
                path.display()
            )));
        }
        if kind.is_symlink() {
            let link = entry
                .link_name()?
                .ok_or_else(|| unsafe_entry(format!("symlink {} has no target", path.display())))?
                .into_owned();
            if !link_stays_inside(&relative, &link) {
                return Err(unsafe_entry(format!(
                    "symlink {} -> {} leaves the destination",
                    path.display(),
                    link.display()
                )));
            }
        }

        reject_symlinked_path(destination, &relative)?;

        let target = destination.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&target)?;
    }
    Ok(())
}

fn unsafe_entry(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Whether a symlink at `entry` (relative to the root) pointing at `link`
/// resolves below the root.
///
/// `..` is only allowed as a leading run, and never deeper than the link's
/// own directory; a `..` after a name could cancel a symlinked name.
fn link_stays_inside(entry: &Path, link: &Path) -> bool {
    let mut depth = entry.components().count().saturating_sub(1);
    let mut descended = false;
    for component in link.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(_) => descended = true,
            Component::ParentDir if !descended && depth > 0 => depth -= 1,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Fail if any existing component of `relative` under `destination` is a
/// symlink.
fn reject_symlinked_path(destination: &Path, relative: &Path) -> io::Result<()> {
    let mut current = destination.to_path_buf();
    for component in relative.components() {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                return Err(unsafe_entry(format!(
                    "archive entry {} passes through symlink {}",
                    relative.display(),
                    current.display()
                )))
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
