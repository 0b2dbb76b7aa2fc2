//! Streaming artifact verification
//!
//! The artifact body is read exactly once. Every byte passes through a
//! SHA-256 hasher; when license scanning is on, the same stream is also
//! decoded as gzip+tar on the way through.

use crate::error::{VsdbgError, VsdbgResult};
use crate::retrieval::{http, license};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::io::{self, Read};
use tracing::debug;

/// Upper bound on how much of a single license file is read
const MAX_LICENSE_BYTES: u64 = 1024 * 1024;

/// Whether the verifier also scans the archive for bundled licenses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseMode {
    /// Hash only; descriptors carry no licenses
    #[default]
    Disabled,
    /// Hash and extract license identifiers from the tar.gz
    Scan,
}

/// Result of verifying one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// Lowercase hex SHA-256 of the full body
    pub checksum: String,

    /// Bytes read from the body
    pub size: u64,

    /// Sorted SPDX identifiers found in the archive
    pub licenses: Vec<String>,
}

/// Reader adapter that hashes everything read through it
pub(crate) struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
    size: u64,
    failed: bool,
}

impl<R: Read> HashingReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            size: 0,
            failed: false,
        }
    }

    pub(crate) fn finish(self) -> (String, u64) {
        (hex::encode(self.hasher.finalize()), self.size)
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(n) => {
                self.hasher.update(&buf[..n]);
                self.size += n as u64;
                Ok(n)
            }
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }
}

/// Downloads artifacts and computes their checksums
#[derive(Debug, Clone, Copy, Default)]
pub struct Verifier {
    license_mode: LicenseMode,
}

impl Verifier {
    pub fn new(license_mode: LicenseMode) -> Self {
        Self { license_mode }
    }

    /// Fetch `url` and verify its body.
    pub fn verify(&self, url: &str) -> VsdbgResult<Verified> {
        let body = http::get(url)?;
        let verified = self.verify_reader(body, url)?;
        debug!(
            "Verified {} ({} bytes, sha256:{})",
            url, verified.size, verified.checksum
        );
        Ok(verified)
    }

    /// Verify an already-open body; `url` is only used in errors.
    pub fn verify_reader<R: Read>(&self, body: R, url: &str) -> VsdbgResult<Verified> {
        let mut reader = HashingReader::new(body);

        let licenses = match self.license_mode {
            LicenseMode::Disabled => Vec::new(),
            LicenseMode::Scan => {
                let (licenses, rest) = scan_archive(reader, url)?;
                reader = rest;
                licenses
            }
        };

        // Drain whatever the archive reader left behind so the digest
        // always covers the whole body.
        io::copy(&mut reader, &mut io::sink()).map_err(|e| VsdbgError::Checksum {
            url: url.to_string(),
            source: e,
        })?;

        let (checksum, size) = reader.finish();
        Ok(Verified {
            checksum,
            size,
            licenses,
        })
    }
}

fn scan_archive<R: Read>(
    reader: HashingReader<R>,
    url: &str,
) -> VsdbgResult<(Vec<String>, HashingReader<R>)> {
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(reader));
    let mut found = BTreeSet::new();

    let result = collect_licenses(&mut archive, &mut found);
    let reader = archive.into_inner().into_inner();

    if let Err(e) = result {
        if reader.failed {
            return Err(VsdbgError::Checksum {
                url: url.to_string(),
                source: e,
            });
        }
        return Err(VsdbgError::UnsupportedArchive {
            url: url.to_string(),
            reason: e.to_string(),
        });
    }

    Ok((found.into_iter().collect(), reader))
}

fn collect_licenses<R: Read>(
    archive: &mut tar::Archive<R>,
    found: &mut BTreeSet<String>,
) -> io::Result<()> {
    for entry in archive.entries()? {
        let entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.into_owned();
        if !license::is_license_file(&path) {
            continue;
        }

        let mut text = String::new();
        entry.take(MAX_LICENSE_BYTES).read_to_string(&mut text)?;
        let ids = license::identify(&text);
        debug!("License file {} matched {:?}", path.display(), ids);
        found.extend(ids.into_iter().map(str::to_string));
    }
    Ok(())
}
