//! SBOM interchange formats

use crate::error::{VsdbgError, VsdbgResult};
use crate::sbom::SbomDocument;
use chrono::Utc;
use serde_json::{json, Value};

const TOOL_NAME: &str = env!("CARGO_PKG_NAME");
const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Supported SBOM output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SbomFormat {
    CycloneDx,
    Spdx,
    Syft,
}

impl SbomFormat {
    pub fn all() -> &'static [SbomFormat] {
        &[Self::CycloneDx, Self::Spdx, Self::Syft]
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::CycloneDx => "application/vnd.cyclonedx+json",
            Self::Spdx => "application/spdx+json",
            Self::Syft => "application/vnd.syft+json",
        }
    }

    /// File extension used when the document is written next to a layer
    pub fn extension(&self) -> &'static str {
        match self {
            Self::CycloneDx => "cdx.json",
            Self::Spdx => "spdx.json",
            Self::Syft => "syft.json",
        }
    }

    /// Parse a media type or short name
    pub fn parse(name: &str) -> VsdbgResult<Self> {
        match name {
            "application/vnd.cyclonedx+json" | "cyclonedx" => Ok(Self::CycloneDx),
            "application/spdx+json" | "spdx" => Ok(Self::Spdx),
            "application/vnd.syft+json" | "syft" => Ok(Self::Syft),
            other => Err(VsdbgError::UnsupportedSbomFormat(other.to_string())),
        }
    }
}

/// An SBOM rendered in one format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedSbom {
    pub format: SbomFormat,
    pub content: Vec<u8>,
}

impl SbomDocument {
    /// Render the document in every named format.
    ///
    /// All names are validated before anything is rendered, so an
    /// unsupported name yields no output at all.
    pub fn in_formats(&self, names: &[String]) -> VsdbgResult<Vec<FormattedSbom>> {
        let formats = names
            .iter()
            .map(|n| SbomFormat::parse(n))
            .collect::<VsdbgResult<Vec<_>>>()?;

        formats
            .into_iter()
            .map(|format| -> VsdbgResult<FormattedSbom> {
                let value = match format {
                    SbomFormat::CycloneDx => self.cyclonedx(),
                    SbomFormat::Spdx => self.spdx(),
                    SbomFormat::Syft => self.syft(),
                };
                Ok(FormattedSbom {
                    format,
                    content: serde_json::to_vec_pretty(&value)?,
                })
            })
            .collect()
    }

    fn root_name(&self) -> String {
        self.root.display().to_string()
    }

    fn cyclonedx(&self) -> Value {
        let components: Vec<Value> = self
            .artifacts
            .iter()
            .map(|a| {
                json!({
                    "type": "file",
                    "name": a.path,
                    "hashes": [{ "alg": "SHA-256", "content": a.sha256 }],
                })
            })
            .collect();

        json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.3",
            "serialNumber": format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            "version": 1,
            "metadata": {
                "timestamp": Utc::now().to_rfc3339(),
                "tools": [{ "vendor": TOOL_NAME, "name": TOOL_NAME, "version": TOOL_VERSION }],
                "component": { "type": "file", "name": self.root_name() },
            },
            "components": components,
        })
    }

    fn spdx(&self) -> Value {
        let files: Vec<Value> = self
            .artifacts
            .iter()
            .enumerate()
            .map(|(i, a)| {
                json!({
                    "fileName": format!("./{}", a.path),
                    "SPDXID": format!("SPDXRef-File-{}", i),
                    "checksums": [{ "algorithm": "SHA256", "checksumValue": a.sha256 }],
                    "licenseConcluded": "NOASSERTION",
                    "copyrightText": "NOASSERTION",
                })
            })
            .collect();

        json!({
            "spdxVersion": "SPDX-2.2",
            "dataLicense": "CC0-1.0",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": self.root_name(),
            "documentNamespace": format!("https://{}/spdx/{}", TOOL_NAME, uuid::Uuid::new_v4()),
            "creationInfo": {
                "created": Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                "creators": [format!("Tool: {}-{}", TOOL_NAME, TOOL_VERSION)],
            },
            "files": files,
        })
    }

    fn syft(&self) -> Value {
        let artifacts: Vec<Value> = self
            .artifacts
            .iter()
            .map(|a| {
                json!({
                    "location": { "path": a.path },
                    "size": a.size,
                    "digests": [{ "algorithm": "sha256", "value": a.sha256 }],
                })
            })
            .collect();

        json!({
            "artifacts": artifacts,
            "source": { "type": "directory", "target": self.root_name() },
            "descriptor": { "name": TOOL_NAME, "version": TOOL_VERSION },
            "schema": { "version": "3.0.1" },
        })
    }
}
