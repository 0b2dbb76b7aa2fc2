//! Software bill of materials for installed layers
//!
//! A generator inventories a layer directory; the resulting document is
//! rendered into each requested interchange format.

mod format;
mod generate;

pub use format::{FormattedSbom, SbomFormat};
pub use generate::{DirectorySbomGenerator, SbomGenerator};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One file recorded in the SBOM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomArtifact {
    /// Path relative to the document root
    pub path: String,
    pub size: u64,
    /// Lowercase hex SHA-256
    pub sha256: String,
}

/// Format-independent inventory of a directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomDocument {
    pub root: PathBuf,
    pub artifacts: Vec<SbomArtifact>,
}
