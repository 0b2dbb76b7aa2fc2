//! Dependency descriptors
//!
//! A descriptor is the immutable record of one installable vsdbg archive.
//! It is written by the retrieval pipeline and read back from the
//! `[[metadata.dependencies]]` table of `buildpack.toml`.

use serde::{Deserialize, Serialize};

/// One installable version of a dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependencyDescriptor {
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Semantic version string
    pub version: String,

    /// `<algorithm>:<hex>` digest of the archive at `uri`
    pub checksum: String,

    pub uri: String,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub source_checksum: String,

    /// Stack ids this archive runs on; `*` matches every stack
    #[serde(default)]
    pub stacks: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cpe: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub purl: String,

    #[serde(default)]
    pub licenses: Vec<String>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub strip_components: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl DependencyDescriptor {
    /// Split `checksum` into algorithm and hex digest.
    ///
    /// A bare digest without an algorithm prefix is treated as SHA-256.
    pub fn checksum_parts(&self) -> (&str, &str) {
        match self.checksum.split_once(':') {
            Some((algorithm, digest)) => (algorithm, digest),
            None => ("sha256", self.checksum.as_str()),
        }
    }

    /// Whether this descriptor applies to `stack`
    pub fn supports_stack(&self, stack: &str) -> bool {
        self.stacks.iter().any(|s| s == "*" || s == stack)
    }
}
