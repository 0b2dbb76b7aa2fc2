//! Error types for vsdbg-layer
//!
//! All modules use `VsdbgResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vsdbg-layer operations
pub type VsdbgResult<T> = Result<T, VsdbgError>;

/// All errors that can occur while retrieving or installing vsdbg
#[derive(Error, Debug)]
pub enum VsdbgError {
    // Upstream fetch errors
    #[error("received a non 200 status code from {url}: status code {status} received")]
    UpstreamStatus { url: String, status: u16 },

    #[error("failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    // Version format errors
    #[error("set_vsdbg_version() function not found")]
    FunctionNotFound,

    #[error("latest version not found")]
    LatestNotFound,

    #[error("unexpected version: expected {version:?} to be in the format of w.x.y.z")]
    MalformedVersion { version: String },

    #[error("the following version string could not be parsed {version:?}: {source}")]
    VersionParse {
        version: String,
        #[source]
        source: semver::Error,
    },

    // Artifact errors
    #[error("failed to compute checksum of {url}: {source}")]
    Checksum {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported archive at {url}: {reason}")]
    UnsupportedArchive { url: String, reason: String },

    // Dependency errors
    #[error(
        "failed to satisfy {id:?} dependency version constraint {constraint:?}: \
         no compatible versions on {stack:?} stack. Supported versions are: [{supported}]"
    )]
    Resolution {
        id: String,
        constraint: String,
        stack: String,
        supported: String,
    },

    #[error("invalid version constraint {constraint:?}: {source}")]
    VersionConstraint {
        constraint: String,
        #[source]
        source: semver::Error,
    },

    #[error("failed to deliver {uri}: {reason}")]
    Delivery { uri: String, reason: String },

    // SBOM errors
    #[error("unsupported SBOM format: '{0}'")]
    UnsupportedSbomFormat(String),

    #[error("SBOM error: {0}")]
    Sbom(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VsdbgError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a transport error for a failed request
    pub fn transport(url: impl Into<String>, source: ureq::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Create a delivery error
    pub fn delivery(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Delivery {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::FunctionNotFound | Self::LatestNotFound => {
                Some("The upstream installer script changed shape; check retrieval.script-url")
            }
            Self::Resolution { .. } => {
                Some("Run `vsdbg-layer retrieve` and add the result to buildpack.toml")
            }
            Self::UnsupportedSbomFormat(_) => Some(
                "Supported formats: application/vnd.cyclonedx+json, application/spdx+json, application/vnd.syft+json",
            ),
            _ => None,
        }
    }
}
