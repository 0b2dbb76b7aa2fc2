//! Configuration schema for vsdbg-layer
//!
//! Configuration is stored at `~/.config/vsdbg-layer/config.toml`

use crate::log::LogLevel;
use crate::retrieval::platform::{Platform, DEFAULT_URL_TEMPLATE};
use crate::retrieval::release::DEFAULT_SCRIPT_URL;
use crate::retrieval::verify::LicenseMode;
use crate::sbom::SbomFormat;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Layer build settings
    pub build: BuildConfig,

    /// Release retrieval settings
    pub retrieval: RetrievalConfig,
}

/// General application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GeneralConfig {
    /// Build log verbosity: "info" or "debug"
    pub log_level: LogLevel,
}

/// Layer build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// SBOM media types written next to the layer
    pub sbom_formats: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sbom_formats: SbomFormat::all()
                .iter()
                .map(|f| f.media_type().to_string())
                .collect(),
        }
    }
}

/// Retrieval pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetrievalConfig {
    /// Installer script scanned for the latest version
    pub script_url: String,

    /// Artifact URL pattern with `{version}`, `{os}`, `{arch}`
    pub url_template: String,

    /// Whether to scan archives for bundled licenses
    pub license_mode: LicenseMode,

    /// Stack ids written into descriptors
    pub stacks: Vec<String>,

    /// Platforms to produce descriptors for
    pub platforms: Vec<Platform>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            script_url: DEFAULT_SCRIPT_URL.to_string(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            license_mode: LicenseMode::Disabled,
            stacks: vec!["*".to_string()],
            platforms: vec![
                Platform::new("linux", "amd64"),
                Platform::new("linux", "arm64"),
            ],
        }
    }
}
