//! Target platforms and the vendor download URL scheme

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default vendor CDN layout for vsdbg archives
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://vsdebugger-cyg0dxb6czfafzaz.b01.azurefd.net/vsdbg-{version}/vsdbg-{os}-{arch}.tar.gz";

/// An OS/architecture pair a descriptor can be scoped to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this process runs on, in catalog spelling
    pub fn host() -> Self {
        let arch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            other => other,
        };
        Self::new(std::env::consts::OS, arch)
    }

    /// Whether a descriptor tagged with `os`/`arch` can run here.
    /// Missing tags match every platform.
    pub fn accepts(&self, os: Option<&str>, arch: Option<&str>) -> bool {
        os.map_or(true, |os| os == self.os) && arch.map_or(true, |arch| arch == self.arch)
    }

    /// The platform the scanner's default download URL points at
    pub fn linux_x64() -> Self {
        Self::new("linux", "x64")
    }

    /// Architecture name as the vendor spells it in archive names
    pub fn vendor_arch(&self) -> &str {
        match self.arch.as_str() {
            "amd64" => "x64",
            other => other,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((os, arch)) if !os.is_empty() && !arch.is_empty() => Ok(Self::new(os, arch)),
            _ => Err(format!("invalid platform '{}': expected <os>/<arch>", s)),
        }
    }
}

/// Download URL pattern with `{version}`, `{os}` and `{arch}` placeholders
///
/// `{version}` expands to the release components joined with `-`. A
/// template without placeholders always renders to itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn render(&self, version_components: &[String], platform: &Platform) -> String {
        self.0
            .replace("{version}", &version_components.join("-"))
            .replace("{os}", &platform.os)
            .replace("{arch}", platform.vendor_arch())
    }
}

impl Default for UrlTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_URL_TEMPLATE)
    }
}
