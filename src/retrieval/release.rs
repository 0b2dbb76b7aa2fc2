//! Latest release discovery
//!
//! The vendor publishes no release index; the only authoritative source
//! for the current version is the `latest)` branch of the
//! `set_vsdbg_version()` function in the installer script.

use crate::error::{VsdbgError, VsdbgResult};
use crate::retrieval::http;
use crate::retrieval::platform::{Platform, UrlTemplate};
use std::io::{BufRead, BufReader};
use tracing::{debug, info};

/// Default location of the vendor installer script
pub const DEFAULT_SCRIPT_URL: &str = "https://aka.ms/getvsdbgsh";

const FUNCTION_MARKER: &str = "set_vsdbg_version()";
const LATEST_MARKER: &str = "latest)";

/// A released vsdbg version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Vendor version string, `w.x.y.z`
    pub version: String,

    /// The four components of `version`
    pub split_version: Vec<String>,

    /// `w.x.y+z`
    pub semver: semver::Version,

    /// linux/x64 artifact URL for this release
    pub download_url: String,
}

impl Release {
    /// Build a release from a vendor version string
    pub fn parse(version: &str, template: &UrlTemplate) -> VsdbgResult<Self> {
        let split_version: Vec<String> = version.split('.').map(str::to_string).collect();
        if split_version.len() != 4 {
            return Err(VsdbgError::MalformedVersion {
                version: version.to_string(),
            });
        }

        let semver_str = format!("{}+{}", split_version[..3].join("."), split_version[3]);
        let semver = semver::Version::parse(&semver_str).map_err(|e| VsdbgError::VersionParse {
            version: version.to_string(),
            source: e,
        })?;

        let download_url = template.render(&split_version, &Platform::linux_x64());

        Ok(Self {
            version: version.to_string(),
            split_version,
            semver,
            download_url,
        })
    }

    /// Artifact URL for a specific platform
    pub fn artifact_url(&self, template: &UrlTemplate, platform: &Platform) -> String {
        template.render(&self.split_version, platform)
    }
}

/// Fetches the installer script and extracts the latest release
#[derive(Debug, Clone)]
pub struct Fetcher {
    script_url: String,
    url_template: UrlTemplate,
}

impl Fetcher {
    pub fn new() -> Self {
        Self {
            script_url: DEFAULT_SCRIPT_URL.to_string(),
            url_template: UrlTemplate::default(),
        }
    }

    pub fn with_script_url(mut self, url: impl Into<String>) -> Self {
        self.script_url = url.into();
        self
    }

    pub fn with_url_template(mut self, template: UrlTemplate) -> Self {
        self.url_template = template;
        self
    }

    /// Fetch the script and return the release its `latest)` branch names.
    ///
    /// No retries; the caller owns retry policy.
    pub fn get(&self) -> VsdbgResult<Release> {
        let body = http::get(&self.script_url)?;
        let version = scan_script(BufReader::new(body), &self.script_url)?;
        info!("Latest vsdbg release is {}", version);
        Release::parse(&version, &self.url_template)
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the latest version string from installer script text.
///
/// Markers may share a line with each other and with the assignment; the
/// first non-blank text after both markers must be `name=value`.
pub fn scan_script<R: BufRead>(reader: R, source: &str) -> VsdbgResult<String> {
    let mut in_function = false;
    let mut latest = false;

    for line in reader.lines() {
        let line = line.map_err(|e| VsdbgError::io(format!("reading {}", source), e))?;
        let mut rest = line.as_str();

        if !in_function {
            match rest.find(FUNCTION_MARKER) {
                Some(i) => {
                    debug!("Found {} in {}", FUNCTION_MARKER, source);
                    in_function = true;
                    rest = &rest[i + FUNCTION_MARKER.len()..];
                }
                None => continue,
            }
        }

        if !latest {
            match rest.find(LATEST_MARKER) {
                Some(i) => {
                    latest = true;
                    rest = &rest[i + LATEST_MARKER.len()..];
                }
                None => continue,
            }
        }

        let assignment = rest.trim();
        if assignment.is_empty() {
            continue;
        }
        return version_from_assignment(assignment);
    }

    if !in_function {
        return Err(VsdbgError::FunctionNotFound);
    }
    if !latest {
        return Err(VsdbgError::LatestNotFound);
    }
    Err(VsdbgError::MalformedVersion {
        version: String::new(),
    })
}

fn version_from_assignment(assignment: &str) -> VsdbgResult<String> {
    match assignment.split_once('=') {
        Some((_, value)) => Ok(value.trim().to_string()),
        None => Err(VsdbgError::MalformedVersion {
            version: assignment.to_string(),
        }),
    }
}
