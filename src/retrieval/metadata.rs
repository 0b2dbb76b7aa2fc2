//! Dependency metadata synthesis
//!
//! Pure construction of a `DependencyDescriptor` from a release and a
//! verified artifact. No I/O happens here.

use crate::dependency::DependencyDescriptor;
use crate::retrieval::platform::Platform;
use crate::retrieval::release::Release;
use crate::retrieval::verify::Verified;

pub const DEPENDENCY_ID: &str = "vsdbg";
pub const DEPENDENCY_NAME: &str = "Visual Studio Debugger";
const CPE_VENDOR: &str = "microsoft";

/// Knobs that differ between catalogs consuming the descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Stack ids written into every descriptor
    pub stacks: Vec<String>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            stacks: vec!["*".to_string()],
        }
    }
}

/// Package URL for a vsdbg archive
pub fn purl(version: &str, checksum_hex: &str, download_url: &str) -> String {
    format!(
        "pkg:generic/{}@{}?checksum={}&download_url={}",
        DEPENDENCY_ID, version, checksum_hex, download_url
    )
}

/// CPE 2.3 identity for a vsdbg version
pub fn cpe(version: &str) -> String {
    format!(
        "cpe:2.3:a:{}:{}:{}:*:*:*:*:*:*:*",
        CPE_VENDOR, DEPENDENCY_ID, version
    )
}

/// Build the descriptor for one verified artifact.
///
/// With a platform the descriptor is scoped to that OS/arch pair; without
/// one it carries no platform tags.
pub fn synthesize(
    release: &Release,
    verified: &Verified,
    url: &str,
    platform: Option<&Platform>,
    options: &SynthesisOptions,
) -> DependencyDescriptor {
    let checksum = format!("sha256:{}", verified.checksum);

    DependencyDescriptor {
        id: DEPENDENCY_ID.to_string(),
        name: DEPENDENCY_NAME.to_string(),
        version: release.semver.to_string(),
        checksum: checksum.clone(),
        uri: url.to_string(),
        source: url.to_string(),
        source_checksum: checksum,
        stacks: options.stacks.clone(),
        os: platform.map(|p| p.os.clone()),
        arch: platform.map(|p| p.arch.clone()),
        cpe: cpe(&release.version),
        purl: purl(&release.version, &verified.checksum, url),
        licenses: verified.licenses.clone(),
        strip_components: 0,
    }
}
