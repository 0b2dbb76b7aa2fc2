//! Release discovery and dependency metadata
//!
//! Run periodically to refresh the dependency catalog:
//! scan the installer script for the latest release, verify the archive
//! for each configured platform, and synthesize one descriptor per archive.

mod http;
pub mod license;
pub mod metadata;
pub mod platform;
pub mod release;
pub mod verify;

pub use metadata::{synthesize, SynthesisOptions};
pub use platform::{Platform, UrlTemplate};
pub use release::{Fetcher, Release};
pub use verify::{LicenseMode, Verified, Verifier};

pub(crate) use verify::HashingReader;

pub(crate) use http::get as http_get;

use crate::config::schema::RetrievalConfig;
use crate::dependency::DependencyDescriptor;
use crate::error::VsdbgResult;
use tracing::info;

/// The full scan → verify → synthesize pipeline
#[derive(Debug, Clone)]
pub struct Retrieval {
    fetcher: Fetcher,
    verifier: Verifier,
    url_template: UrlTemplate,
    options: SynthesisOptions,
    platforms: Vec<Platform>,
}

impl Retrieval {
    pub fn new(
        fetcher: Fetcher,
        verifier: Verifier,
        url_template: UrlTemplate,
        options: SynthesisOptions,
        platforms: Vec<Platform>,
    ) -> Self {
        Self {
            fetcher,
            verifier,
            url_template,
            options,
            platforms,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        let url_template = UrlTemplate::new(config.url_template.clone());
        Self::new(
            Fetcher::new()
                .with_script_url(config.script_url.clone())
                .with_url_template(url_template.clone()),
            Verifier::new(config.license_mode),
            url_template,
            SynthesisOptions {
                stacks: config.stacks.clone(),
            },
            config.platforms.clone(),
        )
    }

    /// Replace the configured platform list
    pub fn with_platforms(mut self, platforms: Vec<Platform>) -> Self {
        self.platforms = platforms;
        self
    }

    /// Produce descriptors for the latest release.
    ///
    /// With no platforms configured, the release's default download URL is
    /// verified once and the descriptor carries no platform tags.
    pub fn run(&self) -> VsdbgResult<Vec<DependencyDescriptor>> {
        let release = self.fetcher.get()?;

        if self.platforms.is_empty() {
            let verified = self.verifier.verify(&release.download_url)?;
            return Ok(vec![synthesize(
                &release,
                &verified,
                &release.download_url,
                None,
                &self.options,
            )]);
        }

        let mut descriptors = Vec::with_capacity(self.platforms.len());
        for platform in &self.platforms {
            let url = release.artifact_url(&self.url_template, platform);
            info!("Verifying vsdbg {} for {}", release.version, platform);
            let verified = self.verifier.verify(&url)?;
            descriptors.push(synthesize(
                &release,
                &verified,
                &url,
                Some(platform),
                &self.options,
            ));
        }
        Ok(descriptors)
    }
}
