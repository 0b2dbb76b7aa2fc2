//! Layer build orchestration
//!
//! One build resolves the requested vsdbg version, then either reuses the
//! layer from the previous build or installs the dependency afresh.

use crate::dependency::{Delivery, DependencyDescriptor, Resolver};
use crate::error::{VsdbgError, VsdbgResult};
use crate::layer::plan::{BuildpackPlan, Planner};
use crate::layer::store::{Layer, LayerStore, DEPENDENCY_CHECKSUM_KEY};
use crate::log::Emitter;
use crate::sbom::SbomGenerator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Plan entry, layer and catalog id of the dependency
pub const LAYER_NAME: &str = "vsdbg";

/// Installed executable, relative to the layer root
pub const BINARY_NAME: &str = "vsdbg";

/// Execute bits for owner and group
const EXECUTE_BITS: u32 = 0o110;

/// Identity of the running buildpack
#[derive(Debug, Clone, Default)]
pub struct BuildpackInfo {
    pub name: String,
    pub version: String,
    /// SBOM media types to write for every fresh layer
    pub sbom_formats: Vec<String>,
}

/// Everything one build invocation needs to know
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub buildpack_info: BuildpackInfo,
    /// Buildpack root, holding `buildpack.toml`
    pub cnb_path: PathBuf,
    pub layers_path: PathBuf,
    pub platform_path: PathBuf,
    pub plan: BuildpackPlan,
    pub stack: String,
}

/// Layers produced by a build
#[derive(Debug, Clone, Default)]
pub struct BuildResult {
    pub layers: Vec<Layer>,
}

impl BuildResult {
    /// Persist every layer so the next build can reuse it
    pub async fn write(&self, store: &LayerStore) -> VsdbgResult<()> {
        for layer in &self.layers {
            store.write(layer).await?;
        }
        Ok(())
    }
}

/// Visibility of the layer in later phases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerFlags {
    pub build: bool,
    pub launch: bool,
    pub cache: bool,
}

impl LayerFlags {
    /// A layer needed at build time is also cached
    pub fn new(build: bool, launch: bool) -> Self {
        Self {
            build,
            launch,
            cache: build,
        }
    }

    fn apply(self, layer: &mut Layer) {
        layer.build = self.build;
        layer.launch = self.launch;
        layer.cache = self.cache;
    }
}

/// Outcome of comparing the previous layer with the resolved dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerDecision {
    /// The installed contents match; only flags change
    Cached { flags: LayerFlags },
    /// The layer must be reset and the dependency installed
    Fresh { flags: LayerFlags },
}

/// Reuse the layer only if it records the resolved dependency's checksum
pub fn decide(previous: &Layer, dependency: &DependencyDescriptor, flags: LayerFlags) -> LayerDecision {
    match previous.dependency_checksum() {
        Some(checksum) if checksum == dependency.checksum => LayerDecision::Cached { flags },
        _ => LayerDecision::Fresh { flags },
    }
}

/// The vsdbg layer build
pub struct Build {
    resolver: Arc<dyn Resolver>,
    delivery: Arc<dyn Delivery>,
    sbom: Arc<dyn SbomGenerator>,
    emitter: Emitter,
}

impl Build {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        delivery: Arc<dyn Delivery>,
        sbom: Arc<dyn SbomGenerator>,
        emitter: Emitter,
    ) -> Self {
        Self {
            resolver,
            delivery,
            sbom,
            emitter,
        }
    }

    pub async fn run(&self, ctx: &BuildContext) -> VsdbgResult<BuildResult> {
        self.emitter.title(format!(
            "{} {}",
            ctx.buildpack_info.name, ctx.buildpack_info.version
        ));

        let planner = Planner::new();

        self.emitter.process("Resolving Visual Studio Debugger version");
        let (entry, sorted) = planner.resolve(LAYER_NAME, &ctx.plan.entries);
        self.emitter.candidates(&sorted);

        let dependency = self
            .resolver
            .resolve(
                &ctx.cnb_path.join("buildpack.toml"),
                &entry.name,
                entry.version().unwrap_or_default(),
                &ctx.stack,
            )
            .await?;
        self.emitter.selected_dependency(&entry, &dependency);

        let (launch, build) = planner.merge_layer_types(LAYER_NAME, &ctx.plan.entries);
        let flags = LayerFlags::new(build, launch);

        let store = LayerStore::new(&ctx.layers_path);
        let mut layer = store.get(LAYER_NAME).await?;

        match decide(&layer, &dependency, flags) {
            LayerDecision::Cached { flags } => {
                self.emitter
                    .process(format!("Reusing cached layer {}", layer.path.display()));
                flags.apply(&mut layer);
            }
            LayerDecision::Fresh { flags } => {
                store.reset(&mut layer).await?;
                flags.apply(&mut layer);
                self.install(ctx, &dependency, &mut layer).await?;
            }
        }

        Ok(BuildResult {
            layers: vec![layer],
        })
    }

    async fn install(
        &self,
        ctx: &BuildContext,
        dependency: &DependencyDescriptor,
        layer: &mut Layer,
    ) -> VsdbgResult<()> {
        self.emitter.process("Executing build process");
        self.emitter.subprocess(format!(
            "Installing Visual Studio Debugger {}",
            dependency.version
        ));
        self.emitter
            .detail(format!("Archive {} ({})", dependency.uri, dependency.checksum));

        let started = Instant::now();
        self.delivery
            .deliver(dependency, &ctx.cnb_path, &layer.path, &ctx.platform_path)
            .await?;
        self.emitter.completed_in(started.elapsed());
        self.emitter.break_line();

        make_executable(&layer.path.join(BINARY_NAME)).await?;

        self.emitter.generating_sbom(&layer.path);
        let started = Instant::now();
        let document = self.sbom.generate(&layer.path).await?;
        self.emitter.completed_in(started.elapsed());
        self.emitter.break_line();

        self.emitter.formatting_sbom(&ctx.buildpack_info.sbom_formats);
        layer.sbom = document.in_formats(&ctx.buildpack_info.sbom_formats)?;

        layer
            .shared_env
            .append("PATH", layer.path.display().to_string(), ":");
        self.emitter.environment_variables(layer);

        layer.metadata = toml::Table::new();
        layer.metadata.insert(
            DEPENDENCY_CHECKSUM_KEY.to_string(),
            dependency.checksum.clone().into(),
        );
        Ok(())
    }
}

/// Add owner and group execute to a file, keeping every existing bit
#[cfg(unix)]
async fn make_executable(path: &Path) -> VsdbgResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| VsdbgError::io(format!("stat {}", path.display()), e))?;
    let mode = (metadata.permissions().mode() & 0o7777) | EXECUTE_BITS;
    debug!("Setting mode {:o} on {}", mode, path.display());

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|e| VsdbgError::io(format!("chmod {}", path.display()), e))
}

#[cfg(not(unix))]
async fn make_executable(path: &Path) -> VsdbgResult<()> {
    tokio::fs::metadata(path)
        .await
        .map(|_| ())
        .map_err(|e| VsdbgError::io(format!("stat {}", path.display()), e))
}
