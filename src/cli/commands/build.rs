//! Build command - install vsdbg into its layer

use crate::cli::args::BuildArgs;
use crate::config::Config;
use crate::dependency::{ArchiveDelivery, CatalogResolver};
use crate::error::VsdbgResult;
use crate::layer::{Build, BuildContext, BuildpackInfo, BuildpackPlan, LayerStore};
use crate::log::Emitter;
use crate::sbom::DirectorySbomGenerator;
use std::sync::Arc;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> VsdbgResult<()> {
    let plan = match &args.plan {
        Some(path) => BuildpackPlan::from_file(path).await?,
        None => BuildpackPlan::default(),
    };
    debug!("Plan has {} entries", plan.entries.len());

    let sbom_formats = if args.sbom_formats.is_empty() {
        config.build.sbom_formats.clone()
    } else {
        args.sbom_formats
    };

    let ctx = BuildContext {
        buildpack_info: BuildpackInfo {
            name: args.buildpack_name,
            version: args.buildpack_version,
            sbom_formats,
        },
        cnb_path: args.cnb_path,
        layers_path: args.layers,
        platform_path: args.platform,
        plan,
        stack: args.stack,
    };

    let build = Build::new(
        Arc::new(CatalogResolver::new()),
        Arc::new(ArchiveDelivery),
        Arc::new(DirectorySbomGenerator),
        Emitter::stdout().with_level(config.general.log_level),
    );

    let result = build.run(&ctx).await?;
    result.write(&LayerStore::new(&ctx.layers_path)).await
}
