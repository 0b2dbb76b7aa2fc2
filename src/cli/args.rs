//! CLI argument definitions using clap derive

use crate::retrieval::Platform;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// vsdbg-layer - install the Visual Studio Debugger into an image layer
///
/// Detects, builds and refreshes the dependency catalog for the vsdbg
/// layer.
#[derive(Parser, Debug)]
#[command(name = "vsdbg-layer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "VSDBG_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the build plan this buildpack contributes
    Detect,

    /// Install vsdbg into its layer, reusing the previous build when possible
    Build(BuildArgs),

    /// Scan upstream for the latest release and print catalog entries
    Retrieve(RetrieveArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Layers directory
    #[arg(long, env = "CNB_LAYERS_DIR")]
    pub layers: PathBuf,

    /// Buildpack root holding buildpack.toml
    #[arg(long, env = "CNB_BUILDPACK_DIR")]
    pub cnb_path: PathBuf,

    /// Buildpack plan file
    #[arg(long, env = "CNB_BP_PLAN_PATH")]
    pub plan: Option<PathBuf>,

    /// Platform directory
    #[arg(long, env = "CNB_PLATFORM_DIR", default_value = "/platform")]
    pub platform: PathBuf,

    /// Stack id of the build image
    #[arg(long, env = "CNB_STACK_ID", default_value = "")]
    pub stack: String,

    /// Buildpack name shown in the build log
    #[arg(long, default_value = "Visual Studio Debugger Buildpack")]
    pub buildpack_name: String,

    /// Buildpack version shown in the build log
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
    pub buildpack_version: String,

    /// SBOM media types to write (overrides build.sbom-formats)
    #[arg(long = "sbom-format")]
    pub sbom_formats: Vec<String>,
}

/// Arguments for the retrieve command
#[derive(Parser, Debug)]
pub struct RetrieveArgs {
    /// Write descriptors to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target platform as os/arch (repeatable, overrides retrieval.platforms)
    #[arg(long = "platform")]
    pub platforms: Vec<Platform>,

    /// Scan archives for bundled licenses
    #[arg(long)]
    pub scan_licenses: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
