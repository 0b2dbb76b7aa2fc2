//! The vsdbg layer
//!
//! Build plan handling, durable layer storage and the build itself. A build
//! reuses the previous layer when it was produced from the same dependency
//! checksum and reinstalls it otherwise.

pub mod build;
pub mod plan;
pub mod store;

pub use build::{
    decide, Build, BuildContext, BuildResult, BuildpackInfo, LayerDecision, LayerFlags,
    BINARY_NAME, LAYER_NAME,
};
pub use plan::{BuildpackPlan, PlanEntry, Planner};
pub use store::{Environment, Layer, LayerStore, DEPENDENCY_CHECKSUM_KEY};
