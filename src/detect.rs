//! Detection
//!
//! vsdbg is never required by the application itself, so detection always
//! passes and only advertises that the dependency can be provided.

use crate::error::VsdbgResult;
use crate::layer::LAYER_NAME;
use serde::{Deserialize, Serialize};

/// A dependency this buildpack can provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provision {
    pub name: String,
}

/// Build plan contributed during detection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    #[serde(default)]
    pub provides: Vec<Provision>,
}

impl BuildPlan {
    pub fn to_toml(&self) -> VsdbgResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn detect() -> BuildPlan {
    BuildPlan {
        provides: vec![Provision {
            name: LAYER_NAME.to_string(),
        }],
    }
}
