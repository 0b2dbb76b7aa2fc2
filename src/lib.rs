//! vsdbg-layer - Visual Studio Debugger layer buildpack
//!
//! Discovers vsdbg releases, turns them into verifiable dependency
//! descriptors, and installs the debugger into a reusable image layer.

pub mod cli;
pub mod config;
pub mod dependency;
pub mod detect;
pub mod error;
pub mod layer;
pub mod log;
pub mod retrieval;
pub mod sbom;

#[cfg(test)]
mod test_support;

pub use error::{VsdbgError, VsdbgResult};
