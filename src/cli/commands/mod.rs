//! CLI command implementations

pub mod build;
pub mod config;
pub mod detect;
pub mod retrieve;

pub use build::execute as build;
pub use config::execute as config;
pub use detect::execute as detect;
pub use retrieve::execute as retrieve;
