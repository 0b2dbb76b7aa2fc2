//! Dependency catalog, resolution and delivery
//!
//! `Resolver` picks a descriptor from a catalog; `Delivery` puts the
//! described archive on disk. The orchestrator only sees the traits.

mod catalog;
mod deliver;
mod descriptor;

pub use catalog::{CatalogResolver, Resolver};
pub use deliver::{ArchiveDelivery, Delivery};
pub use descriptor::DependencyDescriptor;
