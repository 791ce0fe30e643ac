//! cloud-catalog library
//!
//! Typed, validated access to a catalog of cloud deployments: which OS images
//! each cloud offers, which flavors those images run on, and how flavors are
//! grouped for display.
//!
//! # Design Principles
//!
//! - **Validate Once**: A catalog is either fully valid or not loaded at all
//! - **Immutable**: No mutation API after load; share freely across threads
//! - **Exhaustive**: Image filters are a sum type, so callers handle both shapes
//!
//! # Example
//!
//! ```
//! use cloud_catalog::Catalog;
//!
//! let catalog = Catalog::builtin().unwrap();
//! let js2 = catalog.find_cloud_by_hostname("js2.jetstream-cloud.org").unwrap();
//! assert_eq!(js2.match_flavor_group("m3.large").unwrap().title(), "General-purpose");
//! ```

pub mod catalog;
pub mod registry;

mod error;

pub use catalog::{
    Catalog, CatalogLoader, Cloud, FlavorGroup, FlavorPattern, ImageExcludeFilter, ImageFilter,
    ImageMetadata, ImageVisibility, InstanceType, SourceFormat, Version,
};
pub use error::{CatalogError, ValidationError};
