#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area peril resolution.
//!
//! Resolves an exposure location to a hazard-zone cell by point match,
//! falling back to county and then state name lookups keyed by the
//! location's hazard-metric tag.

pub mod fallback;
pub mod normalize;
pub mod resolver;

pub use fallback::AdministrativeFallbackTable;
pub use normalize::{KeyNormalizer, KeyPolicy};
pub use resolver::{AreaPerilResolver, MatchLevel};

/// Errors that can occur while building an area peril resolver.
#[derive(Debug, thiserror::Error)]
pub enum AreaPerilError {
    /// The spatial index could not be built.
    #[error("Spatial index error: {0}")]
    Spatial(#[from] quake_keys_spatial::SpatialError),
}
