//! This module defines the error types used by the `waypath-navigation` crate.

#![warn(missing_docs)]

/// Error type for navigation operations.
///
/// Build operations surface configuration problems through this type. Grid
/// queries and searches never return it: they fail with `false`/`None` instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum NavigationError {
    /// Returned when the world bounds are empty, inverted or non-finite.
    #[error("Invalid world bounds: {0}")]
    InvalidBounds(&'static str),
    /// Returned when the cell size is not positive and finite.
    #[error("Invalid cell size: {0}")]
    InvalidCellSize(&'static str),
    /// Returned when the cell count would overflow or exceeds [`crate::map::MAX_CELLS`].
    #[error("Invalid grid dimensions: {0}")]
    InvalidDimensions(&'static str),
    /// Returned for malformed vertex or index buffers.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(&'static str),
    /// Returned when a height surface reports no bounds or a bad sample.
    #[error("Invalid height surface: {0}")]
    InvalidSurface(&'static str),
    /// Returned for out-of-range build or agent parameters.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
