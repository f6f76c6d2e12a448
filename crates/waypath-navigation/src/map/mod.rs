pub mod builder;
pub mod filter;
pub mod grid;
pub mod point_types;
pub mod surface;

pub use builder::GridBuilder;
pub use grid::{Cell, DEFAULT_COST_MULTIPLIER, Grid, MAX_CELLS};
pub use point_types::{GridPoint, WorldBounds};
pub use surface::{FlatSurface, FnSurface, HeightSurface};
