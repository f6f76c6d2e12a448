//! Grid-based navigation: walkable-grid construction from terrain or triangle
//! geometry, cost-aware A* search, and a frame-driven path-following agent.

pub mod agent;
pub mod astar;
pub mod config;
pub mod error;
pub mod map;

pub use agent::{AgentState, NavAgent};
pub use astar::{Path, PathFinder, PathResult, find_path};
pub use config::{AgentConfig, BuildConfig};
pub use error::NavigationError;
pub use map::{Cell, FlatSurface, FnSurface, Grid, GridBuilder, GridPoint, HeightSurface, WorldBounds};
