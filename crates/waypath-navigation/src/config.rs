//! Construction-time settings for grid building and agents.

use crate::error::NavigationError;
use waypath_kinematics::MotionLimits;

/// Grid resolution and slope-filter tolerances.
///
/// `max_climb` and `max_slope` only affect the slope filter pass, never the
/// rasterization itself.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildConfig {
    /// World-space edge length of a cell.
    pub cell_size: f32,
    /// Largest height step (world units) allowed between orthogonal neighbours.
    pub max_climb: f32,
    /// Largest inferred slope angle (degrees) allowed between orthogonal neighbours.
    pub max_slope: f32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            max_climb: 0.5,
            max_slope: 45.0,
        }
    }
}

impl BuildConfig {
    /// Creates a validated build configuration.
    pub fn new(cell_size: f32, max_climb: f32, max_slope: f32) -> Result<Self, NavigationError> {
        let config = Self {
            cell_size,
            max_climb,
            max_slope,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every field for range and finiteness.
    pub fn validate(&self) -> Result<(), NavigationError> {
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return Err(NavigationError::InvalidCellSize(
                "Cell size must be positive and finite",
            ));
        }
        if !(self.max_climb >= 0.0) || self.max_climb.is_nan() {
            return Err(NavigationError::InvalidConfig(
                "Max climb must be non-negative",
            ));
        }
        if !(self.max_slope >= 0.0) || self.max_slope.is_nan() {
            return Err(NavigationError::InvalidConfig(
                "Max slope must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Tunable parameters of a [`crate::agent::NavAgent`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentConfig {
    /// Linear speed in world units per second.
    pub speed: f32,
    /// Turn rate in degrees per second.
    pub angular_speed: f32,
    /// Horizontal distance at which a waypoint counts as reached.
    pub stopping_distance: f32,
    /// Vertical offset added on top of the grid height of each waypoint.
    pub height: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            speed: 3.5,
            angular_speed: 360.0,
            stopping_distance: 0.1,
            height: 0.0,
        }
    }
}

impl AgentConfig {
    /// Checks every field and returns the motion limits they describe.
    pub fn validate(&self) -> Result<MotionLimits, NavigationError> {
        if !(self.stopping_distance >= 0.0) || !self.stopping_distance.is_finite() {
            return Err(NavigationError::InvalidConfig(
                "Stopping distance must be non-negative and finite",
            ));
        }
        if !self.height.is_finite() {
            return Err(NavigationError::InvalidConfig("Agent height must be finite"));
        }
        MotionLimits::new(self.speed, self.angular_speed).map_err(|_| {
            NavigationError::InvalidConfig("Agent speed and angular speed must be positive")
        })
    }
}
