//! Frame-driven path follower.

use nalgebra::Point3;
use tracing::{debug, info, warn};
use waypath_kinematics::{MotionLimits, Pose, heading_to};

use crate::astar::{Path, PathFinder};
use crate::config::AgentConfig;
use crate::error::NavigationError;
use crate::map::Grid;

/// Where an agent is in its path-following lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentState {
    /// No path.
    Idle,
    /// Moving toward the waypoint under the cursor.
    Following,
    /// The final waypoint has been consumed.
    Arrived,
}

/// Moves a pose along a planned [`Path`] one frame at a time.
///
/// The agent borrows its grid for `'g` through the finder it searches with,
/// so the grid cannot be mutated while an initialized agent is alive. Callers
/// that edit the grid at runtime plan with a short-lived [`PathFinder`] (or a
/// scoped, initialized agent) and hand the result over with
/// [`NavAgent::follow_path`], which needs no grid at all.
#[derive(Debug)]
pub struct NavAgent<'g> {
    finder: Option<PathFinder<'g>>,
    config: AgentConfig,
    limits: MotionLimits,
    pose: Pose,
    path: Option<Path>,
    current_waypoint: usize,
    reached: bool,
}

impl<'g> NavAgent<'g> {
    /// Creates an idle agent at `position`, facing +Z.
    pub fn new(config: AgentConfig, position: Point3<f32>) -> Result<Self, NavigationError> {
        let limits = config.validate()?;
        Ok(Self {
            finder: None,
            config,
            limits,
            pose: Pose::new(position.x, position.y, position.z, 0.0),
            path: None,
            current_waypoint: 0,
            reached: false,
        })
    }

    /// Binds the agent to the grid it plans on. Any current path is kept.
    pub fn initialize(&mut self, grid: &'g Grid) {
        self.finder = Some(PathFinder::new(grid));
    }

    pub fn is_initialized(&self) -> bool {
        self.finder.is_some()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Plans from the current position to `target`.
    ///
    /// On success the cursor restarts at the first waypoint. On failure the
    /// previous path is dropped and the agent stays where it is.
    pub fn set_destination(&mut self, target: Point3<f32>) -> bool {
        let position = self.position();
        let planned = match self.finder.as_mut() {
            Some(finder) => finder.find_path(&position, &target),
            None => {
                warn!("Destination set on an agent with no grid");
                None
            }
        };

        match planned {
            Some(path) => {
                debug!(waypoints = path.len(), ?target, "Destination set");
                self.follow_path(path);
                true
            }
            None => {
                warn!(?position, ?target, "No path to destination");
                self.stop();
                false
            }
        }
    }

    /// Adopts an already planned path. An empty path leaves the agent idle.
    pub fn follow_path(&mut self, path: Path) {
        self.current_waypoint = 0;
        self.reached = false;
        self.path = (!path.is_empty()).then_some(path);
    }

    /// Advances the agent by `dt` seconds.
    ///
    /// A frame either consumes the current waypoint (when within stopping
    /// distance) or moves toward it, never both, so at most one waypoint is
    /// consumed per call. Rotation follows the direction of travel.
    pub fn update(&mut self, dt: f32) {
        if self.reached {
            return;
        }
        let Some(path) = &self.path else {
            return;
        };
        let Some(waypoint) = path.waypoints().get(self.current_waypoint) else {
            return;
        };

        let target = [waypoint.x, waypoint.y + self.config.height, waypoint.z];
        let distance = self.pose.horizontal_distance_to(target[0], target[2]);
        if distance <= self.config.stopping_distance {
            self.current_waypoint += 1;
            if self.current_waypoint >= path.len() {
                self.reached = true;
                info!(pose = %self.pose, "Agent arrived");
            }
            return;
        }

        let heading = heading_to(target[0] - self.pose.x, target[2] - self.pose.z);
        let moved = self.limits.translate_towards(self.pose, target, dt).and_then(|pose| {
            let yaw = match heading {
                Some(h) => self.limits.rotate_towards(pose.yaw, h, dt)?,
                None => pose.yaw,
            };
            Ok(Pose { yaw, ..pose })
        });
        match moved {
            Ok(pose) => self.pose = pose,
            Err(e) => warn!(dt, "Skipped agent update: {}", e),
        }
    }

    /// Drops the path and resets the cursor. Position and yaw are kept.
    pub fn stop(&mut self) {
        self.path = None;
        self.current_waypoint = 0;
        self.reached = false;
    }

    pub fn state(&self) -> AgentState {
        match (&self.path, self.reached) {
            (None, _) => AgentState::Idle,
            (Some(_), false) => AgentState::Following,
            (Some(_), true) => AgentState::Arrived,
        }
    }

    pub fn has_reached(&self) -> bool {
        self.reached
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn current_waypoint_index(&self) -> usize {
        self.current_waypoint
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn position(&self) -> Point3<f32> {
        Point3::new(self.pose.x, self.pose.y, self.pose.z)
    }

    /// Teleports the agent. The path and cursor are left as they are.
    pub fn set_position(&mut self, position: Point3<f32>) {
        self.pose.x = position.x;
        self.pose.y = position.y;
        self.pose.z = position.z;
    }

    /// Heading in radians, `0` facing +Z.
    pub fn yaw(&self) -> f32 {
        self.pose.yaw
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.pose.yaw = Pose::normalize_angle(yaw);
    }

    /// Horizontal distance left to travel: to the current waypoint, then
    /// along the rest of the path. Zero when idle or arrived.
    pub fn remaining_distance(&self) -> f32 {
        let Some(path) = self.path.as_ref().filter(|_| !self.reached) else {
            return 0.0;
        };
        let rest = &path.waypoints()[self.current_waypoint.min(path.len())..];
        let Some(first) = rest.first() else {
            return 0.0;
        };
        let to_first = self.pose.horizontal_distance_to(first.x, first.z);
        let along: f32 = rest
            .windows(2)
            .map(|w| ((w[1].x - w[0].x).powi(2) + (w[1].z - w[0].z).powi(2)).sqrt())
            .sum();
        to_first + along
    }
}
