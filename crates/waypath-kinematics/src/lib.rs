#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for ground-agent kinematics on a Y-up world."]
#![doc = ""]
#![doc = "This crate provides poses with a yaw heading, angle normalization,"]
#![doc = "shortest-arc rotation stepping and clamped translation stepping."]

use core::f32::consts::PI;
use core::fmt;
use libm::{atan2f, fabsf, sqrtf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::KinematicsError;

const DEG_TO_RAD: f32 = PI / 180.0;

/// A ground pose `(x, y, z, yaw)` in world units and radians.
///
/// The world is Y-up. `yaw` is measured around +Y, with `0` facing +Z and
/// `PI / 2` facing +X.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// World-frame x position.
    pub x: f32,
    /// World-frame y position (elevation).
    pub y: f32,
    /// World-frame z position.
    pub z: f32,
    /// Heading (rad), normalized to `[-PI, PI)`.
    pub yaw: f32,
}

impl Pose {
    /// Construct a new pose.
    ///
    /// # Arguments
    ///
    /// * `x`, `y`, `z`: World-frame position.
    /// * `yaw`: Heading in radians.
    pub const fn new(x: f32, y: f32, z: f32, yaw: f32) -> Self {
        Pose { x, y, z, yaw }
    }

    /// Normalize an angle to be within `[-PI, PI)`.
    ///
    /// Angles at `PI` will be normalized to `-PI`.
    pub fn normalize_angle(angle: f32) -> f32 {
        let a = angle % (2.0 * PI);
        if a >= PI {
            a - 2.0 * PI
        } else if a < -PI {
            a + 2.0 * PI
        } else {
            a
        }
    }

    /// Distance to `(x, z)` on the horizontal plane, ignoring elevation.
    pub fn horizontal_distance_to(&self, x: f32, z: f32) -> f32 {
        let dx = x - self.x;
        let dz = z - self.z;
        sqrtf(dx * dx + dz * dz)
    }

    /// Returns true if every component of the pose is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.yaw.is_finite()
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x: {:.2}, y: {:.2}, z: {:.2}, yaw: {:.2} rad)",
            self.x, self.y, self.z, self.yaw
        )
    }
}

/// Yaw that faces along the horizontal direction `(dx, dz)`.
///
/// Returns `None` for a zero-length direction.
pub fn heading_to(dx: f32, dz: f32) -> Option<f32> {
    if dx == 0.0 && dz == 0.0 {
        return None;
    }
    Some(Pose::normalize_angle(atan2f(dx, dz)))
}

/// Signed smallest rotation taking `from` onto `to`, in `[-PI, PI)`.
pub fn shortest_angle_delta(from: f32, to: f32) -> f32 {
    Pose::normalize_angle(to - from)
}

/// Linear and angular speed limits for an agent.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionLimits {
    /// Linear speed (world units per second).
    speed: f32,
    /// Angular speed (degrees per second).
    angular_speed: f32,
}

impl MotionLimits {
    /// Construct new motion limits.
    ///
    /// # Arguments
    ///
    /// * `speed`: Linear speed in world units per second.
    /// * `angular_speed`: Turn rate in degrees per second.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidSpeed)` if `speed` is not positive and finite.
    /// Returns `Err(KinematicsError::InvalidAngularSpeed)` if `angular_speed` is not positive and finite.
    pub fn new(speed: f32, angular_speed: f32) -> Result<Self, KinematicsError> {
        if !(speed > 0.0 && speed.is_finite()) {
            return Err(KinematicsError::InvalidSpeed("must be positive and finite"));
        }
        if !(angular_speed > 0.0 && angular_speed.is_finite()) {
            return Err(KinematicsError::InvalidAngularSpeed(
                "must be positive and finite",
            ));
        }
        Ok(MotionLimits {
            speed,
            angular_speed,
        })
    }

    /// Returns the linear speed.
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Returns the angular speed in degrees per second.
    pub fn angular_speed(&self) -> f32 {
        self.angular_speed
    }

    /// Turns `yaw` toward `target_yaw` along the shortest arc, limited to
    /// `angular_speed * dt`. The result is normalized to `[-PI, PI)`.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative or not finite.
    pub fn rotate_towards(&self, yaw: f32, target_yaw: f32, dt: f32) -> Result<f32, KinematicsError> {
        check_dt(dt)?;
        let delta = shortest_angle_delta(yaw, target_yaw);
        let max_step = self.angular_speed * DEG_TO_RAD * dt;
        if fabsf(delta) <= max_step {
            return Ok(Pose::normalize_angle(target_yaw));
        }
        let step = if delta > 0.0 { max_step } else { -max_step };
        Ok(Pose::normalize_angle(yaw + step))
    }

    /// Moves the pose toward `target` by at most `speed * dt` of horizontal
    /// travel, never passing it. Elevation is blended by the same fraction.
    /// The heading is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative or not finite.
    pub fn translate_towards(
        &self,
        pose: Pose,
        target: [f32; 3],
        dt: f32,
    ) -> Result<Pose, KinematicsError> {
        check_dt(dt)?;
        let [tx, ty, tz] = target;
        let distance = pose.horizontal_distance_to(tx, tz);
        let step = self.speed * dt;

        if distance <= step || distance <= f32::EPSILON {
            return Ok(Pose { x: tx, y: ty, z: tz, yaw: pose.yaw });
        }

        let t = step / distance;
        Ok(Pose {
            x: pose.x + (tx - pose.x) * t,
            y: pose.y + (ty - pose.y) * t,
            z: pose.z + (tz - pose.z) * t,
            yaw: pose.yaw,
        })
    }
}

impl fmt::Display for MotionLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MotionLimits (v: {:.2} u/s, w: {:.1} deg/s)", self.speed, self.angular_speed)
    }
}

fn check_dt(dt: f32) -> Result<(), KinematicsError> {
    if dt < 0.0 || !dt.is_finite() {
        return Err(KinematicsError::NegativeTimeDelta(
            "must be non-negative and finite",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_pose_normalization() {
        assert!((Pose::normalize_angle(0.0) - 0.0).abs() < EPSILON);
        assert!((Pose::normalize_angle(PI) - (-PI)).abs() < EPSILON); // PI maps to -PI for [-PI, PI)
        assert!((Pose::normalize_angle(-PI) - -PI).abs() < EPSILON);
        assert!((Pose::normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-4);
        assert!((Pose::normalize_angle(-2.5 * PI) - -0.5 * PI).abs() < 1e-4);
    }

    #[test]
    fn test_heading_to() {
        assert!((heading_to(0.0, 1.0).unwrap() - 0.0).abs() < EPSILON); // +Z
        assert!((heading_to(1.0, 0.0).unwrap() - PI / 2.0).abs() < EPSILON); // +X
        assert!((heading_to(-1.0, 0.0).unwrap() - (-PI / 2.0)).abs() < EPSILON); // -X
        assert!(heading_to(0.0, 0.0).is_none());
    }

    #[test]
    fn test_shortest_angle_delta_wraps() {
        // From 170 deg to -170 deg is a +20 deg turn, not -340.
        let from = 170.0 * DEG_TO_RAD;
        let to = -170.0 * DEG_TO_RAD;
        let delta = shortest_angle_delta(from, to);
        assert!((delta - 20.0 * DEG_TO_RAD).abs() < 1e-4, "delta was {}", delta);
    }

    #[test]
    fn test_limits_constructor() {
        let limits = MotionLimits::new(2.0, 90.0).unwrap();
        assert_eq!(limits.speed(), 2.0);
        assert_eq!(limits.angular_speed(), 90.0);
    }

    #[test]
    fn test_limits_invalid() {
        assert!(matches!(MotionLimits::new(0.0, 90.0), Err(KinematicsError::InvalidSpeed(_))));
        assert!(matches!(MotionLimits::new(f32::NAN, 90.0), Err(KinematicsError::InvalidSpeed(_))));
        assert!(matches!(
            MotionLimits::new(1.0, -5.0),
            Err(KinematicsError::InvalidAngularSpeed(_))
        ));
    }

    #[test]
    fn test_rotate_towards_limited() {
        let limits = MotionLimits::new(1.0, 90.0).unwrap();
        // 90 deg/s for 0.5 s = 45 deg of a 90 deg turn
        let yaw = limits.rotate_towards(0.0, PI / 2.0, 0.5).unwrap();
        assert!((yaw - PI / 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_rotate_towards_snaps_when_close() {
        let limits = MotionLimits::new(1.0, 90.0).unwrap();
        let yaw = limits.rotate_towards(0.0, 0.1, 1.0).unwrap();
        assert!((yaw - 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_rotate_towards_across_seam() {
        let limits = MotionLimits::new(1.0, 10.0).unwrap();
        let start = 175.0 * DEG_TO_RAD;
        let yaw = limits.rotate_towards(start, -175.0 * DEG_TO_RAD, 1.0).unwrap();
        // Ten degrees positive from 175 lands on 185 == -175.
        assert!((yaw - (-175.0 * DEG_TO_RAD)).abs() < 1e-4, "yaw was {}", yaw);
    }

    #[test]
    fn test_translate_towards_partial() {
        let limits = MotionLimits::new(1.0, 90.0).unwrap();
        let pose = Pose::new(0.0, 0.0, 0.0, 0.0);
        let next = limits.translate_towards(pose, [4.0, 2.0, 0.0], 1.0).unwrap();
        assert!((next.x - 1.0).abs() < EPSILON);
        assert!((next.y - 0.5).abs() < EPSILON); // a quarter of the way
        assert!((next.z - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_translate_towards_does_not_overshoot() {
        let limits = MotionLimits::new(10.0, 90.0).unwrap();
        let pose = Pose::new(0.0, 0.0, 0.0, 1.0);
        let next = limits.translate_towards(pose, [1.0, 0.0, 1.0], 5.0).unwrap();
        assert_eq!(next, Pose::new(1.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_negative_dt_rejected() {
        let limits = MotionLimits::new(1.0, 90.0).unwrap();
        assert!(matches!(
            limits.rotate_towards(0.0, 1.0, -0.1),
            Err(KinematicsError::NegativeTimeDelta(_))
        ));
        assert!(matches!(
            limits.translate_towards(Pose::default(), [1.0, 0.0, 0.0], f32::INFINITY),
            Err(KinematicsError::NegativeTimeDelta(_))
        ));
    }
}
