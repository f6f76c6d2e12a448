#![warn(missing_docs)]

//! Error types for the kinematics library.
//!
//! This module defines error types that can occur while validating motion
//! limits or stepping a pose forward in time.

use core::fmt;

/// Errors that can occur in kinematic calculations.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// Error for invalid linear speed.
    /// This variant is returned when a speed is provided that is not positive and finite.
    InvalidSpeed(&'static str),
    /// Error for invalid angular speed.
    /// This variant is returned when an angular speed is provided that is not positive and finite.
    InvalidAngularSpeed(&'static str),
    /// Error for negative time delta.
    /// This variant is returned when a negative or non-finite time delta is used for pose updates.
    NegativeTimeDelta(&'static str),
}

impl core::fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::InvalidSpeed(msg) => write!(f, "Invalid speed: {}", msg),
            KinematicsError::InvalidAngularSpeed(msg) => write!(f, "Invalid angular speed: {}", msg),
            KinematicsError::NegativeTimeDelta(msg) => write!(f, "Negative time delta: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
