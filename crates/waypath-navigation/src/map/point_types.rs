/// Represents a cell address in grid coordinates (column, row).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPoint {
    /// The column index, along world X.
    pub x: usize,
    /// The row index, along world Z.
    pub z: usize,
}

impl GridPoint {
    /// Creates a new `GridPoint`.
    #[must_use]
    pub const fn new(x: usize, z: usize) -> Self {
        Self { x, z }
    }

    /// Chebyshev (king-move) distance to another cell.
    #[must_use]
    pub fn chebyshev_distance(&self, other: &GridPoint) -> usize {
        self.x.abs_diff(other.x).max(self.z.abs_diff(other.z))
    }
}

/// Axis-aligned rectangle on the horizontal (X, Z) plane, in world units.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldBounds {
    /// Minimum X coordinate.
    pub min_x: f32,
    /// Minimum Z coordinate.
    pub min_z: f32,
    /// Maximum X coordinate.
    pub max_x: f32,
    /// Maximum Z coordinate.
    pub max_z: f32,
}

impl WorldBounds {
    /// Creates a new `WorldBounds`.
    #[must_use]
    pub const fn new(min_x: f32, min_z: f32, max_x: f32, max_z: f32) -> Self {
        Self {
            min_x,
            min_z,
            max_x,
            max_z,
        }
    }

    /// True when all corners are finite and the max corner lies strictly
    /// beyond the min corner on both axes.
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_z, self.max_x, self.max_z]
            .iter()
            .all(|v| v.is_finite())
            && self.max_x > self.min_x
            && self.max_z > self.min_z
    }

    /// Extent along X.
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Extent along Z.
    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }
}
