//! Height-sampling surfaces consumed by [`super::GridBuilder::build_from_terrain`].

use super::WorldBounds;

/// A terrain-like surface that can report its extent and its elevation at
/// any horizontal position.
pub trait HeightSurface {
    /// World-space extent of the surface, or `None` if it has none yet.
    fn bounds(&self) -> Option<WorldBounds>;

    /// Elevation at `(world_x, world_z)`, or `None` if sampling failed.
    fn sample(&self, world_x: f32, world_z: f32) -> Option<f32>;
}

impl<S: HeightSurface + ?Sized> HeightSurface for &S {
    fn bounds(&self) -> Option<WorldBounds> {
        (**self).bounds()
    }

    fn sample(&self, world_x: f32, world_z: f32) -> Option<f32> {
        (**self).sample(world_x, world_z)
    }
}

/// A level plane at a constant elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatSurface {
    /// Extent of the plane.
    pub bounds: WorldBounds,
    /// Elevation of the plane.
    pub elevation: f32,
}

impl HeightSurface for FlatSurface {
    fn bounds(&self) -> Option<WorldBounds> {
        Some(self.bounds)
    }

    fn sample(&self, _world_x: f32, _world_z: f32) -> Option<f32> {
        Some(self.elevation)
    }
}

/// A surface whose elevation comes from a closure, e.g. a noise function.
pub struct FnSurface<F> {
    bounds: WorldBounds,
    height_fn: F,
}

impl<F> FnSurface<F>
where
    F: Fn(f32, f32) -> f32,
{
    /// Wraps `height_fn(x, z)` over `bounds`.
    pub fn new(bounds: WorldBounds, height_fn: F) -> Self {
        Self { bounds, height_fn }
    }
}

impl<F> HeightSurface for FnSurface<F>
where
    F: Fn(f32, f32) -> f32,
{
    fn bounds(&self) -> Option<WorldBounds> {
        Some(self.bounds)
    }

    fn sample(&self, world_x: f32, world_z: f32) -> Option<f32> {
        Some((self.height_fn)(world_x, world_z))
    }
}
