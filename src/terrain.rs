//! Procedural demo terrain: rolling hills with a steep-sided mesa.

use std::f32::consts::TAU;
use waypath_navigation::{FnSurface, HeightSurface, WorldBounds};

use crate::config::DemoConfig;

/// Height function for the demo scenario, centered on the origin.
///
/// The mesa sits in the +X/+Z quadrant and rises `3 * hill_height` above
/// the hills, so its rim is a cliff the slope filter must block.
pub fn demo_surface(demo: &DemoConfig) -> FnSurface<impl Fn(f32, f32) -> f32> {
    let half = demo.extent * 0.5;
    let bounds = WorldBounds::new(-half, -half, half, half);
    let amplitude = demo.hill_height;
    let k = TAU / demo.hill_wavelength;
    let (mesa_min, mesa_max) = (half * 0.25, half * 0.6);

    FnSurface::new(bounds, move |x, z| {
        let hills = amplitude * (x * k).sin() * (z * k).cos();
        let on_mesa = (mesa_min..mesa_max).contains(&x) && (mesa_min..mesa_max).contains(&z);
        if on_mesa { hills + 3.0 * amplitude } else { hills }
    })
}

/// Triangulates a surface on a regular lattice with `spacing` between
/// samples: two triangles per lattice square, three floats per vertex.
pub fn triangulate<S: HeightSurface>(surface: &S, spacing: f32) -> Option<(Vec<f32>, Vec<u32>)> {
    let bounds = surface.bounds()?;
    let columns = (bounds.width() / spacing).ceil() as usize;
    let rows = (bounds.depth() / spacing).ceil() as usize;

    let mut vertices = Vec::with_capacity((columns + 1) * (rows + 1) * 3);
    for row in 0..=rows {
        let z = (bounds.min_z + row as f32 * spacing).min(bounds.max_z);
        for column in 0..=columns {
            let x = (bounds.min_x + column as f32 * spacing).min(bounds.max_x);
            vertices.extend_from_slice(&[x, surface.sample(x, z)?, z]);
        }
    }

    let stride = (columns + 1) as u32;
    let mut indices = Vec::with_capacity(columns * rows * 6);
    for row in 0..rows as u32 {
        for column in 0..columns as u32 {
            let a = row * stride + column;
            let (b, c, d) = (a + 1, a + stride, a + stride + 1);
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }
    Some((vertices, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypath_navigation::FlatSurface;

    #[test]
    fn test_triangulate_counts() {
        let flat = FlatSurface {
            bounds: WorldBounds::new(0.0, 0.0, 4.0, 2.0),
            elevation: 1.0,
        };
        let (vertices, indices) = triangulate(&flat, 1.0).unwrap();
        assert_eq!(vertices.len(), 5 * 3 * 3);
        assert_eq!(indices.len(), 4 * 2 * 6);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len() / 3));
        assert!(vertices.chunks_exact(3).all(|v| v[1] == 1.0));
    }

    #[test]
    fn test_demo_surface_has_mesa() {
        let demo = DemoConfig::default();
        let surface = demo_surface(&demo);
        let half = demo.extent * 0.5;
        let inside = surface.sample(half * 0.4, half * 0.4).unwrap();
        let outside = surface.sample(-half * 0.4, -half * 0.4).unwrap();
        assert!(inside - outside > demo.hill_height, "mesa should stand well above the hills");
    }
}
