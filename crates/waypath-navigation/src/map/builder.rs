//! Grid population from explicit bounds, height surfaces or triangle soup.

use nalgebra::Point3;
use tracing::{debug, trace};

use super::{Grid, GridPoint, HeightSurface, WorldBounds};
use crate::config::BuildConfig;
use crate::error::NavigationError;

/// Slack on barycentric weights so cell centers lying exactly on a shared
/// edge are claimed by both triangles.
const BARYCENTRIC_EPSILON: f32 = 1e-6;

/// Relative slack taken off `extent / cell_size` before rounding up, so
/// division noise on an exact multiple does not add a column.
const CELL_COUNT_SLACK: f32 = 1e-5;

/// Populates a [`Grid`] according to a [`BuildConfig`].
///
/// Every build call fully replaces the grid's previous contents. On error the
/// grid is left unbuilt, so all of its queries fail safely.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridBuilder {
    config: BuildConfig,
}

impl GridBuilder {
    /// Creates a builder. The configuration is validated by each build call.
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Gets the build configuration.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Lays a flat, fully walkable grid over `bounds`.
    ///
    /// The grid gets `ceil(extent / cell_size)` cells per axis (at least one),
    /// all at height 0 with the default cost.
    pub fn build(&self, grid: &mut Grid, bounds: WorldBounds) -> Result<(), NavigationError> {
        grid.reset();
        self.config.validate()?;
        self.allocate(grid, bounds)?;
        grid.mark_built();

        debug!(
            width = grid.width(),
            height = grid.height(),
            cell_size = self.config.cell_size,
            "Built flat navigation grid"
        );
        Ok(())
    }

    /// Builds over the surface's bounds, samples its height at every cell
    /// center, then runs the slope filter.
    pub fn build_from_terrain<S>(&self, grid: &mut Grid, surface: &S) -> Result<(), NavigationError>
    where
        S: HeightSurface + ?Sized,
    {
        grid.reset();
        self.config.validate()?;
        let bounds = surface.bounds().ok_or(NavigationError::InvalidSurface(
            "Surface reports no bounds",
        ))?;
        self.allocate(grid, bounds)?;

        for index in 0..grid.total_cells() {
            let p = grid.point_at(index);
            let (x, z) = grid.center_xz(p);
            match surface.sample(x, z).filter(|h| h.is_finite()) {
                Some(h) => grid.cells_mut()[index].height = h,
                None => {
                    grid.reset();
                    return Err(NavigationError::InvalidSurface(
                        "Height sample failed or was not finite",
                    ));
                }
            }
        }

        grid.mark_built();
        let blocked = grid.apply_slope_filter(self.config.max_climb, self.config.max_slope);
        debug!(
            width = grid.width(),
            height = grid.height(),
            blocked,
            "Built navigation grid from terrain"
        );
        Ok(())
    }

    /// Builds over the bounding box of `vertices`, rasterizes every triangle
    /// onto the cells whose centers it covers, then runs the slope filter.
    ///
    /// `vertices` holds three floats per vertex and `indices` three entries
    /// per triangle. Where triangles overlap, the highest surface wins. Cells
    /// no triangle touches keep the flat-build defaults.
    pub fn build_from_geometry(
        &self,
        grid: &mut Grid,
        vertices: &[f32],
        indices: &[u32],
    ) -> Result<(), NavigationError> {
        grid.reset();
        self.config.validate()?;
        let positions = parse_vertices(vertices)?;
        validate_indices(indices, positions.len())?;

        let bounds = positions.iter().fold(
            WorldBounds::new(f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
            |b, v| WorldBounds::new(b.min_x.min(v.x), b.min_z.min(v.z), b.max_x.max(v.x), b.max_z.max(v.z)),
        );
        self.allocate(grid, bounds)?;

        let mut touched = vec![false; grid.total_cells()];
        let mut degenerate = 0usize;
        for (tri_index, tri) in indices.chunks_exact(3).enumerate() {
            let verts = [
                positions[tri[0] as usize],
                positions[tri[1] as usize],
                positions[tri[2] as usize],
            ];
            if !rasterize_triangle(grid, &mut touched, &verts) {
                trace!(tri_index, "Skipped degenerate triangle");
                degenerate += 1;
            }
        }

        grid.mark_built();
        let blocked = grid.apply_slope_filter(self.config.max_climb, self.config.max_slope);
        debug!(
            width = grid.width(),
            height = grid.height(),
            triangles = indices.len() / 3,
            degenerate,
            covered = touched.iter().filter(|&&t| t).count(),
            blocked,
            "Built navigation grid from geometry"
        );
        Ok(())
    }

    fn allocate(&self, grid: &mut Grid, bounds: WorldBounds) -> Result<(), NavigationError> {
        if !bounds.is_valid() {
            return Err(NavigationError::InvalidBounds(
                "Max corner must lie beyond min corner on both axes",
            ));
        }
        let cell_size = self.config.cell_size;
        let width = cells_along(bounds.width(), cell_size)?;
        let height = cells_along(bounds.depth(), cell_size)?;
        grid.allocate(width, height, cell_size, bounds.min_x, bounds.min_z)
    }
}

/// `ceil(extent / cell_size)`, at least one.
fn cells_along(extent: f32, cell_size: f32) -> Result<usize, NavigationError> {
    let ratio = extent / cell_size;
    let count = (ratio - ratio * CELL_COUNT_SLACK).ceil();
    if !count.is_finite() || count > u32::MAX as f32 {
        return Err(NavigationError::InvalidDimensions(
            "Cell count along an axis is too large",
        ));
    }
    Ok((count as usize).max(1))
}

fn parse_vertices(vertices: &[f32]) -> Result<Vec<Point3<f32>>, NavigationError> {
    if vertices.is_empty() {
        return Err(NavigationError::InvalidGeometry("Vertex buffer is empty"));
    }
    if vertices.len() % 3 != 0 {
        return Err(NavigationError::InvalidGeometry(
            "Vertex buffer length must be a multiple of 3",
        ));
    }
    if vertices.iter().any(|v| !v.is_finite()) {
        return Err(NavigationError::InvalidGeometry(
            "Vertex positions must be finite",
        ));
    }
    Ok(vertices
        .chunks_exact(3)
        .map(|v| Point3::new(v[0], v[1], v[2]))
        .collect())
}

fn validate_indices(indices: &[u32], vertex_count: usize) -> Result<(), NavigationError> {
    if indices.is_empty() {
        return Err(NavigationError::InvalidGeometry("Index buffer is empty"));
    }
    if indices.len() % 3 != 0 {
        return Err(NavigationError::InvalidGeometry(
            "Index count must be a multiple of 3",
        ));
    }
    if indices.iter().any(|&i| i as usize >= vertex_count) {
        return Err(NavigationError::InvalidGeometry(
            "Index refers past the end of the vertex buffer",
        ));
    }
    Ok(())
}

/// Twice the signed area of `(a, b, p)` projected onto the XZ plane.
fn edge_xz(a: &Point3<f32>, b: &Point3<f32>, p_x: f32, p_z: f32) -> f32 {
    (b.x - a.x) * (p_z - a.z) - (b.z - a.z) * (p_x - a.x)
}

/// Writes the triangle's interpolated height into every cell whose center
/// falls inside its XZ projection, keeping the higher value where a cell was
/// already covered. Returns false for a degenerate (zero-area) triangle.
fn rasterize_triangle(grid: &mut Grid, touched: &mut [bool], verts: &[Point3<f32>; 3]) -> bool {
    let [a, b, c] = verts;
    let area = edge_xz(a, b, c.x, c.z);
    // Degeneracy is judged against the triangle's own scale
    let longest_sq = [(a, b), (b, c), (c, a)]
        .iter()
        .map(|(p, q)| (q.x - p.x).powi(2) + (q.z - p.z).powi(2))
        .fold(0.0f32, f32::max);
    if !area.is_finite() || area.abs() <= f32::EPSILON * longest_sq {
        return false;
    }

    let (origin_x, origin_z) = grid.origin();
    let cell_size = grid.cell_size();
    let min_x = a.x.min(b.x).min(c.x);
    let max_x = a.x.max(b.x).max(c.x);
    let min_z = a.z.min(b.z).min(c.z);
    let max_z = a.z.max(b.z).max(c.z);

    // Cells whose centers lie within the triangle's bounding box
    let first = |v: f32, origin: f32| ((v - origin) / cell_size - 0.5).ceil().max(0.0) as usize;
    let last = |v: f32, origin: f32, count: usize| {
        let i = ((v - origin) / cell_size - 0.5).floor();
        if i < 0.0 { None } else { Some((i as usize).min(count - 1)) }
    };
    let (Some(x_end), Some(z_end)) = (
        last(max_x, origin_x, grid.width()),
        last(max_z, origin_z, grid.height()),
    ) else {
        return true;
    };
    let (x_start, z_start) = (first(min_x, origin_x), first(min_z, origin_z));

    for z in z_start..=z_end {
        for x in x_start..=x_end {
            let p = GridPoint::new(x, z);
            let (px, pz) = grid.center_xz(p);
            let w_a = edge_xz(b, c, px, pz) / area;
            let w_b = edge_xz(c, a, px, pz) / area;
            let w_c = 1.0 - w_a - w_b;
            if w_a < -BARYCENTRIC_EPSILON || w_b < -BARYCENTRIC_EPSILON || w_c < -BARYCENTRIC_EPSILON {
                continue;
            }

            let y = w_a * a.y + w_b * b.y + w_c * c.y;
            let index = grid.index(p);
            let Some(cell) = grid.cell_mut(p) else { continue };
            if !touched[index] || y > cell.height {
                cell.height = y;
            }
            cell.walkable = true;
            touched[index] = true;
        }
    }
    true
}
