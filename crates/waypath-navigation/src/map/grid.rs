//! Navigation grid: per-cell walkability, height and cost multiplier.
//!
//! The grid owns the mapping between world space and cell indices. It starts
//! out unbuilt; every query against an unbuilt grid fails conservatively
//! (`false` / `None`). Population happens through [`super::GridBuilder`].

#![warn(missing_docs)]

use nalgebra::Point3;
use tracing::warn;

use super::{GridPoint, WorldBounds};
use crate::error::NavigationError;

/// Multiplier of a cell that has not been penalised.
pub const DEFAULT_COST_MULTIPLIER: f32 = 1.0;

/// Upper bound on `width * height` accepted by a build.
pub const MAX_CELLS: usize = 1 << 25;

/// One discrete square of the navigation grid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub(crate) height: f32,
    pub(crate) walkable: bool,
    pub(crate) cost_multiplier: f32,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            height: 0.0,
            walkable: true,
            cost_multiplier: DEFAULT_COST_MULTIPLIER,
        }
    }
}

impl Cell {
    /// Representative elevation at the cell center.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Whether a search may enter this cell.
    pub fn is_walkable(&self) -> bool {
        self.walkable
    }

    /// Scale applied to the cost of stepping into this cell. Always `> 0`.
    pub fn cost_multiplier(&self) -> f32 {
        self.cost_multiplier
    }
}

/// Uniform 2D grid laid over the world's horizontal (X, Z) plane.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    /// Row-major cell storage, `width * height` entries
    cells: Vec<Cell>,
    /// Cell count along X
    width: usize,
    /// Cell count along Z
    height: usize,
    cell_size: f32,
    origin_x: f32,
    origin_z: f32,
    built: bool,
    /// Lower bound of every multiplier set since the last build
    min_cost_multiplier: f32,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Creates an empty, unbuilt grid.
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            width: 0,
            height: 0,
            cell_size: 1.0,
            origin_x: 0.0,
            origin_z: 0.0,
            built: false,
            min_cost_multiplier: DEFAULT_COST_MULTIPLIER,
        }
    }

    /// Drops all contents and returns to the unbuilt state.
    pub(crate) fn reset(&mut self) {
        self.cells.clear();
        self.width = 0;
        self.height = 0;
        self.built = false;
        self.min_cost_multiplier = DEFAULT_COST_MULTIPLIER;
    }

    /// Allocates a fresh cell array with every cell walkable, at height 0 and
    /// with the default cost. The grid stays unbuilt until [`Grid::mark_built`].
    pub(crate) fn allocate(
        &mut self,
        width: usize,
        height: usize,
        cell_size: f32,
        origin_x: f32,
        origin_z: f32,
    ) -> Result<(), NavigationError> {
        self.reset();

        if width == 0 || height == 0 {
            return Err(NavigationError::InvalidDimensions(
                "Width and height must be non-zero",
            ));
        }
        let total_cells = width
            .checked_mul(height)
            .ok_or(NavigationError::InvalidDimensions(
                "Grid dimensions too large, would cause overflow",
            ))?;
        if total_cells > MAX_CELLS {
            return Err(NavigationError::InvalidDimensions(
                "Grid exceeds the maximum cell count",
            ));
        }

        self.cells = vec![Cell::default(); total_cells];
        self.width = width;
        self.height = height;
        self.cell_size = cell_size;
        self.origin_x = origin_x;
        self.origin_z = origin_z;
        Ok(())
    }

    pub(crate) fn mark_built(&mut self) {
        self.built = true;
    }

    /// Whether the last build succeeded.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Cell count along X.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Cell count along Z.
    pub fn height(&self) -> usize {
        self.height
    }

    /// World-space edge length of a cell.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World-space `(x, z)` of the grid's minimum corner.
    pub fn origin(&self) -> (f32, f32) {
        (self.origin_x, self.origin_z)
    }

    /// World-space rectangle covered by the cells, or `None` when unbuilt.
    ///
    /// This can extend past the bounds the grid was built from, since the
    /// cell count is rounded up.
    pub fn world_bounds(&self) -> Option<WorldBounds> {
        if !self.built {
            return None;
        }
        Some(WorldBounds::new(
            self.origin_x,
            self.origin_z,
            self.origin_x + self.width as f32 * self.cell_size,
            self.origin_z + self.height as f32 * self.cell_size,
        ))
    }

    /// Calculates the index in the cell array for a given grid point.
    pub(crate) fn index(&self, p: GridPoint) -> usize {
        p.z * self.width + p.x
    }

    /// Inverse of [`Grid::index`].
    pub(crate) fn point_at(&self, index: usize) -> GridPoint {
        GridPoint::new(index % self.width, index / self.width)
    }

    /// True when `p` addresses a cell of a built grid.
    pub fn contains(&self, p: GridPoint) -> bool {
        self.built && p.x < self.width && p.z < self.height
    }

    /// Total number of cells.
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// Gets the cell at a grid coordinate position.
    pub fn cell(&self, p: GridPoint) -> Option<&Cell> {
        if self.contains(p) {
            Some(&self.cells[self.index(p)])
        } else {
            None
        }
    }

    /// Gets a mutable cell during population, before the grid is marked built.
    pub(crate) fn cell_mut(&mut self, p: GridPoint) -> Option<&mut Cell> {
        if p.x < self.width && p.z < self.height {
            let index = self.index(p);
            Some(&mut self.cells[index])
        } else {
            None
        }
    }

    /// Gets a reference to the underlying cell data.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Converts a world position to the cell that contains it.
    /// Returns None if the grid is unbuilt or the position lies outside it.
    ///
    /// The mapping is `floor((world - origin) / cell_size)`; a point exactly on
    /// the max boundary is considered outside.
    pub fn world_to_cell(&self, world_p: &Point3<f32>) -> Option<GridPoint> {
        if !self.built {
            return None;
        }
        let grid_x_f = (world_p.x - self.origin_x) / self.cell_size;
        let grid_z_f = (world_p.z - self.origin_z) / self.cell_size;

        // Also rejects NaN
        if !(grid_x_f >= 0.0 && grid_z_f >= 0.0)
            || grid_x_f >= self.width as f32
            || grid_z_f >= self.height as f32
        {
            return None;
        }

        let grid_x = grid_x_f.floor() as usize;
        let grid_z = grid_z_f.floor() as usize;
        if grid_x < self.width && grid_z < self.height {
            Some(GridPoint::new(grid_x, grid_z))
        } else {
            None
        }
    }

    /// Like [`Grid::world_to_cell`] but clamps to the grid edge instead of
    /// returning None. Still None for an unbuilt grid or a non-finite position.
    pub fn world_to_cell_clamped(&self, world_p: &Point3<f32>) -> Option<GridPoint> {
        if !self.built || !world_p.x.is_finite() || !world_p.z.is_finite() {
            return None;
        }
        let grid_x_f = ((world_p.x - self.origin_x) / self.cell_size).floor();
        let grid_z_f = ((world_p.z - self.origin_z) / self.cell_size).floor();
        let grid_x = grid_x_f.clamp(0.0, (self.width - 1) as f32) as usize;
        let grid_z = grid_z_f.clamp(0.0, (self.height - 1) as f32) as usize;
        Some(GridPoint::new(grid_x, grid_z))
    }

    /// Converts a cell to the world position of its center. The `y`
    /// component is the cell's stored height.
    pub fn cell_to_world(&self, p: GridPoint) -> Option<Point3<f32>> {
        self.cell(p).map(|cell| {
            let (x, z) = self.center_xz(p);
            Point3::new(x, cell.height, z)
        })
    }

    /// Horizontal center of a cell, without bounds checks.
    pub(crate) fn center_xz(&self, p: GridPoint) -> (f32, f32) {
        (
            self.origin_x + (p.x as f32 + 0.5) * self.cell_size,
            self.origin_z + (p.z as f32 + 0.5) * self.cell_size,
        )
    }

    /// Whether the cell at `p` may be entered. False out of bounds or unbuilt.
    pub fn is_cell_walkable(&self, p: GridPoint) -> bool {
        self.cell(p).is_some_and(|cell| cell.walkable)
    }

    /// Whether the cell containing a world position may be entered.
    pub fn is_walkable(&self, world_p: &Point3<f32>) -> bool {
        self.world_to_cell(world_p)
            .is_some_and(|p| self.is_cell_walkable(p))
    }

    /// Searches rings of growing Chebyshev radius around the cell containing
    /// `world_p` and returns the center of the first walkable cell found.
    ///
    /// Positions outside the grid start from the nearest edge cell. Within a
    /// ring, the cell whose center lies closest to `world_p` wins.
    pub fn find_nearest_walkable(&self, world_p: &Point3<f32>) -> Option<Point3<f32>> {
        let source = self.world_to_cell_clamped(world_p)?;
        let max_radius = self.width.max(self.height);

        for radius in 0..=max_radius {
            let mut best: Option<(f32, GridPoint)> = None;
            for p in self.ring(source, radius) {
                if !self.cells[self.index(p)].walkable {
                    continue;
                }
                let (cx, cz) = self.center_xz(p);
                let dist_sq = (cx - world_p.x).powi(2) + (cz - world_p.z).powi(2);
                if best.is_none_or(|(best_dist, _)| dist_sq < best_dist) {
                    best = Some((dist_sq, p));
                }
            }
            if let Some((_, p)) = best {
                return self.cell_to_world(p);
            }
        }
        None
    }

    /// In-bounds cells at exactly Chebyshev distance `radius` from `center`.
    fn ring(&self, center: GridPoint, radius: usize) -> impl Iterator<Item = GridPoint> + '_ {
        let r = radius as isize;
        let (cx, cz) = (center.x as isize, center.z as isize);
        let (w, h) = (self.width as isize, self.height as isize);

        (cz - r..=cz + r).flat_map(move |z| {
            // Interior rows only touch the two side columns
            let on_edge_row = z == cz - r || z == cz + r;
            let xs: Vec<isize> = if on_edge_row || r == 0 {
                (cx - r..=cx + r).collect()
            } else {
                vec![cx - r, cx + r]
            };
            xs.into_iter()
                .filter(move |&x| x >= 0 && x < w && z >= 0 && z < h)
                .map(move |x| GridPoint::new(x as usize, z as usize))
        })
    }

    /// Overrides the walkable flag of one cell. Out-of-range indices are ignored.
    pub fn set_cell_walkable(&mut self, cell_x: usize, cell_z: usize, walkable: bool) {
        let p = GridPoint::new(cell_x, cell_z);
        if self.contains(p) {
            let index = self.index(p);
            self.cells[index].walkable = walkable;
        }
    }

    /// Overrides the cost multiplier of one cell. Out-of-range indices are
    /// ignored, and so are multipliers that are not positive and finite.
    pub fn set_cell_cost(&mut self, cell_x: usize, cell_z: usize, multiplier: f32) {
        if !(multiplier > 0.0 && multiplier.is_finite()) {
            warn!(cell_x, cell_z, multiplier, "Rejected non-positive cost multiplier");
            return;
        }
        let p = GridPoint::new(cell_x, cell_z);
        if self.contains(p) {
            let index = self.index(p);
            self.cells[index].cost_multiplier = multiplier;
            self.min_cost_multiplier = self.min_cost_multiplier.min(multiplier);
        }
    }

    /// Conservative lower bound on the cost multiplier of any cell.
    pub(crate) fn min_cost_multiplier(&self) -> f32 {
        self.min_cost_multiplier
    }

    /// Per-cell `(cell, world center, walkable)` triples for a debug overlay.
    /// Empty for an unbuilt grid.
    pub fn walkable_overlay(&self) -> impl Iterator<Item = (GridPoint, Point3<f32>, bool)> + '_ {
        let count = if self.built { self.cells.len() } else { 0 };
        (0..count).map(move |index| {
            let p = self.point_at(index);
            let cell = &self.cells[index];
            let (x, z) = self.center_xz(p);
            (p, Point3::new(x, cell.height, z), cell.walkable)
        })
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.built {
            return writeln!(f, "Grid (unbuilt)");
        }
        writeln!(
            f,
            "Grid ({}x{}, cell size: {:.3})",
            self.width, self.height, self.cell_size
        )?;
        writeln!(f, "Origin: ({:.3}, {:.3})", self.origin_x, self.origin_z)?;

        // '#' blocked, '.' normal, '~' penalised, '+' discounted
        for z_idx in 0..self.height {
            for x_idx in 0..self.width {
                let cell = &self.cells[self.index(GridPoint::new(x_idx, z_idx))];
                let glyph = if !cell.walkable {
                    '#'
                } else if cell.cost_multiplier > DEFAULT_COST_MULTIPLIER {
                    '~'
                } else if cell.cost_multiplier < DEFAULT_COST_MULTIPLIER {
                    '+'
                } else {
                    '.'
                };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::map::GridBuilder;

    fn flat_grid(width: f32, depth: f32, cell_size: f32) -> Grid {
        let mut grid = Grid::new();
        let builder = GridBuilder::new(BuildConfig::new(cell_size, 0.5, 45.0).unwrap());
        builder
            .build(&mut grid, WorldBounds::new(0.0, 0.0, width, depth))
            .unwrap();
        grid
    }

    #[test]
    fn test_unbuilt_grid_fails_safely() {
        let grid = Grid::new();
        let p = Point3::new(0.5, 0.0, 0.5);
        assert!(!grid.is_built());
        assert!(!grid.is_walkable(&p));
        assert!(grid.world_to_cell(&p).is_none());
        assert!(grid.cell_to_world(GridPoint::new(0, 0)).is_none());
        assert!(grid.find_nearest_walkable(&p).is_none());
        assert!(grid.world_bounds().is_none());
        assert_eq!(grid.walkable_overlay().count(), 0);
    }

    #[test]
    fn test_coordinate_conversion() {
        let mut grid = Grid::new();
        let builder = GridBuilder::new(BuildConfig::new(0.1, 0.5, 45.0).unwrap());
        builder
            .build(&mut grid, WorldBounds::new(-0.5, -0.5, 0.5, 0.5))
            .unwrap();

        // World (0.0, 0.0) should map to cell (5, 5)
        let cell = grid.world_to_cell(&Point3::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(cell, GridPoint::new(5, 5));

        // Cell (5, 5) center is (-0.5 + 5.5 * 0.1) = 0.05 on both axes
        let center = grid.cell_to_world(GridPoint::new(5, 5)).unwrap();
        assert!((center.x - 0.05).abs() < 1e-6);
        assert!((center.z - 0.05).abs() < 1e-6);

        // The minimum corner belongs to cell (0, 0)
        let corner = grid.world_to_cell(&Point3::new(-0.5, 0.0, -0.5)).unwrap();
        assert_eq!(corner, GridPoint::new(0, 0));

        // Exactly on the max boundary is out
        assert!(grid.world_to_cell(&Point3::new(0.5, 0.0, 0.5)).is_none());
        assert!(grid.world_to_cell(&Point3::new(-0.51, 0.0, 0.0)).is_none());
        assert!(grid.world_to_cell(&Point3::new(f32::NAN, 0.0, 0.0)).is_none());
        assert!(grid.cell_to_world(GridPoint::new(10, 10)).is_none());
    }

    #[test]
    fn test_cell_round_trip() {
        let mut grid = Grid::new();
        let builder = GridBuilder::new(BuildConfig::new(0.75, 0.5, 45.0).unwrap());
        builder
            .build(&mut grid, WorldBounds::new(-13.0, 7.0, 2.0, 19.5))
            .unwrap();

        for z in 0..grid.height() {
            for x in 0..grid.width() {
                let p = GridPoint::new(x, z);
                let world = grid.cell_to_world(p).unwrap();
                assert_eq!(grid.world_to_cell(&world), Some(p), "round trip failed for {:?}", p);
            }
        }
    }

    #[test]
    fn test_set_cell_walkable_and_cost() {
        let mut grid = flat_grid(5.0, 5.0, 1.0);
        grid.set_cell_walkable(2, 2, false);
        grid.set_cell_cost(1, 1, 4.0);

        assert!(!grid.is_cell_walkable(GridPoint::new(2, 2)));
        assert!(!grid.is_walkable(&Point3::new(2.5, 0.0, 2.5)));
        assert_eq!(grid.cell(GridPoint::new(1, 1)).unwrap().cost_multiplier(), 4.0);
        assert!(grid.is_built(), "Runtime edits must not invalidate the grid");
    }

    #[test]
    fn test_out_of_range_edits_are_ignored() {
        let mut grid = flat_grid(3.0, 3.0, 1.0);
        let before: Vec<Cell> = grid.cells().to_vec();
        grid.set_cell_walkable(3, 0, false);
        grid.set_cell_walkable(0, 99, false);
        grid.set_cell_cost(usize::MAX, 0, 5.0);
        assert_eq!(grid.cells(), &before[..]);
    }

    #[test]
    fn test_invalid_cost_multiplier_rejected() {
        let mut grid = flat_grid(3.0, 3.0, 1.0);
        grid.set_cell_cost(1, 1, 0.0);
        grid.set_cell_cost(1, 1, -2.0);
        grid.set_cell_cost(1, 1, f32::NAN);
        assert_eq!(grid.cell(GridPoint::new(1, 1)).unwrap().cost_multiplier(), 1.0);
        assert_eq!(grid.min_cost_multiplier(), 1.0);

        grid.set_cell_cost(1, 1, 0.25);
        assert_eq!(grid.min_cost_multiplier(), 0.25);
    }

    #[test]
    fn test_find_nearest_walkable() {
        let mut grid = flat_grid(7.0, 7.0, 1.0);
        // Block a 3x3 square around (3, 3)
        for z in 2..=4 {
            for x in 2..=4 {
                grid.set_cell_walkable(x, z, false);
            }
        }

        // Already walkable: returns own center
        let own = grid.find_nearest_walkable(&Point3::new(0.2, 0.0, 0.2)).unwrap();
        assert_eq!(grid.world_to_cell(&own), Some(GridPoint::new(0, 0)));

        // From the middle of the block, the nearest free cells are on ring 2
        let nearest = grid.find_nearest_walkable(&Point3::new(3.5, 0.0, 3.5)).unwrap();
        let cell = grid.world_to_cell(&nearest).unwrap();
        assert_eq!(cell.chebyshev_distance(&GridPoint::new(3, 3)), 2);
        assert!(grid.is_cell_walkable(cell));

        // Off-grid positions start from the nearest edge cell
        let clamped = grid.find_nearest_walkable(&Point3::new(-50.0, 0.0, 0.5)).unwrap();
        assert_eq!(grid.world_to_cell(&clamped), Some(GridPoint::new(0, 0)));
    }

    #[test]
    fn test_find_nearest_walkable_none_when_fully_blocked() {
        let mut grid = flat_grid(3.0, 3.0, 1.0);
        for z in 0..3 {
            for x in 0..3 {
                grid.set_cell_walkable(x, z, false);
            }
        }
        assert!(grid.find_nearest_walkable(&Point3::new(1.5, 0.0, 1.5)).is_none());
    }

    #[test]
    fn test_walkable_overlay_covers_every_cell() {
        let mut grid = flat_grid(4.0, 2.0, 1.0);
        grid.set_cell_walkable(3, 1, false);
        let overlay: Vec<_> = grid.walkable_overlay().collect();
        assert_eq!(overlay.len(), 8);
        let (p, center, walkable) = overlay[7];
        assert_eq!(p, GridPoint::new(3, 1));
        assert!((center.x - 3.5).abs() < 1e-6 && (center.z - 1.5).abs() < 1e-6);
        assert!(!walkable);
    }

    #[test]
    fn test_display() {
        let mut grid = flat_grid(3.0, 3.0, 1.0);
        grid.set_cell_walkable(1, 1, false);
        grid.set_cell_cost(0, 0, 3.0);

        let display_str = format!("{}", grid);
        assert!(display_str.contains("Grid (3x3"));
        assert!(display_str.contains(".#."));
        assert!(display_str.contains("~.."));
        assert_eq!(format!("{}", Grid::new()), "Grid (unbuilt)\n");
    }
}
