//! Slope filtering: blocks cells whose step to a neighbour is too tall or too steep.

use tracing::debug;

use super::{Grid, GridPoint};

const ORTHOGONAL: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// True when a height difference of `diff` across one cell exceeds either
/// the climb or the slope tolerance.
pub(crate) fn exceeds_step(diff: f32, cell_size: f32, max_climb: f32, max_slope: f32) -> bool {
    if diff > max_climb {
        return true;
    }
    (diff / cell_size).atan().to_degrees() > max_slope
}

impl Grid {
    /// Marks unwalkable every walkable cell with an in-bounds orthogonal
    /// neighbour whose height differs by more than `max_climb`, or whose
    /// inferred slope `atan(diff / cell_size)` exceeds `max_slope` degrees.
    ///
    /// Decisions read only heights, so the outcome does not depend on scan
    /// order and both sides of a step are blocked. Returns the number of cells
    /// newly blocked; an unbuilt grid is left alone.
    pub fn apply_slope_filter(&mut self, max_climb: f32, max_slope: f32) -> usize {
        if !self.is_built() {
            return 0;
        }

        let (width, height) = (self.width() as isize, self.height() as isize);
        let cell_size = self.cell_size();
        let cells = self.cells();

        let blocked: Vec<usize> = (0..cells.len())
            .filter(|&index| {
                let cell = &cells[index];
                if !cell.walkable {
                    return false;
                }
                let p = self.point_at(index);
                ORTHOGONAL.iter().any(|&(dx, dz)| {
                    let nx = p.x as isize + dx;
                    let nz = p.z as isize + dz;
                    if nx < 0 || nz < 0 || nx >= width || nz >= height {
                        return false;
                    }
                    let neighbour = &cells[self.index(GridPoint::new(nx as usize, nz as usize))];
                    exceeds_step((neighbour.height - cell.height).abs(), cell_size, max_climb, max_slope)
                })
            })
            .collect();

        let cells = self.cells_mut();
        for &index in &blocked {
            cells[index].walkable = false;
        }

        debug!(blocked = blocked.len(), max_climb, max_slope, "Applied slope filter");
        blocked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::map::{FnSurface, GridBuilder, WorldBounds};

    /// A 4x1 strip with a single step of `rise` between cells 1 and 2.
    fn step_grid(rise: f32) -> Grid {
        let surface = FnSurface::new(WorldBounds::new(0.0, 0.0, 4.0, 1.0), move |x, _| {
            if x < 2.0 { 0.0 } else { rise }
        });
        // Permissive tolerances so the build itself blocks nothing
        let builder = GridBuilder::new(BuildConfig::new(1.0, 100.0, 90.0).unwrap());
        let mut grid = Grid::new();
        builder.build_from_terrain(&mut grid, &surface).unwrap();
        assert!(grid.cells().iter().all(|c| c.is_walkable()));
        grid
    }

    #[test]
    fn test_climb_threshold() {
        let mut grid = step_grid(0.3);
        assert_eq!(grid.apply_slope_filter(0.31, 90.0), 0);

        let mut grid = step_grid(0.3);
        assert_eq!(grid.apply_slope_filter(0.29, 90.0), 2);
        assert!(!grid.is_cell_walkable(GridPoint::new(1, 0)), "Lower side of the step is blocked");
        assert!(!grid.is_cell_walkable(GridPoint::new(2, 0)), "Upper side of the step is blocked");
        assert!(grid.is_cell_walkable(GridPoint::new(0, 0)));
        assert!(grid.is_cell_walkable(GridPoint::new(3, 0)));
    }

    #[test]
    fn test_slope_threshold() {
        // atan(0.3) is about 16.70 degrees
        let mut grid = step_grid(0.3);
        assert_eq!(grid.apply_slope_filter(1.0, 16.8), 0);

        let mut grid = step_grid(0.3);
        assert_eq!(grid.apply_slope_filter(1.0, 16.6), 2);
    }

    #[test]
    fn test_slope_uses_cell_size() {
        assert!(!exceeds_step(1.0, 2.0, 5.0, 30.0)); // atan(0.5) ~ 26.6
        assert!(exceeds_step(1.0, 1.0, 5.0, 30.0)); // atan(1.0) = 45
        assert!(exceeds_step(0.6, 10.0, 0.5, 90.0));
    }

    #[test]
    fn test_already_blocked_cells_not_counted() {
        let mut grid = step_grid(2.0);
        grid.set_cell_walkable(1, 0, false);
        assert_eq!(grid.apply_slope_filter(0.5, 45.0), 1);
        assert!(!grid.is_cell_walkable(GridPoint::new(2, 0)));
    }

    #[test]
    fn test_filter_on_unbuilt_grid_is_noop() {
        let mut grid = Grid::new();
        assert_eq!(grid.apply_slope_filter(0.0, 0.0), 0);
        assert!(!grid.is_built());
    }
}
