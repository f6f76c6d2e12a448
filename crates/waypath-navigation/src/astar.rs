use crate::map::{Grid, GridPoint};
use nalgebra::Point3;
use tracing::debug;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f32::consts::SQRT_2;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Neighbour offsets with their base step cost: 4 orthogonal, then 4 diagonal.
const NEIGHBOURS: [(isize, isize, f32); 8] = [
    (1, 0, 1.0),
    (-1, 0, 1.0),
    (0, 1, 1.0),
    (0, -1, 1.0),
    (1, 1, SQRT_2),
    (1, -1, SQRT_2),
    (-1, 1, SQRT_2),
    (-1, -1, SQRT_2),
];

const NO_PARENT: usize = usize::MAX;

/// Ordered world-space waypoints, one per cell center, ending at the goal cell.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Path {
    waypoints: Vec<Point3<f32>>,
}

impl Path {
    /// Wraps an explicit waypoint list.
    pub fn new(waypoints: Vec<Point3<f32>>) -> Self {
        Self { waypoints }
    }

    pub fn waypoints(&self) -> &[Point3<f32>] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Gets the final waypoint.
    pub fn last(&self) -> Option<&Point3<f32>> {
        self.waypoints.last()
    }

    /// Length of the polyline through all waypoints, in world units.
    pub fn length(&self) -> f32 {
        self.segments().map(|(a, b)| (b - a).norm()).sum()
    }

    /// Consecutive waypoint pairs, e.g. for drawing debug lines.
    pub fn segments(&self) -> impl Iterator<Item = (&Point3<f32>, &Point3<f32>)> + '_ {
        self.waypoints.windows(2).map(|w| (&w[0], &w[1]))
    }
}

impl IntoIterator for Path {
    type Item = Point3<f32>;
    type IntoIter = std::vec::IntoIter<Point3<f32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.waypoints.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Point3<f32>;
    type IntoIter = std::slice::Iter<'a, Point3<f32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.waypoints.iter()
    }
}

/// Represents the result of an A* search with metadata.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathResult {
    /// The computed path, if one was found.
    pub path: Option<Path>,
    /// Summed step costs along the path, in cell units.
    pub total_cost: Option<f32>,
    /// The number of nodes expanded during the search.
    pub nodes_explored: usize,
    /// The number of waypoints in the path.
    pub path_length: usize,
}

impl PathResult {
    /// Creates a new PathResult for a successful search.
    pub fn success(path: Path, total_cost: f32, nodes_explored: usize) -> Self {
        let path_length = path.len();
        Self {
            path: Some(path),
            total_cost: Some(total_cost),
            nodes_explored,
            path_length,
        }
    }

    /// Creates a new PathResult for a failed search.
    pub fn failure(nodes_explored: usize) -> Self {
        Self {
            path: None,
            total_cost: None,
            nodes_explored,
            path_length: 0,
        }
    }

    /// Returns true if a path was found.
    pub fn is_success(&self) -> bool {
        self.path.is_some()
    }

    /// Returns the path if one was found.
    pub fn into_path(self) -> Option<Path> {
        self.path
    }
}

impl fmt::Display for PathResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(_) => write!(
                f,
                "PathResult {{ success: true, path_length: {}, total_cost: {:.3}, nodes_explored: {} }}",
                self.path_length,
                self.total_cost.unwrap_or(0.0),
                self.nodes_explored
            ),
            None => write!(
                f,
                "PathResult {{ success: false, nodes_explored: {} }}",
                self.nodes_explored
            ),
        }
    }
}

/// Octile distance between two cells, in cell units.
pub fn octile_distance(a: GridPoint, b: GridPoint) -> f32 {
    let dx = a.x.abs_diff(b.x) as f32;
    let dz = a.z.abs_diff(b.z) as f32;
    dx.max(dz) + (SQRT_2 - 1.0) * dx.min(dz)
}

#[derive(Copy, Clone, Debug)]
struct State {
    f: f32,
    g: f32,
    index: usize,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on f; on ties prefer the deeper node (larger g), then the
        // lower index so expansion order is deterministic.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| self.g.total_cmp(&other.g))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

/// Per-cell search record. Only meaningful when `generation` matches the
/// arena's current generation; anything else reads as unvisited.
#[derive(Copy, Clone, Debug, Default)]
struct Node {
    g: f32,
    parent: usize,
    generation: u32,
    closed: bool,
}

/// Search scratch space sized to the grid and reused between searches.
#[derive(Debug, Default)]
struct SearchArena {
    nodes: Vec<Node>,
    generation: u32,
    open: BinaryHeap<State>,
}

impl SearchArena {
    fn prepare(&mut self, total_cells: usize) {
        if self.nodes.len() != total_cells {
            self.nodes = vec![Node::default(); total_cells];
            self.generation = 0;
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            // Wrapped: stale stamps could alias the new generation
            self.nodes.fill(Node::default());
            self.generation = 1;
        }
        self.open.clear();
    }

    fn visited(&self, index: usize) -> Option<&Node> {
        let node = &self.nodes[index];
        (node.generation == self.generation).then_some(node)
    }

    fn open_node(&mut self, index: usize, g: f32, parent: usize) {
        self.nodes[index] = Node {
            g,
            parent,
            generation: self.generation,
            closed: false,
        };
    }
}

/// A* search over the 8-connected cells of a built [`Grid`].
///
/// Holds scratch buffers between calls, so reusing one finder for many
/// searches avoids reallocating per request. The grid is only read.
#[derive(Debug)]
pub struct PathFinder<'g> {
    grid: &'g Grid,
    arena: SearchArena,
}

impl<'g> PathFinder<'g> {
    pub fn new(grid: &'g Grid) -> Self {
        Self {
            grid,
            arena: SearchArena::default(),
        }
    }

    /// Gets the grid this finder searches.
    pub fn grid(&self) -> &'g Grid {
        self.grid
    }

    /// Finds a path between two world positions.
    ///
    /// # Returns
    /// * `Option<Path>` - The waypoints if a path exists, `None` otherwise.
    pub fn find_path(&mut self, start: &Point3<f32>, goal: &Point3<f32>) -> Option<Path> {
        self.find_path_detailed(start, goal).into_path()
    }

    /// Finds a path between two world positions with detailed results.
    ///
    /// Fails when the grid is unbuilt, either position lies outside it or in
    /// an unwalkable cell, or the goal is unreachable. The start cell is not
    /// part of the returned path; the goal cell center is its last waypoint.
    /// When both positions fall in the same cell the path is that single
    /// cell center.
    pub fn find_path_detailed(&mut self, start: &Point3<f32>, goal: &Point3<f32>) -> PathResult {
        let grid = self.grid;
        let endpoints = grid
            .world_to_cell(start)
            .zip(grid.world_to_cell(goal))
            .filter(|&(s, g)| grid.is_cell_walkable(s) && grid.is_cell_walkable(g));
        let Some((start_cell, goal_cell)) = endpoints else {
            debug!(?start, ?goal, "Path request rejected: endpoint off grid or blocked");
            return PathResult::failure(0);
        };

        if start_cell == goal_cell {
            return match grid.cell_to_world(goal_cell) {
                Some(center) => PathResult::success(Path::new(vec![center]), 0.0, 1),
                None => PathResult::failure(0),
            };
        }

        let result = self.search(start_cell, goal_cell);
        debug!(
            start = ?start_cell,
            goal = ?goal_cell,
            success = result.is_success(),
            path_length = result.path_length,
            nodes_explored = result.nodes_explored,
            "A* search finished"
        );
        result
    }

    fn search(&mut self, start: GridPoint, goal: GridPoint) -> PathResult {
        let grid = self.grid;
        let (width, height) = (grid.width() as isize, grid.height() as isize);
        let cells = grid.cells();
        let walkable = |x: isize, z: isize| {
            x >= 0 && z >= 0 && x < width && z < height && cells[(z * width + x) as usize].walkable
        };
        // Stays admissible when discounted cells exist
        let h_scale = grid.min_cost_multiplier().min(1.0);
        let heuristic = |p: GridPoint| octile_distance(p, goal) * h_scale;

        let arena = &mut self.arena;
        arena.prepare(cells.len());
        let start_index = grid.index(start);
        let goal_index = grid.index(goal);
        arena.open_node(start_index, 0.0, NO_PARENT);
        arena.open.push(State {
            f: heuristic(start),
            g: 0.0,
            index: start_index,
        });

        let mut nodes_explored = 0;
        while let Some(State { g, index, .. }) = arena.open.pop() {
            let node = arena.nodes[index];
            if node.closed || g > node.g {
                continue;
            }
            arena.nodes[index].closed = true;
            nodes_explored += 1;

            if index == goal_index {
                let path = reconstruct_path(grid, &arena.nodes, start_index, goal_index);
                return PathResult::success(path, g, nodes_explored);
            }

            let p = grid.point_at(index);
            let (x, z) = (p.x as isize, p.z as isize);
            for &(dx, dz, base_cost) in &NEIGHBOURS {
                let (nx, nz) = (x + dx, z + dz);
                if !walkable(nx, nz) {
                    continue;
                }
                // No squeezing between two blocked corners
                if dx != 0 && dz != 0 && !walkable(x + dx, z) && !walkable(x, z + dz) {
                    continue;
                }

                let neighbour_index = (nz * width + nx) as usize;
                let tentative_g = g + base_cost * cells[neighbour_index].cost_multiplier;
                let improves = match arena.visited(neighbour_index) {
                    Some(n) => !n.closed && tentative_g < n.g,
                    None => true,
                };
                if improves {
                    arena.open_node(neighbour_index, tentative_g, index);
                    let neighbour = GridPoint::new(nx as usize, nz as usize);
                    arena.open.push(State {
                        f: tentative_g + heuristic(neighbour),
                        g: tentative_g,
                        index: neighbour_index,
                    });
                }
            }
        }

        PathResult::failure(nodes_explored)
    }
}

/// Walks parent links back from the goal and returns the cell centers in
/// travel order, excluding the start cell.
fn reconstruct_path(grid: &Grid, nodes: &[Node], start: usize, goal: usize) -> Path {
    let mut waypoints = Vec::new();
    let mut current = goal;
    while current != start && current != NO_PARENT {
        if let Some(center) = grid.cell_to_world(grid.point_at(current)) {
            waypoints.push(center);
        }
        current = nodes[current].parent;
    }
    waypoints.reverse();
    Path::new(waypoints)
}

/// Finds a path with a throwaway [`PathFinder`].
pub fn find_path(grid: &Grid, start: &Point3<f32>, goal: &Point3<f32>) -> Option<Path> {
    PathFinder::new(grid).find_path(start, goal)
}
