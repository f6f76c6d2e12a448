use nalgebra::Point3;
use std::collections::HashSet;
use waypath_navigation::{BuildConfig, Grid, GridBuilder, GridPoint, PathFinder, WorldBounds};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("A* Navigation Grid Example");
    println!("==========================");

    // 0 = walkable, 1 = blocked, 2 = mud (costly)
    let layout = [
        [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        [0, 1, 1, 0, 0, 0, 0, 1, 1, 0],
        [0, 0, 0, 0, 1, 0, 0, 0, 0, 0],
        [0, 0, 1, 1, 1, 1, 0, 1, 0, 0],
        [0, 0, 0, 0, 0, 1, 0, 1, 0, 0],
        [0, 1, 1, 1, 0, 1, 2, 1, 1, 0],
        [0, 0, 0, 1, 0, 0, 2, 0, 0, 0],
        [0, 1, 0, 1, 0, 1, 1, 1, 0, 0],
        [0, 1, 0, 0, 0, 0, 0, 0, 1, 0],
        [0, 0, 0, 1, 1, 1, 0, 0, 0, 0],
    ];

    let mut grid = Grid::new();
    GridBuilder::new(BuildConfig::new(1.0, 0.5, 45.0)?)
        .build(&mut grid, WorldBounds::new(0.0, 0.0, 10.0, 10.0))?;
    for (z, row) in layout.iter().enumerate() {
        for (x, &kind) in row.iter().enumerate() {
            match kind {
                1 => grid.set_cell_walkable(x, z, false),
                2 => grid.set_cell_cost(x, z, 8.0),
                _ => {}
            }
        }
    }

    println!("\n{}", grid);

    let start = Point3::new(0.5, 0.0, 0.5);
    let goal = Point3::new(9.5, 0.0, 9.5);
    println!("Start: {}, Goal: {}", start, goal);

    let mut finder = PathFinder::new(&grid);
    let result = finder.find_path_detailed(&start, &goal);
    println!("\n{}", result);

    let Some(path) = result.path else {
        println!("\nNo path found.");
        return Ok(());
    };

    println!("\nPath waypoints (length {:.2}):", path.length());
    for (i, waypoint) in path.waypoints().iter().enumerate() {
        println!("  {}: ({:.1}, {:.1})", i, waypoint.x, waypoint.z);
    }

    let on_path: HashSet<GridPoint> = path
        .waypoints()
        .iter()
        .filter_map(|w| grid.world_to_cell(w))
        .collect();
    let start_cell = grid.world_to_cell(&start);
    let goal_cell = grid.world_to_cell(&goal);

    println!("\nGrid with path:");
    for z in 0..grid.height() {
        for x in 0..grid.width() {
            let p = GridPoint::new(x, z);
            let glyph = if Some(p) == start_cell {
                'S'
            } else if Some(p) == goal_cell {
                'G'
            } else if on_path.contains(&p) {
                '*'
            } else if !grid.is_cell_walkable(p) {
                'X'
            } else {
                '.'
            };
            print!("{} ", glyph);
        }
        println!();
    }

    Ok(())
}
