//! Headless scenario: agents cross the terrain and back, with a wall raised
//! between the two rounds.

use anyhow::Context;
use nalgebra::Point3;
use parking_lot::RwLock;
use spin_sleep::SpinSleeper;
use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use waypath_navigation::{AgentState, Grid, GridBuilder, NavAgent, Path, PathFinder};

use crate::config::{Settings, TerrainSource};
use crate::terrain;

/// The grid is shared by the planners; edits take the write lock between rounds.
pub type SharedGrid = Arc<RwLock<Grid>>;

struct Round {
    name: &'static str,
    requests: Vec<(Point3<f32>, Point3<f32>)>,
}

/// Runs both rounds and returns the agents as they finished.
pub async fn run(settings: Settings) -> anyhow::Result<Vec<NavAgent<'static>>> {
    let grid = build_grid(&settings).context("Failed to build navigation grid")?;
    let walkable = grid.cells().iter().filter(|c| c.is_walkable()).count();
    info!(
        width = grid.width(),
        height = grid.height(),
        walkable,
        blocked = grid.total_cells() - walkable,
        "Navigation grid ready"
    );
    debug!("\n{}", grid);
    let grid: SharedGrid = Arc::new(RwLock::new(grid));

    let (homes, targets) = agent_endpoints(&grid.read(), settings.demo.agents, settings.demo.extent);
    let mut agents = homes
        .iter()
        .map(|&home| NavAgent::new(settings.agent, home))
        .collect::<Result<Vec<_>, _>>()?;

    let outbound = Round {
        name: "outbound",
        requests: homes.iter().copied().zip(targets.iter().copied()).collect(),
    };
    agents = run_round(&grid, &settings, agents, outbound).await?;

    raise_wall(&mut grid.write());

    let inbound = Round {
        name: "inbound",
        requests: agents.iter().map(|a| a.position()).zip(homes.iter().copied()).collect(),
    };
    let agents = run_round(&grid, &settings, agents, inbound).await?;

    let arrived = agents.iter().filter(|a| a.state() == AgentState::Arrived).count();
    info!(arrived, agents = agents.len(), "Simulation finished");
    Ok(agents)
}

fn build_grid(settings: &Settings) -> anyhow::Result<Grid> {
    let builder = GridBuilder::new(settings.build);
    let surface = terrain::demo_surface(&settings.demo);
    let mut grid = Grid::new();

    match settings.demo.source {
        TerrainSource::Heightfield => builder.build_from_terrain(&mut grid, &surface)?,
        TerrainSource::Mesh => {
            let (vertices, indices) = terrain::triangulate(&surface, settings.build.cell_size)
                .context("Terrain could not be triangulated")?;
            info!(triangles = indices.len() / 3, "Triangulated demo terrain");
            builder.build_from_geometry(&mut grid, &vertices, &indices)?;
        }
    }
    Ok(grid)
}

/// Spreads agents on a circle and sends each to the opposite side. Both ends
/// are snapped to walkable cells.
fn agent_endpoints(grid: &Grid, count: usize, extent: f32) -> (Vec<Point3<f32>>, Vec<Point3<f32>>) {
    let radius = extent * 0.4;
    let snap = |angle: f32| {
        let p = Point3::new(radius * angle.cos(), 0.0, radius * angle.sin());
        grid.find_nearest_walkable(&p).unwrap_or(p)
    };
    (0..count)
        .map(|i| {
            let angle = TAU * i as f32 / count as f32;
            (snap(angle), snap(angle + TAU * 0.5))
        })
        .unzip()
}

/// Blocks a wall through the grid's middle row with a single gap, and makes
/// the cells around the gap expensive.
fn raise_wall(grid: &mut Grid) {
    let z = grid.height() / 2;
    let gap = grid.width() / 3;
    for x in 0..grid.width() {
        if x.abs_diff(gap) > 1 {
            grid.set_cell_walkable(x, z, false);
        }
    }
    for x in gap.saturating_sub(2)..=gap + 2 {
        grid.set_cell_cost(x, z.saturating_sub(1), 4.0);
        grid.set_cell_cost(x, z + 1, 4.0);
    }
    info!(row = z, gap, "Raised wall");
}

async fn run_round(
    grid: &SharedGrid,
    settings: &Settings,
    mut agents: Vec<NavAgent<'static>>,
    round: Round,
) -> anyhow::Result<Vec<NavAgent<'static>>> {
    info!(round = round.name, agents = agents.len(), "Planning round");
    let started = Instant::now();
    let paths = plan_paths(grid, &round.requests).await?;
    info!(round = round.name, elapsed = ?started.elapsed(), "Planning done");

    for (id, (agent, path)) in agents.iter_mut().zip(paths).enumerate() {
        match path {
            Some(path) => agent.follow_path(path),
            None => {
                warn!(agent = id, "No path, agent stays put");
                agent.stop();
            }
        }
    }

    let demo = settings.demo.clone();
    let agents = tokio::task::spawn_blocking(move || {
        let dt = 1.0 / demo.frame_rate;
        let sleeper = SpinSleeper::default();
        let frame = Duration::from_secs_f32(dt);
        let mut frames = 0;

        while frames < demo.max_frames && agents.iter().any(|a| a.state() == AgentState::Following) {
            for agent in agents.iter_mut() {
                agent.update(dt);
            }
            frames += 1;
            if demo.realtime {
                sleeper.sleep(frame);
            }
        }

        for (id, agent) in agents.iter().enumerate() {
            if agent.state() == AgentState::Following {
                warn!(agent = id, remaining = agent.remaining_distance(), pose = %agent.pose(), "Agent stuck after frame budget");
            }
        }
        info!(frames, simulated = ?Duration::from_secs_f32(frames as f32 * dt), "Round complete");
        agents
    })
    .await?;

    Ok(agents)
}

/// Plans every request on the blocking pool. Searches share the grid under
/// read locks. Both ends are snapped to walkable cells first, since earlier
/// edits may have blocked the cell an agent stands on or heads for.
async fn plan_paths(
    grid: &SharedGrid,
    requests: &[(Point3<f32>, Point3<f32>)],
) -> anyhow::Result<Vec<Option<Path>>> {
    let mut tasks = JoinSet::new();
    for (id, &(start, goal)) in requests.iter().enumerate() {
        let grid = Arc::clone(grid);
        tasks.spawn_blocking(move || {
            let grid = grid.read();
            let start = grid.find_nearest_walkable(&start).unwrap_or(start);
            let goal = grid.find_nearest_walkable(&goal).unwrap_or(goal);
            (id, PathFinder::new(&grid).find_path_detailed(&start, &goal))
        });
    }

    let mut paths = vec![None; requests.len()];
    while let Some(joined) = tasks.join_next().await {
        let (id, result) = joined?;
        debug!(agent = id, %result, "Path planned");
        paths[id] = result.into_path();
    }
    Ok(paths)
}
