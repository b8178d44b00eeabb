mod settings; // brings `settings.rs` in as `crate::settings`

use anyhow::{Context, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use robos_pathfinder::{GridMap, GridPoint, PathSearch};
use settings::{AppConfig, DEFAULT_CONFIG_PATH, RandomObstacles};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let app = settings::load_config(&path)?;

    let mut grid = build_grid(&app)?;
    let (start, target) = (app.query.start(), app.query.target());
    info!(%grid, %start, %target, "Planning route");

    let result = PathSearch::with_config(&mut grid, app.search)
        .context("Invalid search configuration")?
        .run(start, target)
        .with_context(|| format!("Query {start} -> {target} rejected"))?;

    info!("{}", result);
    match &result.path {
        Some(path) => println!("{}", grid.render_with_path(path)),
        None => {
            warn!("No route from {} to {}", start, target);
            println!("{}", grid.render_with_path(&[]));
        }
    }

    Ok(())
}

/// Allocates the grid and blocks the configured obstacles.
///
/// Random obstacles never land on the query endpoints.
fn build_grid(app: &AppConfig) -> anyhow::Result<GridMap> {
    let mut grid = GridMap::new(app.grid.width, app.grid.height)
        .with_context(|| format!("Cannot create a {}x{} grid", app.grid.width, app.grid.height))?;

    for [x, y] in &app.grid.obstacles {
        grid.toggle(GridPoint::new(*x, *y), true);
    }

    if let Some(random) = &app.grid.random_obstacles {
        scatter_obstacles(&mut grid, random, &[app.query.start(), app.query.target()])?;
    }

    Ok(grid)
}

fn scatter_obstacles(
    grid: &mut GridMap,
    random: &RandomObstacles,
    keep_free: &[GridPoint],
) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&random.density) {
        bail!("Obstacle density {} is outside [0, 1]", random.density);
    }

    let mut rng = match random.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let p = GridPoint::new(x, y);
            if !keep_free.contains(&p) && rng.random_bool(random.density) {
                grid.toggle(p, true);
            }
        }
    }

    info!(
        blocked = grid.blocked_count(),
        density = random.density,
        "Scattered random obstacles"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{GridSection, QuerySection};
    use robos_pathfinder::SearchConfig;

    fn app(random_obstacles: Option<RandomObstacles>) -> AppConfig {
        AppConfig {
            grid: GridSection {
                width: 6,
                height: 4,
                obstacles: vec![[2, 0], [2, 1], [9, 9]],
                random_obstacles,
            },
            query: QuerySection {
                start: [0, 0],
                target: [5, 3],
            },
            search: SearchConfig::default(),
        }
    }

    #[test]
    fn test_build_grid_with_listed_obstacles() {
        let grid = build_grid(&app(None)).unwrap();
        assert_eq!(grid.blocked_count(), 2);
        assert!(grid.is_blocked(GridPoint::new(2, 1)));
    }

    #[test]
    fn test_random_obstacles_spare_endpoints() {
        let random = RandomObstacles {
            density: 1.0,
            seed: Some(3),
        };
        let grid = build_grid(&app(Some(random))).unwrap();
        assert_eq!(grid.blocked_count(), 6 * 4 - 2);
        assert!(!grid.is_blocked(GridPoint::new(0, 0)));
        assert!(!grid.is_blocked(GridPoint::new(5, 3)));
    }

    #[test]
    fn test_seeded_obstacles_are_reproducible() {
        let random = RandomObstacles {
            density: 0.4,
            seed: Some(17),
        };
        let a = build_grid(&app(Some(random.clone()))).unwrap();
        let b = build_grid(&app(Some(random))).unwrap();
        assert_eq!(a.cells(), b.cells());
    }

    #[test]
    fn test_density_out_of_range() {
        let random = RandomObstacles {
            density: 1.5,
            seed: None,
        };
        assert!(build_grid(&app(Some(random))).is_err());
    }
}
