use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use robos_pathfinder::{GridPoint, SearchConfig};
use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Everything the planner front-end needs for one query.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub grid: GridSection,
    pub query: QuerySection,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridSection {
    pub width: u32,
    pub height: u32,
    /// Cells blocked up front, as `[x, y]` pairs.
    #[serde(default)]
    pub obstacles: Vec<[u32; 2]>,
    #[serde(default)]
    pub random_obstacles: Option<RandomObstacles>,
}

/// Scatters blocked cells over the grid with probability `density` each.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomObstacles {
    pub density: f64,
    /// Fixed seed for reproducible maps; drawn from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuerySection {
    pub start: [u32; 2],
    pub target: [u32; 2],
}

impl QuerySection {
    pub fn start(&self) -> GridPoint {
        GridPoint::new(self.start[0], self.start[1])
    }

    pub fn target(&self) -> GridPoint {
        GridPoint::new(self.target[0], self.target[1])
    }
}

/// Loads `path` as TOML, with `ROBOS__SECTION__KEY` environment variables on top.
pub fn load_config(path: &str) -> anyhow::Result<AppConfig> {
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix("ROBOS")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    let settings = match settings {
        Ok(config) => {
            info!("Successfully loaded configuration: {:?}", config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e).with_context(|| format!("Could not read {path}"));
        }
    };

    settings
        .try_deserialize()
        .with_context(|| format!("Invalid configuration in {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use robos_pathfinder::DiagonalCost;

    fn parse(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_full_config() {
        let app = parse(
            r#"
            [grid]
            width = 8
            height = 6
            obstacles = [[3, 0], [3, 1]]

            [grid.random_obstacles]
            density = 0.2
            seed = 11

            [query]
            start = [0, 0]
            target = [7, 5]

            [search]
            allow_diagonal = false
            cardinal_cost = 10
            diagonal = "uniform"
            "#,
        );

        assert_eq!(app.grid.width, 8);
        assert_eq!(app.grid.obstacles, vec![[3, 0], [3, 1]]);
        let random = app.grid.random_obstacles.unwrap();
        assert_eq!(random.seed, Some(11));
        assert_eq!(app.query.target(), GridPoint::new(7, 5));
        assert!(!app.search.allow_diagonal);
        assert_eq!(app.search.cardinal_cost, 10);
        assert_eq!(app.search.diagonal, DiagonalCost::Uniform);
    }

    #[test]
    fn test_search_section_defaults() {
        let app = parse(
            r#"
            [grid]
            width = 4
            height = 4

            [query]
            start = [0, 0]
            target = [3, 3]
            "#,
        );

        assert!(app.grid.obstacles.is_empty());
        assert!(app.grid.random_obstacles.is_none());
        assert_eq!(app.search, SearchConfig::default());
        assert_eq!(app.query.start(), GridPoint::new(0, 0));
    }
}
