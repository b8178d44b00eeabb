//! A* pathfinding over packed 2D occupancy grids for mobile robots.
//!
//! [`PathSearch`] runs over a [`GridMap`] with two array-backed min-heaps and hands its
//! predecessor links to [`PathReconstructor`]. Diagnostics go to an injectable [`LogSink`].

pub mod astar;
pub mod config;
pub mod error;
pub mod heap;
pub mod log;
pub mod map;
pub mod reconstruct;

pub use astar::{PathResult, PathSearch, SearchState, find_path, find_path_detailed};
pub use config::{DiagonalCost, SearchConfig};
pub use error::PathError;
pub use heap::{HeapKey, IndexedMinHeap};
pub use log::{LogRecord, LogSink, MemorySink, Severity, SharedSink, TracingSink};
pub use map::{Cell, GridMap, GridPoint};
pub use reconstruct::{PathReconstructor, PredecessorMap};

/// Creates a `width x height` grid with every cell free.
pub fn create_grid(width: u32, height: u32) -> Result<GridMap, PathError> {
    GridMap::new(width, height)
}

/// Marks cell `(x, y)` blocked or free. Out-of-bounds coordinates are logged and ignored.
pub fn toggle_tile(grid: &mut GridMap, x: u32, y: u32, blocked: bool) {
    grid.toggle(GridPoint::new(x, y), blocked);
}
