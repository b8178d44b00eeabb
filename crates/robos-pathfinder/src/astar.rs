use crate::config::SearchConfig;
use crate::error::PathError;
use crate::heap::{HeapKey, IndexedMinHeap};
use crate::log::Severity;
use crate::map::{F_COST_INFINITE, G_COST_INFINITE, GridMap, GridPoint};
use crate::reconstruct::{PathReconstructor, PredecessorMap};

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const TAG: &str = "search";

const CARDINAL_MOVES: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
const DIAGONAL_MOVES: [(i32, i32); 4] = [(1, 1), (-1, 1), (-1, -1), (1, -1)];

/// Represents the result of an A* pathfinding operation with metadata.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathResult {
    /// The computed path, if one was found.
    pub path: Option<Vec<GridPoint>>,
    /// The total cost of the path, in step-cost units.
    pub total_cost: Option<u32>,
    /// The number of nodes expanded during the search.
    pub nodes_explored: usize,
    /// The length of the path (number of waypoints).
    pub path_length: usize,
}

impl PathResult {
    /// Creates a new PathResult for a successful path.
    pub fn success(path: Vec<GridPoint>, total_cost: u32, nodes_explored: usize) -> Self {
        let path_length = path.len();
        Self {
            path: Some(path),
            total_cost: Some(total_cost),
            nodes_explored,
            path_length,
        }
    }

    /// Creates a new PathResult for a failed path search.
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
    pub fn into_path(self) -> Option<Vec<GridPoint>> {
        self.path
    }
}

impl fmt::Display for PathResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(_) => write!(
                f,
                "PathResult {{ success: true, path_length: {}, total_cost: {}, nodes_explored: {} }}",
                self.path_length,
                self.total_cost.unwrap_or(0),
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

/// Lifecycle of a [`PathSearch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// No query in progress.
    Ready,
    /// Open set non-empty, target not reached yet.
    Running,
    /// Target popped from the open set; the route can be reconstructed.
    Succeeded,
    /// Open set exhausted without reaching the target.
    Failed,
}

/// A* search over a borrowed [`GridMap`].
///
/// The search writes `g_cost`/`f_cost` into the grid's cells and keeps two heaps of
/// coordinates: the open set ordered by `f_cost` and the closed set ordered by
/// `g_cost`. Both heaps and the predecessor links are allocated fresh by every
/// [`PathSearch::begin`], after the query has been validated.
pub struct PathSearch<'g> {
    grid: &'g mut GridMap,
    config: SearchConfig,
    state: SearchState,
    open: IndexedMinHeap,
    closed: IndexedMinHeap,
    predecessors: PredecessorMap,
    endpoints: Option<(GridPoint, GridPoint)>,
    nodes_explored: usize,
    /// Neighbours not queued because their cost did not fit the packed fields.
    range_drops: usize,
}

impl<'g> PathSearch<'g> {
    /// Creates a search with the default configuration.
    pub fn new(grid: &'g mut GridMap) -> Self {
        Self {
            grid,
            config: SearchConfig::default(),
            state: SearchState::Ready,
            open: IndexedMinHeap::unallocated(HeapKey::FCost),
            closed: IndexedMinHeap::unallocated(HeapKey::GCost),
            predecessors: PredecessorMap::unallocated(),
            endpoints: None,
            nodes_explored: 0,
            range_drops: 0,
        }
    }

    /// Creates a search with `config`, rejecting invalid step costs.
    pub fn with_config(grid: &'g mut GridMap, config: SearchConfig) -> Result<Self, PathError> {
        config.validate()?;
        let mut search = Self::new(grid);
        search.config = config;
        Ok(search)
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridMap {
        self.grid
    }

    pub fn open_set(&self) -> &IndexedMinHeap {
        &self.open
    }

    pub fn closed_set(&self) -> &IndexedMinHeap {
        &self.closed
    }

    pub fn predecessors(&self) -> &PredecessorMap {
        &self.predecessors
    }

    /// Nodes popped from the open set since the last `begin`.
    pub fn nodes_explored(&self) -> usize {
        self.nodes_explored
    }

    fn log(&self, severity: Severity, message: impl FnOnce() -> String) {
        let sink = self.grid.sink();
        if sink.enabled(severity) {
            sink.log(severity, TAG, &message());
        }
    }

    fn reject(&mut self, reason: &'static str) -> PathError {
        self.log(Severity::Error, || reason.to_string());
        self.release();
        PathError::InvalidInput(reason)
    }

    fn release(&mut self) {
        self.state = SearchState::Ready;
        self.open = IndexedMinHeap::unallocated(HeapKey::FCost);
        self.closed = IndexedMinHeap::unallocated(HeapKey::GCost);
        self.predecessors = PredecessorMap::unallocated();
        self.endpoints = None;
        self.nodes_explored = 0;
        self.range_drops = 0;
    }

    /// Validates the query and seeds the open set with `start`.
    ///
    /// Nothing is allocated when the query is rejected; the search is left `Ready`.
    pub fn begin(&mut self, start: GridPoint, target: GridPoint) -> Result<(), PathError> {
        if start == target {
            return Err(self.reject("Start and target are the same cell"));
        }
        if !self.grid.contains(start) || !self.grid.contains(target) {
            return Err(self.reject("Start or target lies outside the grid"));
        }
        if self.grid.is_blocked(start) || self.grid.is_blocked(target) {
            return Err(self.reject("Start or target cell is blocked"));
        }
        let h = self.config.heuristic(start, target);
        if h >= F_COST_INFINITE {
            return Err(self.reject("Target too far away for the packed cost range"));
        }

        self.release();
        let (open, closed, predecessors) = allocate_search_state(self.grid)
            .inspect_err(|e| self.log(Severity::Error, || e.to_string()))?;
        self.open = open;
        self.closed = closed;
        self.predecessors = predecessors;

        self.grid.reset_costs();
        self.grid.set_g_cost(start, 0);
        self.grid.set_f_cost(start, h);
        self.open.push(start, self.grid)?;

        self.endpoints = Some((start, target));
        self.state = SearchState::Running;
        self.log(Severity::Debug, || {
            format!("searching {start} -> {target}, initial f_cost {h}")
        });
        Ok(())
    }

    /// Expands one node. Returns the state after the step; does nothing unless `Running`.
    pub fn step(&mut self) -> SearchState {
        if self.state != SearchState::Running {
            return self.state;
        }
        let Some((_, target)) = self.endpoints else {
            self.state = SearchState::Failed;
            return self.state;
        };

        if self.open.is_empty() {
            if self.range_drops > 0 {
                self.log(Severity::Warning, || {
                    format!(
                        "open set exhausted after {} expansions with {} neighbours dropped for range",
                        self.nodes_explored, self.range_drops
                    )
                });
            } else {
                self.log(Severity::Debug, || {
                    format!(
                        "open set exhausted after {} expansions, {target} unreachable",
                        self.nodes_explored
                    )
                });
            }
            self.state = SearchState::Failed;
            return self.state;
        }

        let current = match self.open.pop_min(self.grid) {
            Ok(p) => p,
            Err(e) => {
                self.log(Severity::Warning, || e.to_string());
                self.state = SearchState::Failed;
                return self.state;
            }
        };
        self.nodes_explored += 1;

        if current == target {
            self.log(Severity::Debug, || {
                format!(
                    "reached {target} with g_cost {} after {} expansions",
                    self.grid.g_cost(target),
                    self.nodes_explored
                )
            });
            self.state = SearchState::Succeeded;
            return self.state;
        }

        if let Err(e) = self.closed.push(current, self.grid) {
            self.log(Severity::Warning, || format!("closing {current}: {e}"));
        }
        self.expand(current, target);
        self.state
    }

    fn expand(&mut self, current: GridPoint, target: GridPoint) {
        let current_g = self.grid.g_cost(current);
        self.log(Severity::Debug, || {
            format!(
                "expanding {current} g_cost {current_g} f_cost {}",
                self.grid.f_cost(current)
            )
        });

        let cardinal = self.config.cardinal_step();
        let diagonal = self.config.diagonal_step();
        let diagonal_moves: &[(i32, i32)] = if self.config.allow_diagonal {
            &DIAGONAL_MOVES
        } else {
            &[]
        };
        let moves = CARDINAL_MOVES
            .iter()
            .map(|&(dx, dy)| (dx, dy, cardinal))
            .chain(diagonal_moves.iter().map(|&(dx, dy)| (dx, dy, diagonal)));

        for (dx, dy, step_cost) in moves {
            let Some(neighbor) = current.offset(dx, dy) else {
                continue;
            };
            if !self.grid.contains(neighbor) || self.grid.is_blocked(neighbor) {
                continue;
            }

            let costs = current_g
                .checked_add(step_cost)
                .filter(|g| *g < G_COST_INFINITE)
                .and_then(|g| {
                    g.checked_add(self.config.heuristic(neighbor, target))
                        .filter(|f| *f < F_COST_INFINITE)
                        .map(|f| (g, f))
                });
            let Some((tentative_g, tentative_f)) = costs else {
                self.range_drops += 1;
                self.log(Severity::Warning, || {
                    format!("cost of {neighbor} via {current} exceeds the packed range, skipped")
                });
                continue;
            };

            // An existing entry with an equal or better f_cost already reaches the cell.
            let known_f = self.grid.f_cost(neighbor);
            let in_open = self.open.contains(neighbor);
            if in_open && known_f <= tentative_f {
                continue;
            }
            let in_closed = !in_open && self.closed.contains(neighbor);
            if in_closed && known_f <= tentative_f {
                continue;
            }

            // Must leave the closed heap before its key changes.
            if in_closed {
                self.closed.remove(neighbor, self.grid);
                self.log(Severity::Debug, || {
                    format!("re-opening {neighbor}: f_cost {known_f} -> {tentative_f}")
                });
            }

            self.grid.set_g_cost(neighbor, tentative_g);
            self.grid.set_f_cost(neighbor, tentative_f);
            self.predecessors.set(neighbor, current);

            if in_open {
                self.open.resift(neighbor, self.grid);
            } else if let Err(e) = self.open.push(neighbor, self.grid) {
                self.log(Severity::Warning, || format!("queueing {neighbor}: {e}"));
            }
        }
    }

    /// Route from start to target, both inclusive. Requires `Succeeded`.
    pub fn reconstruct(&self) -> Result<Vec<GridPoint>, PathError> {
        match (self.state, self.endpoints) {
            (SearchState::Succeeded, Some((start, target))) => {
                PathReconstructor::new(&self.predecessors, start).reconstruct(target)
            }
            _ => Err(PathError::ReconstructionError(
                "No successful search to reconstruct",
            )),
        }
    }

    /// Runs a complete query.
    ///
    /// # Returns
    /// * `Ok(PathResult)` - Successful or not; an unreachable target is not an error.
    /// * `Err(PathError)` - Invalid query, allocation failure, cost range overflow or a
    ///   broken predecessor chain.
    pub fn run(&mut self, start: GridPoint, target: GridPoint) -> Result<PathResult, PathError> {
        self.begin(start, target)?;
        while self.step() == SearchState::Running {}
        self.result()
    }

    /// Outcome of a finished search.
    ///
    /// # Returns
    /// * `Ok(PathResult)` - The route after `Succeeded`, or a failure after `Failed`.
    /// * `Err(PathError::CapacityExceeded)` - `Failed`, but neighbours were dropped because
    ///   their cost did not fit the packed fields, so the target may still be reachable.
    /// * `Err(PathError::ReconstructionError)` - No finished search, or a broken chain.
    pub fn result(&self) -> Result<PathResult, PathError> {
        match (self.state, self.endpoints) {
            (SearchState::Succeeded, Some((_, target))) => {
                let path = self.reconstruct().inspect_err(|e| {
                    self.log(Severity::Error, || e.to_string());
                })?;
                let total_cost = self.grid.g_cost(target);
                Ok(PathResult::success(path, total_cost, self.nodes_explored))
            }
            (SearchState::Failed, _) if self.range_drops > 0 => {
                Err(PathError::CapacityExceeded(
                    "Route cost exceeds the packed cost range",
                ))
            }
            (SearchState::Failed, _) => Ok(PathResult::failure(self.nodes_explored)),
            _ => Err(PathError::ReconstructionError(
                "No finished search to report",
            )),
        }
    }
}

fn allocate_search_state(
    grid: &GridMap,
) -> Result<(IndexedMinHeap, IndexedMinHeap, PredecessorMap), PathError> {
    Ok((
        IndexedMinHeap::for_grid(grid, HeapKey::FCost)?,
        IndexedMinHeap::for_grid(grid, HeapKey::GCost)?,
        PredecessorMap::for_grid(grid)?,
    ))
}

impl fmt::Debug for PathSearch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathSearch")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("endpoints", &self.endpoints)
            .field("open", &self.open.len())
            .field("closed", &self.closed.len())
            .field("nodes_explored", &self.nodes_explored)
            .field("range_drops", &self.range_drops)
            .finish()
    }
}

/// Finds a path from `start` to `target` with detailed results.
///
/// # Arguments
/// * `grid` - The grid to plan in. Its cost fields are overwritten by the search.
/// * `start` - Starting cell.
/// * `target` - Goal cell.
/// * `config` - Connectivity and step costs.
///
/// # Returns
/// * `Result<PathResult, PathError>` - Detailed pathfinding result with metadata.
pub fn find_path_detailed(
    grid: &mut GridMap,
    start: GridPoint,
    target: GridPoint,
    config: SearchConfig,
) -> Result<PathResult, PathError> {
    PathSearch::with_config(grid, config)?.run(start, target)
}

/// Finds a path between two cells with the default configuration.
///
/// # Returns
/// * `Ok(Some(path))` - Cells from start to target inclusive.
/// * `Ok(None)` - The target cannot be reached.
/// * `Err(PathError)` - The query itself is invalid, or the route cost outgrows the packed
///   cost fields.
pub fn find_path(
    grid: &mut GridMap,
    start_x: u32,
    start_y: u32,
    target_x: u32,
    target_y: u32,
) -> Result<Option<Vec<(u32, u32)>>, PathError> {
    let result = find_path_detailed(
        grid,
        GridPoint::new(start_x, start_y),
        GridPoint::new(target_x, target_y),
        SearchConfig::default(),
    )?;
    Ok(result
        .into_path()
        .map(|path| path.into_iter().map(<(u32, u32)>::from).collect()))
}
