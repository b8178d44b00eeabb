//! This module defines the error types used by the `robos-pathfinder` crate.

#![warn(missing_docs)]

use thiserror::Error;

/// Error type for grid and pathfinding operations.
///
/// Bounds and capacity violations are normally recovered locally by the engine
/// (logged and dropped); the remaining variants are surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Coordinate outside the grid extents.
    #[error("Grid access out of bounds: {0}")]
    OutOfBounds(&'static str),
    /// Degenerate or impossible query, such as `start == target` or a blocked endpoint.
    #[error("Invalid path query: {0}")]
    InvalidInput(&'static str),
    /// Push onto a heap that already holds one entry per grid cell.
    #[error("Heap capacity exceeded: {0}")]
    CapacityExceeded(&'static str),
    /// Pop attempted on an empty heap.
    #[error("Heap is empty: {0}")]
    Empty(&'static str),
    /// The predecessor chain does not lead back to the start cell.
    #[error("Path reconstruction failed: {0}")]
    ReconstructionError(&'static str),
    /// The grid or the per-search structures could not be allocated.
    #[error("Allocation failed: {0}")]
    AllocationError(&'static str),
    /// Grid width or height is zero.
    #[error("Invalid grid dimensions: {0}")]
    InvalidDimensions(&'static str),
    /// Search configuration rejected.
    #[error("Invalid search configuration: {0}")]
    InvalidConfig(&'static str),
}
