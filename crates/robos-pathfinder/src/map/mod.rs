//! Grid-related functionality for path planning.
//!
//! This module provides the packed occupancy grid the search runs on and the
//! integer cell coordinates used throughout the crate.

pub mod grid;
pub mod point;

pub use grid::{Cell, F_COST_INFINITE, G_COST_INFINITE, GridMap};
pub use point::GridPoint;
