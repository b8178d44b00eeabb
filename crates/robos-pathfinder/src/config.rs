//! Search configuration: connectivity, step costs and the heuristic they imply.

use std::f64::consts::SQRT_2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::map::GridPoint;

/// How much a diagonal step costs relative to a cardinal one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DiagonalCost {
    /// `ceil(cardinal_cost * √2)`. Never below the true length, so the Euclidean
    /// heuristic stays admissible and closed cells are never re-opened.
    #[default]
    Euclidean,
    /// Same as a cardinal step. Diagonal detours look free, and the Euclidean heuristic
    /// may overestimate.
    Uniform,
}

/// A* settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchConfig {
    /// Enable 8-directional movement
    pub allow_diagonal: bool,
    /// Cost of one horizontal or vertical step.
    pub cardinal_cost: u16,
    /// Diagonal step pricing.
    pub diagonal: DiagonalCost,
}

impl Default for SearchConfig {
    fn default() -> Self {
        // 17/12 is within 0.2% of √2.
        Self {
            allow_diagonal: true,
            cardinal_cost: 12,
            diagonal: DiagonalCost::Euclidean,
        }
    }
}

impl SearchConfig {
    /// 4-connected search with otherwise default settings.
    pub fn four_connected() -> Self {
        Self {
            allow_diagonal: false,
            ..Default::default()
        }
    }

    /// Replaces the cardinal step cost.
    pub fn with_cardinal_cost(mut self, cost: u16) -> Self {
        self.cardinal_cost = cost;
        self
    }

    /// Replaces the diagonal pricing.
    pub fn with_diagonal(mut self, diagonal: DiagonalCost) -> Self {
        self.diagonal = diagonal;
        self
    }

    /// Rejects a zero step cost, which would make the heuristic useless.
    pub fn validate(&self) -> Result<(), PathError> {
        if self.cardinal_cost == 0 {
            return Err(PathError::InvalidConfig("Cardinal step cost must be positive"));
        }
        Ok(())
    }

    pub fn cardinal_step(&self) -> u32 {
        u32::from(self.cardinal_cost)
    }

    pub fn diagonal_step(&self) -> u32 {
        match self.diagonal {
            DiagonalCost::Euclidean => (f64::from(self.cardinal_cost) * SQRT_2).ceil() as u32,
            DiagonalCost::Uniform => self.cardinal_step(),
        }
    }

    /// Straight-line distance in cost units, rounded down.
    pub fn heuristic(&self, from: GridPoint, to: GridPoint) -> u32 {
        (from.euclidean_distance(&to) * f64::from(self.cardinal_cost)).floor() as u32
    }
}
