//! Predecessor links recorded during a search and the walk that turns them into a route.

use crate::error::PathError;
use crate::map::{GridMap, GridPoint};

/// For every reached cell, the neighbour that gave it its current best `g_cost`.
#[derive(Debug, Clone, Default)]
pub struct PredecessorMap {
    width: u32,
    links: Vec<Option<GridPoint>>,
}

impl PredecessorMap {
    /// A map with no storage.
    pub fn unallocated() -> Self {
        Self::default()
    }

    /// Allocates one empty link per cell of `grid`.
    pub fn for_grid(grid: &GridMap) -> Result<Self, PathError> {
        let mut links = Vec::new();
        links
            .try_reserve_exact(grid.total_cells())
            .map_err(|_| PathError::AllocationError("Could not allocate predecessor map"))?;
        links.resize(grid.total_cells(), None);
        Ok(Self {
            width: grid.width(),
            links,
        })
    }

    fn index(&self, p: GridPoint) -> Option<usize> {
        if p.x >= self.width {
            return None;
        }
        let i = p.y as usize * self.width as usize + p.x as usize;
        (i < self.links.len()).then_some(i)
    }

    /// The recorded predecessor of `p`.
    pub fn get(&self, p: GridPoint) -> Option<GridPoint> {
        self.index(p).and_then(|i| self.links[i])
    }

    /// Records `from` as the predecessor of `p`. Ignored if `p` is outside the map.
    pub fn set(&mut self, p: GridPoint, from: GridPoint) {
        if let Some(i) = self.index(p) {
            self.links[i] = Some(from);
        }
    }

    /// Number of cells covered, which also bounds the length of any valid chain.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of cells with a recorded predecessor.
    pub fn linked(&self) -> usize {
        self.links.iter().filter(|l| l.is_some()).count()
    }
}

/// Walks predecessor links from a target back to the start.
#[derive(Debug, Clone, Copy)]
pub struct PathReconstructor<'a> {
    predecessors: &'a PredecessorMap,
    start: GridPoint,
}

impl<'a> PathReconstructor<'a> {
    pub fn new(predecessors: &'a PredecessorMap, start: GridPoint) -> Self {
        Self {
            predecessors,
            start,
        }
    }

    /// Builds the route from the start to `target`, both inclusive.
    ///
    /// # Returns
    /// * `Err(PathError::ReconstructionError)` - The chain breaks off before the start, or
    ///   is longer than the grid has cells.
    pub fn reconstruct(&self, target: GridPoint) -> Result<Vec<GridPoint>, PathError> {
        let mut path = vec![target];
        let mut current = target;

        for _ in 0..self.predecessors.len() {
            if current == self.start {
                path.reverse();
                return Ok(path);
            }

            current = self.predecessors.get(current).ok_or(PathError::ReconstructionError(
                "Predecessor chain ends before reaching the start",
            ))?;
            path.push(current);
        }

        Err(PathError::ReconstructionError(
            "Predecessor chain does not terminate at the start",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemorySink;
    use std::sync::Arc;

    fn predecessors(width: u32, height: u32) -> PredecessorMap {
        let grid = GridMap::with_sink(width, height, Arc::new(MemorySink::new())).unwrap();
        PredecessorMap::for_grid(&grid).unwrap()
    }

    #[test]
    fn test_reconstruct_chain() {
        let mut links = predecessors(4, 4);
        let start = GridPoint::new(0, 0);
        let route = [start, GridPoint::new(1, 1), GridPoint::new(2, 1), GridPoint::new(3, 2)];
        for pair in route.windows(2) {
            links.set(pair[1], pair[0]);
        }
        assert_eq!(links.linked(), 3);

        let reconstructor = PathReconstructor::new(&links, start);
        let path = reconstructor.reconstruct(GridPoint::new(3, 2)).unwrap();
        assert_eq!(path, route.to_vec());

        // The same links can be walked again.
        assert_eq!(reconstructor.reconstruct(GridPoint::new(3, 2)).unwrap(), path);
        assert_eq!(
            reconstructor.reconstruct(GridPoint::new(1, 1)).unwrap(),
            route[..2].to_vec()
        );
    }

    #[test]
    fn test_broken_chain() {
        let mut links = predecessors(3, 3);
        links.set(GridPoint::new(2, 2), GridPoint::new(1, 1));

        let result = PathReconstructor::new(&links, GridPoint::new(0, 0)).reconstruct(GridPoint::new(2, 2));
        assert!(matches!(result, Err(PathError::ReconstructionError(_))));
    }

    #[test]
    fn test_cycle_terminates() {
        let mut links = predecessors(3, 3);
        let a = GridPoint::new(1, 1);
        let b = GridPoint::new(2, 1);
        links.set(a, b);
        links.set(b, a);

        let result = PathReconstructor::new(&links, GridPoint::new(0, 0)).reconstruct(a);
        assert!(matches!(result, Err(PathError::ReconstructionError(_))));
    }

    #[test]
    fn test_out_of_range_links_ignored() {
        let mut links = predecessors(2, 2);
        links.set(GridPoint::new(5, 0), GridPoint::new(0, 0));
        links.set(GridPoint::new(0, 9), GridPoint::new(0, 0));
        assert_eq!(links.linked(), 0);
        assert_eq!(links.get(GridPoint::new(5, 0)), None);
        assert!(PredecessorMap::unallocated().is_empty());
    }
}
