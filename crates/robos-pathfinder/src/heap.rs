//! Array-backed binary min-heap over grid coordinates.
//!
//! The heap stores coordinates only. Their ordering key is read from the [`GridMap`]
//! at comparison time, so a cost written to the grid takes effect at the next sift of
//! that entry ([`IndexedMinHeap::resift`]).

#![warn(missing_docs)]

use crate::error::PathError;
use crate::map::{Cell, GridMap, GridPoint};

/// The packed cost field a heap is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapKey {
    /// `g_cost + heuristic`, used by the open set.
    FCost,
    /// Accumulated cost from the start, used by the closed set.
    GCost,
}

impl HeapKey {
    fn read(self, cell: Cell) -> u32 {
        match self {
            HeapKey::FCost => cell.f_cost(),
            HeapKey::GCost => cell.g_cost(),
        }
    }
}

/// Binary min-heap of grid coordinates with a fixed capacity.
///
/// Parent of index `i` is `(i - 1) / 2`; its children are `2i + 1` and `2i + 2`.
/// When both children carry the same cost, sift-down follows the left one.
#[derive(Debug, Clone)]
pub struct IndexedMinHeap {
    items: Vec<GridPoint>,
    capacity: usize,
    key: HeapKey,
}

impl IndexedMinHeap {
    /// A heap with no storage. Every push fails until it is replaced by an allocated heap.
    pub fn unallocated(key: HeapKey) -> Self {
        Self {
            items: Vec::new(),
            capacity: 0,
            key,
        }
    }

    /// Allocates room for `capacity` coordinates up front.
    pub fn with_capacity(capacity: usize, key: HeapKey) -> Result<Self, PathError> {
        let mut items = Vec::new();
        items
            .try_reserve_exact(capacity)
            .map_err(|_| PathError::AllocationError("Could not allocate heap storage"))?;
        Ok(Self {
            items,
            capacity,
            key,
        })
    }

    /// Allocates a heap that can hold every cell of `grid` once.
    pub fn for_grid(grid: &GridMap, key: HeapKey) -> Result<Self, PathError> {
        Self::with_capacity(grid.total_cells(), key)
    }

    /// Number of queued coordinates.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of coordinates the heap accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The cost field this heap is ordered by.
    pub fn key(&self) -> HeapKey {
        self.key
    }

    /// The backing array in heap order.
    pub fn as_slice(&self) -> &[GridPoint] {
        &self.items
    }

    /// The minimum entry, if any.
    pub fn peek(&self) -> Option<GridPoint> {
        self.items.first().copied()
    }

    /// Drops every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn cost_of(&self, grid: &GridMap, i: usize) -> u32 {
        grid.cell(self.items[i])
            .map(|c| self.key.read(c))
            .unwrap_or(u32::MAX)
    }

    /// Appends `p` and restores heap order. The caller keeps entries unique.
    ///
    /// # Returns
    /// * `Err(PathError::CapacityExceeded)` - The heap is full; `p` was not added.
    pub fn push(&mut self, p: GridPoint, grid: &GridMap) -> Result<(), PathError> {
        if self.items.len() >= self.capacity {
            return Err(PathError::CapacityExceeded(
                "Heap already holds one entry per grid cell",
            ));
        }
        self.items.push(p);
        self.sift_up(self.items.len() - 1, grid);
        Ok(())
    }

    /// Removes and returns the entry with the smallest key.
    ///
    /// # Returns
    /// * `Err(PathError::Empty)` - Nothing was queued.
    pub fn pop_min(&mut self, grid: &GridMap) -> Result<GridPoint, PathError> {
        if self.items.is_empty() {
            return Err(PathError::Empty("Pop from an empty heap"));
        }

        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let min = self.items.pop().ok_or(PathError::Empty("Pop from an empty heap"))?;
        if !self.items.is_empty() {
            self.sift_down(0, grid);
        }
        Ok(min)
    }

    /// Index of `p` in the backing array. Linear scan.
    pub fn position(&self, p: GridPoint) -> Option<usize> {
        self.items.iter().position(|q| *q == p)
    }

    /// Returns true if `p` is queued. Linear scan.
    pub fn contains(&self, p: GridPoint) -> bool {
        self.position(p).is_some()
    }

    /// Removes `p` wherever it sits. Returns false if it was not queued.
    pub fn remove(&mut self, p: GridPoint, grid: &GridMap) -> bool {
        let Some(i) = self.position(p) else {
            return false;
        };

        self.items.swap_remove(i);
        if i < self.items.len() {
            self.sift_down(i, grid);
            self.sift_up(i, grid);
        }
        true
    }

    /// Restores heap order around `p` after its key changed in the grid.
    /// Returns false if `p` was not queued.
    pub fn resift(&mut self, p: GridPoint, grid: &GridMap) -> bool {
        let Some(i) = self.position(p) else {
            return false;
        };

        self.sift_up(i, grid);
        // If nothing moved up the key may have grown instead.
        if self.items.get(i) == Some(&p) {
            self.sift_down(i, grid);
        }
        true
    }

    /// Moves the entry at `i` towards the root while it is cheaper than its parent.
    pub fn sift_up(&mut self, mut i: usize, grid: &GridMap) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.cost_of(grid, i) >= self.cost_of(grid, parent) {
                break;
            }
            self.items.swap(i, parent);
            i = parent;
        }
    }

    /// Moves the entry at `i` towards the leaves while a child is cheaper.
    pub fn sift_down(&mut self, mut i: usize, grid: &GridMap) {
        let len = self.items.len();
        loop {
            let left = 2 * i + 1;
            if left >= len {
                break;
            }
            let right = left + 1;

            let child = if right < len && self.cost_of(grid, right) < self.cost_of(grid, left) {
                right
            } else {
                left
            };

            if self.cost_of(grid, i) <= self.cost_of(grid, child) {
                break;
            }
            self.items.swap(i, child);
            i = child;
        }
    }

    /// Checks `cost(parent(i)) <= cost(i)` for every non-root index.
    pub fn is_heap(&self, grid: &GridMap) -> bool {
        (1..self.items.len()).all(|i| self.cost_of(grid, (i - 1) / 2) <= self.cost_of(grid, i))
    }
}
