//! Occupancy grid with per-cell search costs.
//!
//! Every cell is one packed 64-bit word:
//!
//! | bits    | field                                        |
//! |---------|----------------------------------------------|
//! | 0       | enabled flag (1 = free, 0 = blocked)         |
//! | 1..=31  | `g_cost`, `0x7FFF_FFFF` means unvisited      |
//! | 32..=63 | `f_cost`, `0xFFFF_FFFF` means unvisited      |
//!
//! Cells are stored row-major and addressed as `y * width + x` after checking each
//! axis against its own extent.

#![warn(missing_docs)]

use std::fmt;
use std::sync::Arc;

use crate::error::PathError;
use crate::log::{LogSink, Severity, SharedSink, TracingSink};
use crate::map::GridPoint;

const ENABLED_BIT: u64 = 0x0000_0000_0000_0001;
const G_COST_SHIFT: u32 = 1;
const G_COST_MASK: u64 = 0x0000_0000_FFFF_FFFE;
const F_COST_SHIFT: u32 = 32;
const F_COST_MASK: u64 = 0xFFFF_FFFF_0000_0000;

/// Sentinel `g_cost` of a cell that has not been reached. Also the largest storable value.
pub const G_COST_INFINITE: u32 = 0x7FFF_FFFF;
/// Sentinel `f_cost` of a cell that has not been reached.
pub const F_COST_INFINITE: u32 = 0xFFFF_FFFF;

const TAG: &str = "grid";

/// A single packed grid cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell(u64);

impl Cell {
    /// Free cell with both costs at their infinite sentinels.
    pub const FREE: Cell = Cell(F_COST_MASK | G_COST_MASK | ENABLED_BIT);
    /// Blocked cell with both costs at their infinite sentinels.
    pub const BLOCKED: Cell = Cell(F_COST_MASK | G_COST_MASK);

    /// Reinterprets a raw packed word.
    pub const fn from_bits(bits: u64) -> Self {
        Cell(bits)
    }

    /// The raw packed word.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns true if the enabled bit is clear.
    pub const fn is_blocked(self) -> bool {
        self.0 & ENABLED_BIT == 0
    }

    /// Returns the cell with the enabled bit cleared (`blocked`) or set.
    pub const fn with_blocked(self, blocked: bool) -> Self {
        if blocked {
            Cell(self.0 & !ENABLED_BIT)
        } else {
            Cell(self.0 | ENABLED_BIT)
        }
    }

    /// Accumulated cost from the start.
    pub const fn g_cost(self) -> u32 {
        ((self.0 & G_COST_MASK) >> G_COST_SHIFT) as u32
    }

    /// Returns the cell with `g_cost` replaced. Values above the 31-bit field saturate to
    /// [`G_COST_INFINITE`].
    pub fn with_g_cost(self, g_cost: u32) -> Self {
        let g = u64::from(g_cost.min(G_COST_INFINITE));
        Cell((self.0 & !G_COST_MASK) | (g << G_COST_SHIFT))
    }

    /// Estimated total cost through this cell.
    pub const fn f_cost(self) -> u32 {
        ((self.0 & F_COST_MASK) >> F_COST_SHIFT) as u32
    }

    /// Returns the cell with `f_cost` replaced.
    pub fn with_f_cost(self, f_cost: u32) -> Self {
        Cell((self.0 & !F_COST_MASK) | (u64::from(f_cost) << F_COST_SHIFT))
    }

    /// Returns the cell with both costs back at their sentinels, keeping the blocked state.
    pub const fn with_costs_reset(self) -> Self {
        Cell(self.0 | G_COST_MASK | F_COST_MASK)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::FREE
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("blocked", &self.is_blocked())
            .field("g_cost", &self.g_cost())
            .field("f_cost", &self.f_cost())
            .finish()
    }
}

/// A `width x height` occupancy grid owning its cells and a diagnostic sink.
#[derive(Clone)]
pub struct GridMap {
    /// Number of columns.
    width: u32,
    /// Number of rows.
    height: u32,
    /// Row-major cell storage, `width * height` entries.
    cells: Vec<Cell>,
    /// Where out-of-bounds accesses are reported.
    sink: SharedSink,
}

impl GridMap {
    /// Creates a grid with every cell free and unvisited, reporting to [`TracingSink`].
    ///
    /// # Returns
    /// * `Result<Self, PathError>` - The grid, or `InvalidDimensions` for a zero extent,
    ///   or `AllocationError` if the cells cannot be allocated.
    pub fn new(width: u32, height: u32) -> Result<Self, PathError> {
        Self::with_sink(width, height, Arc::new(TracingSink))
    }

    /// Creates a grid that reports diagnostics to `sink`.
    pub fn with_sink(width: u32, height: u32, sink: SharedSink) -> Result<Self, PathError> {
        if width == 0 || height == 0 {
            return Err(PathError::InvalidDimensions(
                "Width and height must be non-zero",
            ));
        }

        let total_cells = (width as usize)
            .checked_mul(height as usize)
            .ok_or(PathError::AllocationError(
                "Grid dimensions too large, would cause overflow",
            ))?;

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(total_cells)
            .map_err(|_| PathError::AllocationError("Could not allocate grid cells"))?;
        cells.resize(total_cells, Cell::FREE);

        Ok(GridMap {
            width,
            height,
            cells,
            sink,
        })
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Gets the total number of cells in the grid.
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// The sink receiving this grid's diagnostics, shared with searches run on it.
    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Replaces the diagnostic sink.
    pub fn set_sink(&mut self, sink: SharedSink) {
        self.sink = sink;
    }

    /// Gets a reference to the underlying cells, row-major.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns true if `p` lies inside the grid.
    pub fn contains(&self, p: GridPoint) -> bool {
        p.x < self.width && p.y < self.height
    }

    fn index(&self, p: GridPoint) -> Result<usize, PathError> {
        if !self.contains(p) {
            return Err(PathError::OutOfBounds("Grid coordinates out of bounds"));
        }
        Ok(p.y as usize * self.width as usize + p.x as usize)
    }

    /// Gets the packed cell at `p` without logging.
    pub fn cell(&self, p: GridPoint) -> Result<Cell, PathError> {
        self.index(p).map(|i| self.cells[i])
    }

    fn report_out_of_bounds(&self, op: &str, p: GridPoint) {
        if self.sink.enabled(Severity::Error) {
            let message = format!(
                "{op}: indices {p} out of bounds for {}x{} grid",
                self.width, self.height
            );
            self.sink.log(Severity::Error, TAG, &message);
        }
    }

    fn update(&mut self, op: &str, p: GridPoint, f: impl FnOnce(Cell) -> Cell) {
        match self.index(p) {
            Ok(i) => self.cells[i] = f(self.cells[i]),
            Err(_) => self.report_out_of_bounds(op, p),
        }
    }

    /// Marks the cell at `p` blocked or free. Out-of-bounds coordinates are logged and ignored.
    pub fn toggle(&mut self, p: GridPoint, blocked: bool) {
        self.update("toggle", p, |c| c.with_blocked(blocked));
    }

    /// Returns true if the cell is blocked. Unknown (out-of-bounds) cells count as blocked.
    pub fn is_blocked(&self, p: GridPoint) -> bool {
        match self.cell(p) {
            Ok(c) => c.is_blocked(),
            Err(_) => {
                self.report_out_of_bounds("is_blocked", p);
                true
            }
        }
    }

    /// Gets `g_cost` at `p`, or [`G_COST_INFINITE`] when out of bounds.
    pub fn g_cost(&self, p: GridPoint) -> u32 {
        match self.cell(p) {
            Ok(c) => c.g_cost(),
            Err(_) => {
                self.report_out_of_bounds("g_cost", p);
                G_COST_INFINITE
            }
        }
    }

    /// Gets `f_cost` at `p`, or [`F_COST_INFINITE`] when out of bounds.
    pub fn f_cost(&self, p: GridPoint) -> u32 {
        match self.cell(p) {
            Ok(c) => c.f_cost(),
            Err(_) => {
                self.report_out_of_bounds("f_cost", p);
                F_COST_INFINITE
            }
        }
    }

    /// Sets `g_cost` at `p`; saturates at [`G_COST_INFINITE`].
    pub fn set_g_cost(&mut self, p: GridPoint, g_cost: u32) {
        self.update("set_g_cost", p, |c| c.with_g_cost(g_cost));
    }

    /// Sets `f_cost` at `p`.
    pub fn set_f_cost(&mut self, p: GridPoint, f_cost: u32) {
        self.update("set_f_cost", p, |c| c.with_f_cost(f_cost));
    }

    /// Puts every cell's costs back to the unvisited sentinels. Blocked state is kept.
    pub fn reset_costs(&mut self) {
        for c in &mut self.cells {
            *c = c.with_costs_reset();
        }
    }

    /// Clears the entire grid, setting all cells free and unvisited.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::FREE);
    }

    /// Number of blocked cells.
    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_blocked()).count()
    }

    /// Renders the grid like its `Display` form, with `path` overlaid.
    ///
    /// The first point is drawn as `S`, the last as `T`, the rest as `*`.
    pub fn render_with_path(&self, path: &[GridPoint]) -> String {
        let mut glyphs: Vec<char> = self
            .cells
            .iter()
            .map(|c| if c.is_blocked() { '#' } else { '.' })
            .collect();

        let last = path.len().saturating_sub(1);
        for (i, p) in path.iter().enumerate() {
            if let Ok(idx) = self.index(*p) {
                glyphs[idx] = match i {
                    0 => 'S',
                    _ if i == last => 'T',
                    _ => '*',
                };
            }
        }

        let mut out = String::with_capacity(glyphs.len() + self.height as usize);
        for row in glyphs.chunks(self.width as usize) {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}

impl fmt::Debug for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("blocked", &self.blocked_count())
            .finish()
    }
}

impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "GridMap ({}x{}, {} blocked)",
            self.width,
            self.height,
            self.blocked_count()
        )?;
        write!(f, "{}", self.render_with_path(&[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemorySink;

    fn grid_with_memory(width: u32, height: u32) -> (GridMap, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let grid = GridMap::with_sink(width, height, sink.clone()).unwrap();
        (grid, sink)
    }

    #[test]
    fn test_cell_packing() {
        let c = Cell::FREE;
        assert!(!c.is_blocked());
        assert_eq!(c.g_cost(), G_COST_INFINITE);
        assert_eq!(c.f_cost(), F_COST_INFINITE);

        let c = c.with_g_cost(1_234_567).with_f_cost(3_000_000_000);
        assert_eq!(c.g_cost(), 1_234_567);
        assert_eq!(c.f_cost(), 3_000_000_000);
        assert!(!c.is_blocked());

        let c = c.with_blocked(true);
        assert!(c.is_blocked());
        assert_eq!(c.g_cost(), 1_234_567);
        assert_eq!(c.f_cost(), 3_000_000_000);
        assert_eq!(c.bits() & ENABLED_BIT, 0);
    }

    #[test]
    fn test_g_cost_saturates() {
        let c = Cell::FREE.with_f_cost(7).with_g_cost(u32::MAX);
        assert_eq!(c.g_cost(), G_COST_INFINITE);
        // Saturation never spills into the neighbouring fields.
        assert_eq!(c.f_cost(), 7);
        assert!(!c.is_blocked());
    }

    #[test]
    fn test_costs_reset_keeps_blocked_state() {
        let c = Cell::BLOCKED.with_g_cost(3).with_f_cost(9).with_costs_reset();
        assert!(c.is_blocked());
        assert_eq!(c.g_cost(), G_COST_INFINITE);
        assert_eq!(c.f_cost(), F_COST_INFINITE);
    }

    #[test]
    fn test_grid_creation() {
        let grid = GridMap::new(10, 4).unwrap();
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.total_cells(), 40);
        assert!(grid.cells().iter().all(|c| *c == Cell::FREE));
    }

    #[test]
    fn test_invalid_creation() {
        assert!(matches!(
            GridMap::new(0, 10),
            Err(PathError::InvalidDimensions(_))
        ));
        assert!(matches!(
            GridMap::new(10, 0),
            Err(PathError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn test_row_major_indexing() {
        let (mut grid, _) = grid_with_memory(4, 3);
        grid.toggle(GridPoint::new(3, 1), true);
        assert!(grid.cells()[4 + 3].is_blocked());
        assert_eq!(grid.blocked_count(), 1);

        // (1, 3) and (3, 1) share the product x*y but are different cells; only the
        // first is outside a 4x3 grid.
        assert!(!grid.contains(GridPoint::new(1, 3)));
        assert!(grid.contains(GridPoint::new(3, 1)));
    }

    #[test]
    fn test_out_of_bounds_access() {
        let (mut grid, sink) = grid_with_memory(5, 5);
        let before = grid.cells().to_vec();

        assert!(grid.is_blocked(GridPoint::new(5, 0)));
        assert_eq!(grid.g_cost(GridPoint::new(0, 5)), G_COST_INFINITE);
        assert_eq!(grid.f_cost(GridPoint::new(9, 9)), F_COST_INFINITE);
        grid.set_g_cost(GridPoint::new(5, 5), 1);
        grid.set_f_cost(GridPoint::new(5, 5), 1);
        grid.toggle(GridPoint::new(6, 2), true);

        assert_eq!(grid.cells(), &before[..]);
        assert_eq!(sink.count(Severity::Error), 6);
        assert!(sink.records().iter().all(|r| r.tag == TAG));
        assert!(matches!(
            grid.cell(GridPoint::new(5, 0)),
            Err(PathError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_cost_accessors() {
        let (mut grid, sink) = grid_with_memory(3, 3);
        let p = GridPoint::new(2, 1);
        grid.set_g_cost(p, 42);
        grid.set_f_cost(p, 99);
        assert_eq!(grid.g_cost(p), 42);
        assert_eq!(grid.f_cost(p), 99);
        assert!(!grid.is_blocked(p));

        grid.reset_costs();
        assert_eq!(grid.g_cost(p), G_COST_INFINITE);
        assert_eq!(grid.f_cost(p), F_COST_INFINITE);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_toggle_is_idempotent() {
        let (mut grid, _) = grid_with_memory(3, 3);
        let p = GridPoint::new(1, 1);
        grid.toggle(p, true);
        let once = grid.cells().to_vec();
        grid.toggle(p, true);
        assert_eq!(grid.cells(), &once[..]);

        grid.toggle(p, false);
        assert!(!grid.is_blocked(p));
        grid.toggle(p, true);
        grid.clear();
        assert_eq!(grid.blocked_count(), 0);
    }

    #[test]
    fn test_display() {
        let (mut grid, _) = grid_with_memory(3, 2);
        grid.toggle(GridPoint::new(1, 0), true);

        let display_str = format!("{}", grid);
        assert!(display_str.contains("GridMap (3x2, 1 blocked)"));
        assert!(display_str.contains(".#.\n...\n"));

        let path = [
            GridPoint::new(0, 0),
            GridPoint::new(0, 1),
            GridPoint::new(1, 1),
            GridPoint::new(2, 0),
        ];
        assert_eq!(grid.render_with_path(&path), "S#T\n**.\n");
    }
}
