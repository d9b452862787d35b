// Wavefront planning: layer-by-layer BFS over a binary occupancy grid.
//
// Layer 1: OccupancyGrid: static wall map, row-major.
// Layer 2: WavefrontEngine: incremental flood from the goal cell that
//          records hop distances and parent cells, then walks parents back
//          from the start once the flood runs dry.
//
// One `advance` step expands exactly one BFS layer, so the driver can
// animate the wave at any rate through the frame accumulator.

use log::debug;
use serde::{Deserialize, Serialize};

use super::pacing::{FrameAccumulator, Speed};

/// BFS layers per frame at 1× speed.
pub const LAYERS_PER_FRAME: f64 = 0.4;

/// Marker for cells the wave has not reached.
pub const UNVISITED: i32 = -1;

// ============================================================================
// CELLS & GRID
// ============================================================================

/// Integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// 4-connected hop distance.
    pub fn manhattan(self, other: Cell) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

/// Static wall map. `true` marks a blocked cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyGrid {
    walls: Vec<bool>,
    rows: usize,
    cols: usize,
}

impl OccupancyGrid {
    /// Fully open grid.
    pub fn new_open(rows: usize, cols: usize) -> Self {
        Self {
            walls: vec![false; rows * cols],
            rows,
            cols,
        }
    }

    /// Build from row-major rows of wall flags. All rows must share a length.
    pub fn from_rows(rows: &[Vec<bool>]) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        debug_assert!(rows.iter().all(|r| r.len() == cols), "ragged grid");
        Self {
            walls: rows.iter().flatten().copied().collect(),
            rows: rows.len(),
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    #[inline]
    fn idx(&self, cell: Cell) -> usize {
        cell.row * self.cols + cell.col
    }

    pub fn is_wall(&self, cell: Cell) -> bool {
        self.walls[self.idx(cell)]
    }

    pub fn set_wall(&mut self, cell: Cell, wall: bool) {
        let i = self.idx(cell);
        self.walls[i] = wall;
    }

    /// Number of blocked cells.
    pub fn wall_count(&self) -> usize {
        self.walls.iter().filter(|&&w| w).count()
    }
}

/// In-bounds 4-connected neighbours in expansion order:
/// east, west, south, north.
fn cardinal_neighbors(cell: Cell, rows: usize, cols: usize) -> impl Iterator<Item = Cell> {
    let (r, c) = (cell.row as isize, cell.col as isize);
    let (ri, ci) = (rows as isize, cols as isize);
    [(r, c + 1), (r, c - 1), (r + 1, c), (r - 1, c)]
        .into_iter()
        .filter(move |&(nr, nc)| nr >= 0 && nc >= 0 && nr < ri && nc < ci)
        .map(|(nr, nc)| Cell::new(nr as usize, nc as usize))
}

// ============================================================================
// ENGINE
// ============================================================================

/// Per-frame summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WavefrontStats {
    pub done: bool,
    pub path_length: Option<usize>,
    pub cells_visited: u32,
}

/// Incremental BFS state for one scenario run.
#[derive(Debug, Clone)]
pub struct WavefrontEngine {
    grid: OccupancyGrid,
    start: Cell,
    goal: Cell,
    dist: Vec<i32>,
    parent: Vec<Option<Cell>>,
    frontier: Vec<Cell>,
    queue: Vec<Cell>,
    done: bool,
    path: Option<Vec<Cell>>,
    max_dist: i32,
    cells_visited: u32,
    accumulator: FrameAccumulator,
}

impl WavefrontEngine {
    pub fn new(grid: OccupancyGrid, start: Cell, goal: Cell) -> Self {
        debug_assert!(grid.contains(start), "start cell out of bounds");
        debug_assert!(grid.contains(goal), "goal cell out of bounds");
        let size = grid.rows * grid.cols;
        let mut dist = vec![UNVISITED; size];
        dist[grid.idx(goal)] = 0;
        Self {
            grid,
            start,
            goal,
            dist,
            parent: vec![None; size],
            frontier: vec![goal],
            queue: vec![goal],
            done: false,
            path: None,
            max_dist: 0,
            cells_visited: 1,
            accumulator: FrameAccumulator::default(),
        }
    }

    /// Expand up to `budget` BFS layers.
    ///
    /// When the next layer is empty the search finishes and the path from
    /// the start is rebuilt. An unreachable start leaves `path` empty.
    pub fn advance(&mut self, budget: u32) {
        for _ in 0..budget {
            if self.done {
                return;
            }
            if self.queue.is_empty() {
                self.finish();
                return;
            }
            self.expand_layer();
        }
    }

    /// One animation frame at the given playback speed.
    pub fn tick(&mut self, speed: Speed) {
        if self.done {
            return;
        }
        let budget = self.accumulator.take(speed.multiplier(), LAYERS_PER_FRAME);
        self.advance(budget);
    }

    fn expand_layer(&mut self) {
        let layer = std::mem::take(&mut self.queue);
        let mut next = Vec::new();
        for &cell in &layer {
            let d = self.dist[self.grid.idx(cell)] + 1;
            for nb in cardinal_neighbors(cell, self.grid.rows, self.grid.cols) {
                let ni = self.grid.idx(nb);
                if self.grid.walls[ni] || self.dist[ni] != UNVISITED {
                    continue;
                }
                self.dist[ni] = d;
                self.parent[ni] = Some(cell);
                self.max_dist = self.max_dist.max(d);
                self.cells_visited += 1;
                next.push(nb);
            }
        }
        self.frontier = layer;
        self.queue = next;
    }

    fn finish(&mut self) {
        self.done = true;
        self.path = self.trace_path();
        match &self.path {
            Some(path) => debug!(
                "wavefront done: {} cells visited, path of {} cells",
                self.cells_visited,
                path.len()
            ),
            None => debug!(
                "wavefront done: start {:?} unreachable after {} cells",
                self.start, self.cells_visited
            ),
        }
    }

    /// Follow parent links from the start back to the goal.
    fn trace_path(&self) -> Option<Vec<Cell>> {
        if self.distance(self.start)?.is_negative() {
            return None;
        }
        let mut path = vec![self.start];
        let mut cur = self.start;
        while cur != self.goal {
            cur = self.parent[self.grid.idx(cur)]?;
            path.push(cur);
        }
        Some(path)
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn goal(&self) -> Cell {
        self.goal
    }

    /// Hop distance from the goal, `Some(-1)` while unvisited, `None` out
    /// of bounds.
    pub fn distance(&self, cell: Cell) -> Option<i32> {
        self.grid
            .contains(cell)
            .then(|| self.dist[self.grid.idx(cell)])
    }

    /// Cell the wave reached `cell` from.
    pub fn parent(&self, cell: Cell) -> Option<Cell> {
        if self.grid.contains(cell) {
            self.parent[self.grid.idx(cell)]
        } else {
            None
        }
    }

    /// Row-major distance grid.
    pub fn distances(&self) -> &[i32] {
        &self.dist
    }

    /// The layer most recently expanded.
    pub fn frontier(&self) -> &[Cell] {
        &self.frontier
    }

    /// Cells waiting to be expanded next.
    pub fn queue(&self) -> &[Cell] {
        &self.queue
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Start-to-goal cells, once finished and reachable.
    pub fn path(&self) -> Option<&[Cell]> {
        self.path.as_deref()
    }

    pub fn max_dist(&self) -> i32 {
        self.max_dist
    }

    pub fn cells_visited(&self) -> u32 {
        self.cells_visited
    }

    pub fn frame_accumulator(&self) -> f64 {
        self.accumulator.value()
    }

    pub fn stats(&self) -> WavefrontStats {
        WavefrontStats {
            done: self.done,
            path_length: self.path.as_ref().map(Vec::len),
            cells_visited: self.cells_visited,
        }
    }
}
