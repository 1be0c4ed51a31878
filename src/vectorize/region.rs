//! Region state shared by the pipeline stages.
//!
//! Each region owns an arena of [`PixelPoint`]s. Two ordered views index the
//! live points, one keyed by `(x, y)` and one by `(y, x)`, so column and row
//! neighbourhood queries are range scans instead of grid lookups.

use std::collections::{BTreeMap, VecDeque};

use crate::geom::{Cell, Direction};
use crate::raster::CellValue;

pub type RegionId = u32;

/// Classification of a boundary candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointStatus {
    /// Not yet classified.
    Normal,
    /// Borders a gap in its scan line; resolved by the hole classifier.
    AbuttingHole,
    /// Lacks a same-region neighbour on at least one axis side.
    EdgeConfirmed,
    /// Interior cell, about to leave the index.
    MarkedForDeletion,
}

/// Index of a point in its region's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPoint {
    pub cell: Cell,
    pub status: PointStatus,
}

/// Arena of points plus the `(x, y)` and `(y, x)` views over the live ones.
#[derive(Debug, Clone, Default)]
pub struct BoundaryIndex {
    points: Vec<PixelPoint>,
    by_xy: BTreeMap<(i32, i32), PointId>,
    by_yx: BTreeMap<(i32, i32), PointId>,
}

impl BoundaryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every cell in `cells` as an already-confirmed edge point.
    pub fn from_cells<I: IntoIterator<Item = Cell>>(cells: I) -> Self {
        let mut index = Self::new();
        for cell in cells {
            let id = index.insert(cell);
            index.set_status(id, PointStatus::EdgeConfirmed);
        }
        index
    }

    pub fn insert(&mut self, cell: Cell) -> PointId {
        if let Some(id) = self.get(cell) {
            return id;
        }
        let id = PointId(self.points.len());
        self.points.push(PixelPoint {
            cell,
            status: PointStatus::Normal,
        });
        self.by_xy.insert((cell.x, cell.y), id);
        self.by_yx.insert((cell.y, cell.x), id);
        id
    }

    /// Drop a point from both views. The arena slot stays so ids remain stable.
    pub fn remove(&mut self, id: PointId) {
        let cell = self.points[id.0].cell;
        self.by_xy.remove(&(cell.x, cell.y));
        self.by_yx.remove(&(cell.y, cell.x));
    }

    pub fn get(&self, cell: Cell) -> Option<PointId> {
        self.by_xy.get(&(cell.x, cell.y)).copied()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.by_xy.contains_key(&(cell.x, cell.y))
    }

    pub fn cell(&self, id: PointId) -> Cell {
        self.points[id.0].cell
    }

    pub fn status(&self, id: PointId) -> PointStatus {
        self.points[id.0].status
    }

    pub fn set_status(&mut self, id: PointId, status: PointStatus) {
        self.points[id.0].status = status;
    }

    /// Number of live points.
    pub fn len(&self) -> usize {
        self.by_xy.len()
    }

    /// Live point ids in `(x, y)` order.
    pub fn ids(&self) -> impl Iterator<Item = PointId> + '_ {
        self.by_xy.values().copied()
    }

    pub fn first_by_column(&self) -> Option<PointId> {
        self.by_xy.values().next().copied()
    }

    pub fn first_by_row(&self) -> Option<PointId> {
        self.by_yx.values().next().copied()
    }

    /// Live points among the 8 neighbours of `cell`, in [`Direction::CYCLE`] order.
    pub fn neighbours(&self, cell: Cell) -> Vec<PointId> {
        Direction::CYCLE
            .iter()
            .filter_map(|&d| self.get(cell.step(d)))
            .collect()
    }

    /// Coordinates of live points strictly beyond `cell` along an axis
    /// direction, nearest first.
    pub fn beyond(&self, cell: Cell, dir: Direction) -> Vec<i32> {
        match dir {
            Direction::N => self
                .by_xy
                .range((cell.x, i32::MIN)..(cell.x, cell.y))
                .rev()
                .map(|(&(_, y), _)| y)
                .collect(),
            Direction::S => self
                .by_xy
                .range((cell.x, cell.y + 1)..=(cell.x, i32::MAX))
                .map(|(&(_, y), _)| y)
                .collect(),
            Direction::W => self
                .by_yx
                .range((cell.y, i32::MIN)..(cell.y, cell.x))
                .rev()
                .map(|(&(_, x), _)| x)
                .collect(),
            Direction::E => self
                .by_yx
                .range((cell.y, cell.x + 1)..=(cell.y, i32::MAX))
                .map(|(&(_, x), _)| x)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Non-member cells `lo..=hi` lying between two member cells of scan line `line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GapRun {
    pub line: u32,
    pub lo: u32,
    pub hi: u32,
}

impl GapRun {
    pub fn overlaps(&self, lo: u32, hi: u32) -> bool {
        self.lo <= hi && lo <= self.hi
    }

    pub fn cell_count(&self) -> usize {
        (self.hi - self.lo + 1) as usize
    }
}

/// Whether `(line, pos)` falls in one of `runs`, which must be sorted.
pub fn runs_cover(runs: &[GapRun], line: u32, pos: u32) -> bool {
    let i = runs.partition_point(|r| (r.line, r.lo) <= (line, pos));
    i > 0 && runs[i - 1].line == line && runs[i - 1].hi >= pos
}

/// One scan line of a region's working membership window.
#[derive(Debug, Clone)]
pub(crate) struct WindowLine {
    pub line: u32,
    /// Positions along the line, ascending (cells arrive in scan order).
    pub positions: Vec<u32>,
}

/// A connected set of equal-valued cells being turned into a polygon.
#[derive(Debug, Clone)]
pub struct Region {
    pub id: RegionId,
    pub value: CellValue,
    /// Membership of the most recent scan lines, oldest first.
    pub(crate) window: VecDeque<WindowLine>,
    /// Boundary candidates that survived pruning.
    pub boundary: BoundaryIndex,
    /// Gaps between member cells, in scan order. Each run is bounded by two
    /// boundary points, so this grows with the boundary, not the area.
    pub gaps: Vec<GapRun>,
    /// Gap spans `(lo, hi)` found in the most recent scan line.
    pub(crate) last_spans: Vec<(u32, u32)>,
    /// First cell in scan order; the walk starts and ends here.
    pub origin: Cell,
    pub cell_count: usize,
    pub has_holes: bool,
    pub done: bool,
}

impl Region {
    pub fn new(id: RegionId, value: CellValue, origin: Cell) -> Self {
        Self {
            id,
            value,
            window: VecDeque::with_capacity(3),
            boundary: BoundaryIndex::new(),
            gaps: Vec::new(),
            last_spans: Vec::new(),
            origin,
            cell_count: 0,
            has_holes: false,
            done: false,
        }
    }

    /// Positions of member cells on `line`, empty if the line is not in the window.
    pub(crate) fn line_positions(&self, line: u32) -> &[u32] {
        self.window
            .iter()
            .find(|w| w.line == line)
            .map_or(&[], |w| w.positions.as_slice())
    }

    pub(crate) fn window_contains(&self, line: u32, pos: u32) -> bool {
        self.line_positions(line).binary_search(&pos).is_ok()
    }
}
