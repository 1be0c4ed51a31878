//! Hole classification for a completed region.
//!
//! Gap runs recorded during accumulation are grouped into 4-connected
//! components. A run touches the runs of the neighbouring scan lines whose
//! spans overlap its own. A component is an enclosed hole when every run is
//! covered on both neighbouring lines by the region's extent there: inside
//! the extent every cell is either a member or another gap, while past it the
//! line is open to the outside.
//!
//! Points flagged [`PointStatus::AbuttingHole`] are then resolved:
//!
//! 1. **Directional checks**: a point with an axis neighbour that is off the
//!    raster, past its line's extent, or in a leaking run is an ordinary edge.
//! 2. **Parity**: the remaining points are cast four axis rays. Each ray
//!    counts boundary crossings (maximal runs of consecutive boundary points)
//!    strictly beyond the point. Only when all four counts are odd the point
//!    sits inside the outer ring; it then describes a hole and leaves the
//!    outer index. Any zero or even count keeps it as an edge.

use std::collections::BTreeMap;

use crate::config::ScanOrder;
use crate::geom::{Cell, Direction};

use super::region::{runs_cover, BoundaryIndex, GapRun, PointId, PointStatus, Region};

/// Boundary crossings seen from a point along each axis direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisCounts {
    pub north: usize,
    pub east: usize,
    pub west: usize,
    pub south: usize,
}

impl AxisCounts {
    /// Enclosed only if every count is nonzero and odd.
    pub fn is_enclosed(&self) -> bool {
        [self.north, self.east, self.west, self.south]
            .iter()
            .all(|&n| n % 2 == 1)
    }
}

/// Cast the four axis rays from `cell` against `index`.
pub fn is_inside(index: &BoundaryIndex, cell: Cell) -> AxisCounts {
    let crossings = |dir: Direction| {
        let coords = index.beyond(cell, dir);
        let origin = match dir {
            Direction::N | Direction::S => cell.y,
            _ => cell.x,
        };
        count_runs(origin, &coords)
    };
    AxisCounts {
        north: crossings(Direction::N),
        east: crossings(Direction::E),
        west: crossings(Direction::W),
        south: crossings(Direction::S),
    }
}

/// Number of maximal runs of consecutive coordinates, walking outward from `origin`.
fn count_runs(origin: i32, coords: &[i32]) -> usize {
    let mut runs = 0;
    let mut last = origin;
    for (i, &c) in coords.iter().enumerate() {
        if i == 0 || (c - last).abs() > 1 {
            runs += 1;
        }
        last = c;
    }
    runs
}

/// First and last member position of every scan line the region covers.
///
/// Both ends of a line are always boundary points, so the extents can be
/// read back from the boundary index once the region is complete.
#[derive(Debug, Default)]
struct Extents(BTreeMap<u32, (u32, u32)>);

impl Extents {
    fn of(index: &BoundaryIndex, order: ScanOrder) -> Self {
        let mut extents = BTreeMap::new();
        for id in index.ids() {
            let Some((line, pos)) = order.split(index.cell(id)) else {
                continue;
            };
            extents
                .entry(line)
                .and_modify(|(lo, hi): &mut (u32, u32)| {
                    *lo = (*lo).min(pos);
                    *hi = (*hi).max(pos);
                })
                .or_insert((pos, pos));
        }
        Self(extents)
    }

    fn spans(&self, line: u32, lo: u32, hi: u32) -> bool {
        self.0
            .get(&line)
            .is_some_and(|&(first, last)| first <= lo && hi <= last)
    }
}

/// An enclosed gap component, stored as its scan-line runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hole {
    order: ScanOrder,
    /// Sorted by line, then position.
    runs: Vec<GapRun>,
}

impl Hole {
    pub fn contains(&self, cell: Cell) -> bool {
        self.order
            .split(cell)
            .is_some_and(|(line, pos)| runs_cover(&self.runs, line, pos))
    }

    pub fn cell_count(&self) -> usize {
        self.runs.iter().map(GapRun::cell_count).sum()
    }

    /// Index of the hole cells with a non-hole axis neighbour, ready to walk.
    pub fn rim(&self) -> BoundaryIndex {
        let inside = |line: Option<u32>, pos: u32| line.is_some_and(|l| runs_cover(&self.runs, l, pos));
        let mut cells = Vec::new();
        for run in &self.runs {
            for pos in run.lo..=run.hi {
                let on_rim = pos == run.lo
                    || pos == run.hi
                    || !inside(run.line.checked_sub(1), pos)
                    || !inside(run.line.checked_add(1), pos);
                if on_rim {
                    cells.push(self.order.cell(run.line, pos));
                }
            }
        }
        BoundaryIndex::from_cells(cells)
    }
}

/// Outcome of resolving a region's flagged points.
#[derive(Debug, Clone, Default)]
pub struct HoleResolution {
    /// Enclosed gap components, in scan order of their first cell.
    pub holes: Vec<Hole>,
    /// Points that turned out to border only a hole.
    pub hole_points: Vec<PointId>,
}

/// Resolve every [`PointStatus::AbuttingHole`] point of a completed region.
pub fn resolve(region: &mut Region, order: ScanOrder, width: u32, height: u32) -> HoleResolution {
    let extents = Extents::of(&region.boundary, order);
    let (components, leaking) = split_gaps(&region.gaps, &extents, order.line_count(width, height));

    let flagged: Vec<PointId> = region
        .boundary
        .ids()
        .filter(|&id| region.boundary.status(id) == PointStatus::AbuttingHole)
        .collect();

    let mut hole_points = Vec::new();
    for id in flagged {
        let cell = region.boundary.cell(id);
        // Open: the neighbour is neither a member nor part of an enclosed hole.
        let open = Direction::AXES.iter().any(|&d| {
            let n = cell.step(d);
            if !n.in_bounds(width, height) {
                return true;
            }
            order.split(n).map_or(true, |(line, pos)| {
                !extents.spans(line, pos, pos) || runs_cover(&leaking, line, pos)
            })
        });
        if open || !is_inside(&region.boundary, cell).is_enclosed() {
            region.boundary.set_status(id, PointStatus::EdgeConfirmed);
        } else {
            hole_points.push(id);
        }
    }
    for &id in &hole_points {
        region.boundary.remove(id);
    }

    region.has_holes = !components.is_empty();
    let holes = components.into_iter().map(|runs| Hole { order, runs }).collect();
    HoleResolution { holes, hole_points }
}

/// Partition gap runs into enclosed components and the sorted leaking runs.
fn split_gaps(gaps: &[GapRun], extents: &Extents, line_count: u32) -> (Vec<Vec<GapRun>>, Vec<GapRun>) {
    let mut seen = vec![false; gaps.len()];
    let mut holes = Vec::new();
    let mut leaking = Vec::new();

    for start in 0..gaps.len() {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut stack = vec![start];
        let mut component = Vec::new();
        let mut enclosed = true;
        while let Some(i) = stack.pop() {
            let run = gaps[i];
            component.push(run);
            for line in [run.line.checked_sub(1), run.line.checked_add(1)] {
                let Some(line) = line.filter(|&l| l < line_count) else {
                    enclosed = false;
                    continue;
                };
                if !extents.spans(line, run.lo, run.hi) {
                    enclosed = false;
                }
                let first = gaps.partition_point(|r| r.line < line);
                for (j, other) in gaps.iter().enumerate().skip(first) {
                    if other.line != line {
                        break;
                    }
                    if !seen[j] && other.overlaps(run.lo, run.hi) {
                        seen[j] = true;
                        stack.push(j);
                    }
                }
            }
        }
        component.sort_unstable();
        if enclosed {
            holes.push(component);
        } else {
            leaking.extend(component);
        }
    }

    leaking.sort_unstable();
    (holes, leaking)
}
