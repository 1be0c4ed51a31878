//! Closed boundary walk over a region's boundary index.
//!
//! The walk starts at the origin (first cell in scan order, so its west,
//! north-west and north neighbours are outside) with a virtual southward
//! heading, which makes the first sweep begin due west. Each step ranks the
//! 8-neighbours present in the index with [`AdjacencySorter`] and takes the
//! best legal one, recording the move in a transition table.
//!
//! The ring is closed once the walk is back at the origin and the move it
//! would take next has already been taken: from there on the walk would only
//! repeat itself.

use std::collections::BTreeMap;

use crate::geom::{Cell, Direction};

use super::region::{BoundaryIndex, PointId};
use super::sorter::AdjacencySorter;
use super::AdjacencyFault;

/// One closed ring of boundary points plus the moves taken to walk it.
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    /// Visited points; first and last are the origin.
    pub points: Vec<PointId>,
    transitions: BTreeMap<PointId, Vec<PointId>>,
}

impl Traversal {
    pub fn has_transition(&self, from: PointId, to: PointId) -> bool {
        self.transitions.get(&from).is_some_and(|t| t.contains(&to))
    }

    fn record(&mut self, from: PointId, to: PointId) {
        self.transitions.entry(from).or_default().push(to);
    }

    pub fn cells(&self, index: &BoundaryIndex) -> Vec<Cell> {
        self.points.iter().map(|&id| index.cell(id)).collect()
    }
}

struct Walker<'a> {
    index: &'a BoundaryIndex,
    origin: PointId,
    traversal: Traversal,
}

impl Walker<'_> {
    /// Neighbours of `from` in sorter order.
    fn candidates(&self, from: PointId, heading: Direction) -> Vec<PointId> {
        let cell = self.index.cell(from);
        let sorter = AdjacencySorter::new(cell, heading);
        let mut ids = self.index.neighbours(cell);
        ids.sort_by(|&a, &b| sorter.compare(self.index.cell(a), self.index.cell(b)));
        ids
    }

    fn next_point(&self, from: PointId, came_from: Option<PointId>, heading: Direction) -> Option<PointId> {
        let candidates = self.candidates(from, heading);

        candidates
            .iter()
            .copied()
            .find(|&c| !self.traversal.has_transition(from, c))
            // A move already taken is only repeated to back out of a one-cell spur.
            .or_else(|| candidates.iter().copied().find(|&c| came_from == Some(c)))
            .or_else(|| candidates.iter().copied().find(|&c| c == self.origin))
            .or_else(|| candidates.first().copied())
    }
}

/// Walk the ring of `index` starting and ending at `origin`.
pub fn walk(index: &BoundaryIndex, origin: PointId) -> Result<Traversal, AdjacencyFault> {
    let mut walker = Walker {
        index,
        origin,
        traversal: Traversal::default(),
    };
    walker.traversal.points.push(origin);

    // A lone cell is its own ring.
    if index.neighbours(index.cell(origin)).is_empty() {
        return Ok(walker.traversal);
    }

    // Each boundary cell is entered at most once per side.
    let limit = 4 * index.len() + 8;
    let mut heading = Direction::S;
    let mut current = origin;
    let mut came_from = None;

    loop {
        if current == origin && walker.traversal.points.len() > 1 {
            let first = walker.candidates(origin, heading).first().copied();
            if first.is_some_and(|c| walker.traversal.has_transition(origin, c)) {
                break;
            }
        }

        let at = index.cell(current);
        let next = walker
            .next_point(current, came_from, heading)
            .ok_or(AdjacencyFault { at })?;
        heading = Direction::between(at, index.cell(next)).ok_or(AdjacencyFault { at })?;
        walker.traversal.record(current, next);
        walker.traversal.points.push(next);
        came_from = Some(current);
        current = next;

        if walker.traversal.points.len() > limit {
            return Err(AdjacencyFault { at: index.cell(current) });
        }
    }

    log::trace!(
        "walked {} points from ({}, {})",
        walker.traversal.points.len(),
        index.cell(origin).x,
        index.cell(origin).y
    );
    Ok(walker.traversal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_cells(cells: &[(i32, i32)]) -> Vec<(i32, i32)> {
        let index = BoundaryIndex::from_cells(cells.iter().map(|&(x, y)| Cell::new(x, y)));
        let origin = index.first_by_column().unwrap();
        let t = walk(&index, origin).unwrap();
        t.cells(&index).into_iter().map(|c| (c.x, c.y)).collect()
    }

    fn assert_closed_and_adjacent(path: &[(i32, i32)]) {
        assert_eq!(path.first(), path.last());
        for w in path.windows(2) {
            let (a, b) = (Cell::new(w[0].0, w[0].1), Cell::new(w[1].0, w[1].1));
            assert!(Direction::between(a, b).is_some(), "{a:?} -> {b:?}");
        }
    }

    #[test]
    fn single_cell() {
        assert_eq!(walk_cells(&[(2, 2)]), vec![(2, 2)]);
    }

    #[test]
    fn bar_backtracks_through_its_middle() {
        let path = walk_cells(&[(0, 0), (1, 0), (2, 0)]);
        assert_eq!(path, vec![(0, 0), (1, 0), (2, 0), (1, 0), (0, 0)]);
    }

    #[test]
    fn square_rim_goes_counter_clockwise() {
        let rim = [(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)];
        let path = walk_cells(&rim);
        assert_closed_and_adjacent(&path);
        assert_eq!(
            path,
            vec![(0, 0), (0, 1), (0, 2), (1, 2), (2, 2), (2, 1), (2, 0), (1, 0), (0, 0)]
        );
    }

    #[test]
    fn l_spur_uses_distinct_moves() {
        // Vertical arm down from the origin, horizontal arm to the right.
        let path = walk_cells(&[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)]);
        assert_closed_and_adjacent(&path);
        assert_eq!(
            path,
            vec![(0, 0), (0, 1), (0, 2), (1, 2), (2, 2), (1, 2), (0, 1), (0, 0)]
        );
        let mut moves: Vec<_> = path.windows(2).map(|w| (w[0], w[1])).collect();
        moves.sort();
        moves.dedup();
        assert_eq!(moves.len(), path.len() - 1);
    }

    #[test]
    fn untaken_move_beats_spur_backtrack() {
        let index = BoundaryIndex::from_cells([Cell::new(0, 1), Cell::new(1, 1), Cell::new(1, 2)]);
        let id = |x, y| index.get(Cell::new(x, y)).unwrap();
        let (west, from, south) = (id(0, 1), id(1, 1), id(1, 2));
        let mut walker = Walker {
            index: &index,
            origin: west,
            traversal: Traversal::default(),
        };
        walker.traversal.record(from, west);

        // Heading south the sweep starts due west, so `west` ranks first.
        assert_eq!(walker.candidates(from, Direction::S), vec![west, south]);
        assert_eq!(walker.next_point(from, Some(west), Direction::S), Some(south));

        walker.traversal.record(from, south);
        assert_eq!(walker.next_point(from, Some(west), Direction::S), Some(west));
    }

    #[test]
    fn diagonal_only_neighbour_is_reached() {
        let path = walk_cells(&[(0, 1), (1, 1), (1, 0)]);
        assert_eq!(path, vec![(0, 1), (1, 1), (1, 0), (0, 1)]);
    }
}
