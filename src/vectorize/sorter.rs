//! Candidate ordering for the boundary walk.
//!
//! Adjacent candidates (Chebyshev distance 1) always rank before distant
//! ones. Among adjacent candidates, the *favored direction* is the previous
//! heading turned two 45° steps clockwise (back along
//! [`Direction::CYCLE`]), and directions are tried in cycle order starting
//! there. This is Moore-neighbour tracing: the sweep begins on the outside
//! of the turn, so the walk hugs the region with its interior on the left
//! and never zig-zags through it.

use std::cmp::Ordering;

use crate::geom::{Cell, Direction};

/// Stateless per call; holds the reference point and heading for one sort.
#[derive(Debug, Clone, Copy)]
pub struct AdjacencySorter {
    reference: Cell,
    favored: Direction,
}

impl AdjacencySorter {
    pub fn new(reference: Cell, heading: Direction) -> Self {
        Self {
            reference,
            favored: favored_direction(heading),
        }
    }

    pub fn compare(&self, a: Cell, b: Cell) -> Ordering {
        let da = self.reference.chebyshev(a);
        let db = self.reference.chebyshev(b);
        match (da <= 1, db <= 1) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => return da.cmp(&db).then(a.cmp(&b)),
            (true, true) => {}
        }

        let dir_a = Direction::between(self.reference, a);
        let dir_b = Direction::between(self.reference, b);
        let mut tested = self.favored;
        for _ in 0..8 {
            match (dir_a == Some(tested), dir_b == Some(tested)) {
                (true, true) => return Ordering::Equal,
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                (false, false) => tested = tested.rotate(1),
            }
        }
        // Both candidates coincide with the reference.
        Ordering::Equal
    }
}

/// Heading turned by 90° against the sweep order.
pub fn favored_direction(heading: Direction) -> Direction {
    heading.rotate(-2)
}
