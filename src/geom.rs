//! Shared geometry: grid cells, compass directions, ring areas.

use kurbo::Point;

/// Integer grid coordinate. `x` grows east, `y` grows south (row index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Cell {
        let (dx, dy) = dir.offset();
        Cell::new(self.x + dx, self.y + dy)
    }

    /// Chebyshev (chessboard) distance.
    pub fn chebyshev(self, other: Cell) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }

    pub fn in_bounds(self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as u32) < width && (self.y as u32) < height
    }
}

/// The eight compass directions, listed in counter-clockwise order
/// as seen on screen (y down): W, SW, S, SE, E, NE, N, NW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    W,
    SW,
    S,
    SE,
    E,
    NE,
    N,
    NW,
}

impl Direction {
    /// All directions in rotational order, starting at west.
    pub const CYCLE: [Direction; 8] = [
        Direction::W,
        Direction::SW,
        Direction::S,
        Direction::SE,
        Direction::E,
        Direction::NE,
        Direction::N,
        Direction::NW,
    ];

    /// The four axis directions in the order boundary tests run them.
    pub const AXES: [Direction; 4] = [Direction::N, Direction::E, Direction::W, Direction::S];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Rotate by `steps` 45° increments. Positive steps follow [`Direction::CYCLE`].
    pub fn rotate(self, steps: i32) -> Direction {
        let i = (self.index() as i32 + steps).rem_euclid(8);
        Self::CYCLE[i as usize]
    }

    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::W => (-1, 0),
            Direction::SW => (-1, 1),
            Direction::S => (0, 1),
            Direction::SE => (1, 1),
            Direction::E => (1, 0),
            Direction::NE => (1, -1),
            Direction::N => (0, -1),
            Direction::NW => (-1, -1),
        }
    }

    /// Direction of a single 8-adjacent step, `None` if the cells are
    /// equal or not adjacent.
    pub fn between(from: Cell, to: Cell) -> Option<Direction> {
        let delta = (to.x - from.x, to.y - from.y);
        Self::CYCLE.into_iter().find(|d| d.offset() == delta)
    }
}

/// Signed area of a closed ring via the shoelace formula.
///
/// Positive = counter-clockwise in a y-up frame.
pub fn signed_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            ring[i].x * ring[j].y - ring[j].x * ring[i].y
        })
        .sum::<f64>()
        / 2.0
}

/// Shoelace area of an integer corner ring, doubled to stay exact.
pub fn doubled_area(ring: &[(i32, i32)]) -> i64 {
    let n = ring.len();
    if n < 3 {
        return 0;
    }
    (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            ring[i].0 as i64 * ring[j].1 as i64 - ring[j].0 as i64 * ring[i].1 as i64
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_wraps_both_ways() {
        assert_eq!(Direction::W.rotate(-1), Direction::NW);
        assert_eq!(Direction::NW.rotate(1), Direction::W);
        assert_eq!(Direction::S.rotate(-2), Direction::W);
        assert_eq!(Direction::E.rotate(10), Direction::N);
    }

    #[test]
    fn between_matches_offsets() {
        let c = Cell::new(5, 5);
        for d in Direction::CYCLE {
            assert_eq!(Direction::between(c, c.step(d)), Some(d));
        }
        assert_eq!(Direction::between(c, c), None);
        assert_eq!(Direction::between(c, Cell::new(7, 5)), None);
    }

    #[test]
    fn unit_square_area() {
        let ccw = [(0, 0), (1, 0), (1, 1), (0, 1)];
        assert_eq!(doubled_area(&ccw), 2);
        let pts: Vec<Point> = ccw.iter().map(|&(x, y)| Point::new(x as f64, y as f64)).collect();
        assert_eq!(signed_area(&pts), 1.0);
    }
}
