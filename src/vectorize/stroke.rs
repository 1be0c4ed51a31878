//! Cell-center walk → pixel-corner ring.
//!
//! The stroker sits on one corner of the current cell. Corners are visited
//! counter-clockwise on screen, NW → SW → SE → NE → NW, and every such turn
//! emits the corner it lands on. Moving to the next cell of the walk costs
//! nothing when the current corner is shared with that cell on the outside
//! of the ring ("touches" its direction); the state is then re-expressed
//! relative to the new cell.
//!
//! ```text
//!   NW ─── NE        state  touches
//!   │       │        NW     NW, W
//!   │   ·   │        SW     SW, S
//!   │       │        SE     SE, E
//!   SW ─── SE        NE     NE, N
//! ```
//!
//! Corners live on the integer corner grid: cell `(x, y)` spans corners
//! `(x, y)` to `(x + 1, y + 1)`, i.e. its center offset by half a cell.

use crate::geom::{Cell, Direction};

use super::AdjacencyFault;

/// Corner of the current cell the ring is passing through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    NW,
    SW,
    SE,
    NE,
}

impl Corner {
    /// Next corner counter-clockwise.
    pub fn next(self) -> Corner {
        match self {
            Corner::NW => Corner::SW,
            Corner::SW => Corner::SE,
            Corner::SE => Corner::NE,
            Corner::NE => Corner::NW,
        }
    }

    pub fn touches(self, dir: Direction) -> bool {
        matches!(
            (self, dir),
            (Corner::NW, Direction::NW | Direction::W)
                | (Corner::SW, Direction::SW | Direction::S)
                | (Corner::SE, Direction::SE | Direction::E)
                | (Corner::NE, Direction::NE | Direction::N)
        )
    }

    /// The same corner point seen from the neighbour in `dir`.
    /// Only meaningful when `self.touches(dir)`.
    pub fn across(self, dir: Direction) -> Corner {
        match (self, dir) {
            (Corner::NW, Direction::W) => Corner::NE,
            (Corner::NW, _) => Corner::SE,
            (Corner::SW, Direction::S) => Corner::NW,
            (Corner::SW, _) => Corner::NE,
            (Corner::SE, Direction::E) => Corner::SW,
            (Corner::SE, _) => Corner::NW,
            (Corner::NE, Direction::N) => Corner::SE,
            (Corner::NE, _) => Corner::SW,
        }
    }

    /// Corner-grid step taken when turning from `self` to `self.next()`.
    fn step(self) -> (i32, i32) {
        match self {
            Corner::NW => (0, 1),
            Corner::SW => (1, 0),
            Corner::SE => (0, -1),
            Corner::NE => (-1, 0),
        }
    }
}

/// Running state: the corner we are on and its corner-grid position.
#[derive(Debug, Clone)]
pub struct Stroker {
    state: Corner,
    cursor: (i32, i32),
    corners: Vec<(i32, i32)>,
}

impl Stroker {
    /// Start on the north-west corner of `origin`.
    pub fn new(origin: Cell) -> Self {
        let cursor = (origin.x, origin.y);
        Self {
            state: Corner::NW,
            cursor,
            corners: vec![cursor],
        }
    }

    fn turn(&mut self) {
        let (dx, dy) = self.state.step();
        self.cursor = (self.cursor.0 + dx, self.cursor.1 + dy);
        self.corners.push(self.cursor);
        self.state = self.state.next();
    }

    /// Advance from `point` to `next`. `previous` is the walk point before `point`.
    pub fn advance(&mut self, previous: Option<Cell>, point: Cell, next: Cell) -> Result<(), AdjacencyFault> {
        let dir = Direction::between(point, next).ok_or(AdjacencyFault { at: point })?;

        if self.state.touches(dir) {
            if previous == Some(next) {
                // Backtracking out of a tip: go round it instead of
                // emitting a zero-length edge.
                self.turn();
            } else {
                self.state = self.state.across(dir);
                return Ok(());
            }
        }
        while !self.state.touches(dir) {
            self.turn();
        }
        self.state = self.state.across(dir);
        Ok(())
    }

    /// Turn back to the origin's north-west corner and return the closed ring.
    pub fn close(mut self) -> Vec<(i32, i32)> {
        if self.state != Corner::NW || self.corners.len() == 1 {
            loop {
                self.turn();
                if self.state == Corner::NW {
                    break;
                }
            }
        }
        self.corners
    }
}

/// Stroke a closed walk of cell centers into a closed corner ring.
///
/// The first and last corner are both the origin's north-west corner.
pub fn stroke(walk: &[Cell]) -> Result<Vec<(i32, i32)>, AdjacencyFault> {
    let Some(&origin) = walk.first() else {
        return Ok(Vec::new());
    };
    let mut stroker = Stroker::new(origin);
    for i in 0..walk.len().saturating_sub(1) {
        let previous = i.checked_sub(1).map(|p| walk[p]);
        stroker.advance(previous, walk[i], walk[i + 1])?;
    }
    Ok(stroker.close())
}
