//! Ring post-processing.
//!
//! Exteriors wind CCW and holes CW (positive and negative signed area in a
//! y-up frame), the usual convention for simple-feature polygons. Rings
//! leave the stroker as corner lists with a vertex at every cell edge;
//! merging collinear corners leaves only the turns.

use kurbo::Point;

use crate::geom::signed_area;

/// Reverse `ring` in place unless it already winds the requested way.
pub fn orient(ring: &mut [Point], ccw: bool) {
    let area = signed_area(ring);
    if area != 0.0 && (area > 0.0) != ccw {
        ring.reverse();
    }
}

/// Drop corners that sit in the middle of a straight run.
///
/// `ring` is closed (first == last); so is the result, and it still starts
/// at the same corner when that corner is a turn.
pub fn merge_collinear(ring: &[(i32, i32)]) -> Vec<(i32, i32)> {
    if ring.len() < 4 {
        return ring.to_vec();
    }
    let open = &ring[..ring.len() - 1];
    let n = open.len();
    let is_turn = |i: usize| {
        let prev = open[(i + n - 1) % n];
        let next = open[(i + 1) % n];
        cross(prev, open[i], next) != 0
    };

    let mut merged: Vec<(i32, i32)> = (0..n).filter(|&i| is_turn(i)).map(|i| open[i]).collect();
    if merged.is_empty() {
        return ring.to_vec();
    }
    merged.push(merged[0]);
    merged
}

fn cross(a: (i32, i32), b: (i32, i32), c: (i32, i32)) -> i64 {
    let (abx, aby) = ((b.0 - a.0) as i64, (b.1 - a.1) as i64);
    let (bcx, bcy) = ((c.0 - b.0) as i64, (c.1 - b.1) as i64);
    abx * bcy - aby * bcx
}
