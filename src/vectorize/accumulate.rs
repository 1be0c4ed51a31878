//! Streaming region accumulation.
//!
//! Cells are read one scan line at a time. Each cell joins the region of its
//! already-seen 4-neighbour with the same value (the cell before it on the
//! line, or the cell at the same position on the previous line), or starts a
//! new region. After every line, each active region is "edgified":
//!
//! 1. **Gap detection**: non-member runs between two member cells on the new
//!    line are recorded as [`GapRun`]s, and members bordering them (on this
//!    line, the previous line, and for the previous line's spans, this line)
//!    are flagged [`PointStatus::AbuttingHole`].
//! 2. **Classification**: every still-unclassified point on the previous
//!    line now has both neighbouring lines available. It is an edge if it
//!    lacks a member neighbour above, right, left or below (tested in that
//!    order); otherwise it is interior.
//! 3. **Pruning**: interior points leave both index views.
//! 4. **Window trim**: membership older than the previous line is dropped.
//!
//! A region that receives no cells on a line is complete: its last line has
//! just been classified and nothing later can touch it.
//!
//! Two same-valued regions that start apart and meet on a later line are not
//! merged; the cell where they meet joins the region on the previous line.

use std::collections::BTreeMap;

use crate::config::ScanOrder;
use crate::geom::{Cell, Direction};
use crate::raster::{CellSource, CellValue};

use super::region::{GapRun, PointStatus, Region, RegionId, WindowLine};

impl Region {
    /// Append a cell to the membership window of `line` and to the boundary index.
    pub fn add_cell(&mut self, line: u32, pos: u32, cell: Cell) {
        match self.window.back_mut() {
            Some(w) if w.line == line => w.positions.push(pos),
            _ => self.window.push_back(WindowLine {
                line,
                positions: vec![pos],
            }),
        }
        self.boundary.insert(cell);
        self.cell_count += 1;
    }

    /// Edgify after `line` has been fully read. Returns `true` once the
    /// region is complete.
    pub fn advance_line(&mut self, line: u32, order: ScanOrder) -> bool {
        let current = self.line_positions(line).to_vec();

        // ── Gap detection ─────────────────────────────────────
        let mut spans = Vec::new();
        for pair in current.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if hi > lo + 1 {
                spans.push((lo + 1, hi - 1));
                self.flag(order.cell(line, lo));
                self.flag(order.cell(line, hi));
                self.gaps.push(GapRun {
                    line,
                    lo: lo + 1,
                    hi: hi - 1,
                });
            }
        }
        if line > 0 {
            let previous = self.line_positions(line - 1).to_vec();
            for &(lo, hi) in &spans {
                for &pos in previous.iter().filter(|&&p| p >= lo && p <= hi) {
                    self.flag(order.cell(line - 1, pos));
                }
            }
        }
        let last_spans = std::mem::take(&mut self.last_spans);
        for &(lo, hi) in &last_spans {
            for &pos in current.iter().filter(|&&p| p >= lo && p <= hi) {
                self.flag(order.cell(line, pos));
            }
        }
        self.last_spans = spans;

        // ── Classify the previous line ────────────────────────
        if line > 0 {
            let mut interior = Vec::new();
            for &pos in self.line_positions(line - 1) {
                let cell = order.cell(line - 1, pos);
                let Some(id) = self.boundary.get(cell) else {
                    continue;
                };
                if self.boundary.status(id) != PointStatus::Normal {
                    continue;
                }
                let open_side = Direction::AXES
                    .iter()
                    .any(|&d| !self.is_member(cell.step(d), order));
                interior.push((id, open_side));
            }
            for (id, open_side) in interior {
                let status = if open_side {
                    PointStatus::EdgeConfirmed
                } else {
                    PointStatus::MarkedForDeletion
                };
                self.boundary.set_status(id, status);
                if status == PointStatus::MarkedForDeletion {
                    self.boundary.remove(id);
                }
            }
        }

        // ── Trim the window ───────────────────────────────────
        while self.window.front().is_some_and(|w| w.line + 1 < line) {
            self.window.pop_front();
        }

        if current.is_empty() {
            self.done = true;
        }
        self.done
    }

    fn flag(&mut self, cell: Cell) {
        if let Some(id) = self.boundary.get(cell) {
            self.boundary.set_status(id, PointStatus::AbuttingHole);
        }
    }

    fn is_member(&self, cell: Cell, order: ScanOrder) -> bool {
        order
            .split(cell)
            .is_some_and(|(line, pos)| self.window_contains(line, pos))
    }
}

/// Single-threaded scan state: the per-line labels and the active regions.
pub struct Accumulator {
    order: ScanOrder,
    width: u32,
    height: u32,
    nodata: Option<CellValue>,
    next_id: RegionId,
    active: BTreeMap<RegionId, Region>,
    /// Region of each position on the previous and current scan line.
    prev_labels: Vec<Option<RegionId>>,
    cur_labels: Vec<Option<RegionId>>,
    /// Next line to read.
    line: u32,
    finished: Vec<Region>,
}

impl Accumulator {
    pub fn new(order: ScanOrder, width: u32, height: u32, nodata: Option<CellValue>) -> Self {
        let line_len = order.line_len(width, height) as usize;
        Self {
            order,
            width,
            height,
            nodata,
            next_id: 0,
            active: BTreeMap::new(),
            prev_labels: vec![None; line_len],
            cur_labels: vec![None; line_len],
            line: 0,
            finished: Vec::new(),
        }
    }

    /// Whether every scan line has been read.
    pub fn is_exhausted(&self) -> bool {
        self.line >= self.order.line_count(self.width, self.height)
    }

    /// Read the next scan line from `source` and edgify every active region.
    /// Returns `false` once the raster is exhausted.
    pub fn scan_line<S: CellSource + ?Sized>(&mut self, source: &S) -> bool {
        if self.is_exhausted() {
            return false;
        }
        let line = self.line;
        let line_len = self.order.line_len(self.width, self.height);
        for pos in 0..line_len {
            let cell = self.order.cell(line, pos);
            let value = source.value_at(cell.x as u32, cell.y as u32);
            if Some(value) == self.nodata {
                self.cur_labels[pos as usize] = None;
                continue;
            }
            let id = self.assign(pos, value, cell);
            self.cur_labels[pos as usize] = Some(id);
            if let Some(region) = self.active.get_mut(&id) {
                region.add_cell(line, pos, cell);
            }
        }
        self.advance(line);
        std::mem::swap(&mut self.prev_labels, &mut self.cur_labels);
        self.line += 1;
        true
    }

    /// Close out the last scan line once the source is exhausted.
    /// Every remaining region becomes complete.
    pub fn finish(&mut self) {
        debug_assert!(self.is_exhausted());
        self.advance(self.line);
        debug_assert!(self.active.is_empty());
    }

    /// Completed regions in completion order, removed from the accumulator.
    pub fn take_finished(&mut self) -> Vec<Region> {
        std::mem::take(&mut self.finished)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Pick the region for a cell: the previous line's neighbour first, then
    /// the preceding cell on this line, else a fresh region.
    fn assign(&mut self, pos: u32, value: CellValue, cell: Cell) -> RegionId {
        let same_value = |id: &RegionId| self.active.get(id).is_some_and(|r| r.value == value);
        let above = self.prev_labels[pos as usize].filter(same_value);
        let before = pos
            .checked_sub(1)
            .and_then(|p| self.cur_labels[p as usize])
            .filter(same_value);
        if let Some(id) = above.or(before) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.active.insert(id, Region::new(id, value, cell));
        id
    }

    fn advance(&mut self, line: u32) {
        let order = self.order;
        let done: Vec<RegionId> = self
            .active
            .iter_mut()
            .filter_map(|(&id, region)| region.advance_line(line, order).then_some(id))
            .collect();
        for id in done {
            if let Some(region) = self.active.remove(&id) {
                self.finished.push(region);
            }
        }
    }
}

/// Scan a whole source and return every region in completion order.
#[cfg(test)]
pub fn accumulate<S: CellSource + ?Sized>(
    source: &S,
    order: ScanOrder,
    nodata: Option<CellValue>,
) -> Vec<Region> {
    let mut acc = Accumulator::new(order, source.width(), source.height(), nodata);
    let mut regions = Vec::new();
    while acc.scan_line(source) {
        regions.extend(acc.take_finished());
    }
    acc.finish();
    regions.extend(acc.take_finished());
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Grid;

    const ND: CellValue = -1;

    fn regions_of(rows: &[&[CellValue]], order: ScanOrder) -> Vec<Region> {
        let grid = Grid::from_rows(rows).unwrap();
        accumulate(&grid, order, Some(ND))
    }

    fn statuses(region: &Region) -> Vec<(Cell, PointStatus)> {
        region
            .boundary
            .ids()
            .map(|id| (region.boundary.cell(id), region.boundary.status(id)))
            .collect()
    }

    #[test]
    fn solid_block_keeps_only_its_rim() {
        let row: &[CellValue] = &[3, 3, 3, 3];
        let regions = regions_of(&[row, row, row, row], ScanOrder::ColumnMajor);
        assert_eq!(regions.len(), 1);
        let r = &regions[0];
        assert_eq!(r.cell_count, 16);
        assert_eq!(r.boundary.len(), 12);
        assert!(!r.boundary.contains(Cell::new(1, 1)));
        assert!(!r.boundary.contains(Cell::new(2, 2)));
        assert!(statuses(r)
            .iter()
            .all(|(_, s)| *s == PointStatus::EdgeConfirmed));
        assert!(r.done);
        assert!(r.window.len() <= 2);
    }

    #[test]
    fn nodata_is_never_assigned() {
        let regions = regions_of(&[&[ND, ND], &[ND, 4]], ScanOrder::RowMajor);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].value, 4);
        assert_eq!(regions[0].origin, Cell::new(1, 1));
    }

    #[test]
    fn different_values_split_regions() {
        let regions = regions_of(&[&[9, 2, 9]], ScanOrder::ColumnMajor);
        let values: Vec<CellValue> = regions.iter().map(|r| r.value).collect();
        assert_eq!(regions.len(), 3);
        assert_eq!(values.iter().filter(|&&v| v == 9).count(), 2);
    }

    #[test]
    fn gap_cells_are_recorded_and_flagged() {
        let regions = regions_of(
            &[&[7, 7, 7], &[7, ND, 7], &[7, 7, 7]],
            ScanOrder::ColumnMajor,
        );
        assert_eq!(regions.len(), 1);
        let r = &regions[0];
        assert_eq!(r.gaps, vec![GapRun { line: 1, lo: 1, hi: 1 }]);
        for cell in [Cell::new(1, 0), Cell::new(1, 2), Cell::new(0, 1), Cell::new(2, 1)] {
            let id = r.boundary.get(cell).unwrap();
            assert_eq!(r.boundary.status(id), PointStatus::AbuttingHole, "{cell:?}");
        }
        assert_eq!(r.boundary.len(), 8);
    }

    #[test]
    fn late_contact_does_not_merge() {
        // Two 5-valued columns that only meet on the last row.
        let regions = regions_of(
            &[&[5, 0, 5], &[5, 0, 5], &[5, 5, 5]],
            ScanOrder::RowMajor,
        );
        let fives: Vec<&Region> = regions.iter().filter(|r| r.value == 5).collect();
        assert_eq!(fives.len(), 2);
        assert_eq!(fives.iter().map(|r| r.cell_count).sum::<usize>(), 7);
    }

    #[test]
    fn regions_complete_while_scanning() {
        let row: [CellValue; 4] = [1, 0, 0, 2];
        let grid = Grid::from_rows(&[row, row]).unwrap();
        let mut acc = Accumulator::new(ScanOrder::ColumnMajor, grid.width(), grid.height(), Some(0));
        assert!(acc.scan_line(&grid));
        assert!(acc.take_finished().is_empty());
        assert!(acc.scan_line(&grid));
        let done = acc.take_finished();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].value, 1);
        assert!(acc.scan_line(&grid));
        assert!(acc.scan_line(&grid));
        assert!(!acc.scan_line(&grid));
        acc.finish();
        assert_eq!(acc.take_finished().len(), 1);
        assert_eq!(acc.active_count(), 0);
    }
}
