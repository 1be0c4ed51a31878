//! Vectorization pipeline: raster cells → polygon rings.
//!
//! 1. Streaming region accumulation (bounded scan-line window)
//! 2. Hole classification on each completed region
//! 3. Boundary walk over the surviving edge points
//! 4. Corner stroking and world-coordinate transform
//!
//! Regions are finalized the moment the accumulator completes them, so
//! features reach the sink while the scan is still running.

pub mod accumulate;
pub mod holes;
pub mod region;
pub mod sorter;
pub mod stroke;
pub mod walk;

use std::collections::HashSet;
use std::time::Instant;

use kurbo::Point;
use rayon::prelude::*;

pub use region::RegionId;

use crate::cleanup;
use crate::config::{PolygonizeConfig, ScanOrder};
use crate::error::PolygonizeError;
use crate::geom::{doubled_area, Cell};
use crate::output::FeatureSink;
use crate::raster::CellSource;
use crate::{PolygonFeature, PolygonizeSummary, RegionFailure};

use accumulate::Accumulator;
use holes::Hole;
use region::{BoundaryIndex, Region};

/// Regions buffered per rayon batch, per worker thread.
const BATCH_PER_THREAD: usize = 4;

/// No legal move was left at `at` while walking or stroking a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacencyFault {
    pub at: Cell,
}

/// A region turned into rings, before containment is known.
#[derive(Debug)]
struct Finalized {
    feature: PolygonFeature,
    origin: Cell,
    holes: Vec<Hole>,
}

/// Walk and stroke one ring of `index` starting at `origin`.
fn trace_ring(index: &BoundaryIndex, origin: region::PointId) -> Result<Vec<(i32, i32)>, AdjacencyFault> {
    let traversal = walk::walk(index, origin)?;
    stroke::stroke(&traversal.cells(index))
}

fn to_world(ring: &[(i32, i32)], config: &PolygonizeConfig) -> Vec<Point> {
    let ring = if config.merge_collinear {
        cleanup::merge_collinear(ring)
    } else {
        ring.to_vec()
    };
    ring.iter().map(|&c| config.transform.apply(c)).collect()
}

/// Resolve holes, trace every ring of a completed region and map it to world
/// coordinates. `Ok(None)` means the region is below `min_cells`.
fn finalize(
    mut region: Region,
    width: u32,
    height: u32,
    config: &PolygonizeConfig,
) -> Result<Option<Finalized>, RegionFailure> {
    if region.cell_count < config.min_cells {
        return Ok(None);
    }
    let (id, value) = (region.id, region.value);
    let failure = |fault: AdjacencyFault| RegionFailure {
        region: id,
        value,
        error: PolygonizeError::MalformedAdjacency {
            region: id,
            x: fault.at.x,
            y: fault.at.y,
        },
    };

    let resolution = holes::resolve(&mut region, config.scan_order, width, height);

    let origin = region
        .boundary
        .get(region.origin)
        .ok_or_else(|| failure(AdjacencyFault { at: region.origin }))?;
    let exterior = trace_ring(&region.boundary, origin).map_err(failure)?;

    let mut hole_rings = Vec::with_capacity(resolution.holes.len());
    if region.has_holes {
        for hole in &resolution.holes {
            let index = hole.rim();
            // Same start rule as regions: first cell in scan order.
            let start = match config.scan_order {
                ScanOrder::ColumnMajor => index.first_by_column(),
                ScanOrder::RowMajor => index.first_by_row(),
            };
            let Some(start) = start else {
                continue;
            };
            let mut ring = trace_ring(&index, start).map_err(failure)?;
            ring.reverse();
            hole_rings.push(ring);
        }
    }

    let enclosed = doubled_area(&exterior).abs() - hole_rings.iter().map(|r| doubled_area(r).abs()).sum::<i64>();
    let mut exterior = to_world(&exterior, config);
    let mut holes: Vec<Vec<Point>> = hole_rings.iter().map(|r| to_world(r, config)).collect();
    if config.fix_direction {
        cleanup::orient(&mut exterior, true);
        for ring in &mut holes {
            cleanup::orient(ring, false);
        }
    }

    log::debug!(
        "region {id} (value {value}): {} cells, enclosed area {}, {} exterior corners, {} holes ({} cells, {} inner-rim points)",
        region.cell_count,
        enclosed / 2,
        exterior.len(),
        holes.len(),
        resolution.holes.iter().map(Hole::cell_count).sum::<usize>(),
        resolution.hole_points.len()
    );

    Ok(Some(Finalized {
        feature: PolygonFeature {
            region: id,
            value,
            exterior,
            holes,
            nested: Vec::new(),
            cell_count: region.cell_count,
        },
        origin: region.origin,
        holes: resolution.holes,
    }))
}

/// Emitted regions not yet claimed by an enclosing region.
///
/// A region inside a hole always completes before the region around it, so
/// a single pass in completion order assigns each region to its innermost
/// container.
#[derive(Debug, Default)]
struct Containment {
    unclaimed: Vec<(RegionId, Cell)>,
}

impl Containment {
    fn place(&mut self, finalized: Finalized) -> PolygonFeature {
        let Finalized {
            mut feature,
            origin,
            holes,
        } = finalized;
        if !holes.is_empty() {
            let nested: HashSet<RegionId> = self
                .unclaimed
                .iter()
                .filter(|&&(_, o)| holes.iter().any(|h| h.contains(o)))
                .map(|&(id, _)| id)
                .collect();
            self.unclaimed.retain(|(id, _)| !nested.contains(id));
            feature.nested = nested.into_iter().collect();
            feature.nested.sort_unstable();
        }
        self.unclaimed.push((feature.region, origin));
        feature
    }
}

struct Pipeline<'a, K: FeatureSink + ?Sized> {
    config: &'a PolygonizeConfig,
    width: u32,
    height: u32,
    sink: &'a mut K,
    containment: Containment,
    pending: Vec<Region>,
    batch: usize,
    summary: PolygonizeSummary,
}

impl<K: FeatureSink + ?Sized> Pipeline<'_, K> {
    fn push(&mut self, regions: Vec<Region>) -> Result<(), PolygonizeError> {
        if !self.config.parallel {
            for region in regions {
                let result = finalize(region, self.width, self.height, self.config);
                self.emit(result)?;
            }
            return Ok(());
        }
        self.pending.extend(regions);
        if self.pending.len() >= self.batch {
            self.flush()?;
        }
        Ok(())
    }

    /// Finalize the buffered regions on the rayon pool, emitting in buffer order.
    fn flush(&mut self) -> Result<(), PolygonizeError> {
        let (width, height, config) = (self.width, self.height, self.config);
        let results: Vec<_> = std::mem::take(&mut self.pending)
            .into_par_iter()
            .map(|region| finalize(region, width, height, config))
            .collect();
        for result in results {
            self.emit(result)?;
        }
        Ok(())
    }

    fn emit(&mut self, result: Result<Option<Finalized>, RegionFailure>) -> Result<(), PolygonizeError> {
        self.summary.regions += 1;
        match result {
            Ok(Some(finalized)) => {
                let feature = self.containment.place(finalized);
                self.summary.features += 1;
                self.sink.accept(feature)
            }
            Ok(None) => {
                self.summary.skipped += 1;
                Ok(())
            }
            Err(failure) => {
                log::warn!("region {} (value {}) dropped: {}", failure.region, failure.value, failure.error);
                self.summary.failures.push(failure);
                Ok(())
            }
        }
    }
}

/// Scan `source` and hand every finalized region to `sink` in completion order.
pub(crate) fn run<S, K>(
    source: &S,
    config: &PolygonizeConfig,
    sink: &mut K,
) -> Result<PolygonizeSummary, PolygonizeError>
where
    S: CellSource + ?Sized,
    K: FeatureSink + ?Sized,
{
    let t_start = Instant::now();
    let (width, height) = (source.width(), source.height());
    let order = config.scan_order;

    let mut acc = Accumulator::new(order, width, height, config.nodata);
    let mut pipeline = Pipeline {
        config,
        width,
        height,
        sink,
        containment: Containment::default(),
        pending: Vec::new(),
        batch: rayon::current_num_threads() * BATCH_PER_THREAD,
        summary: PolygonizeSummary::default(),
    };

    let mut peak_active = 0;
    while acc.scan_line(source) {
        peak_active = peak_active.max(acc.active_count());
        pipeline.push(acc.take_finished())?;
    }
    acc.finish();
    pipeline.push(acc.take_finished())?;
    pipeline.flush()?;
    pipeline.sink.finish()?;

    let summary = pipeline.summary;
    log::info!(
        "scanned {} lines ({:?}, at most {} regions open): {} regions -> {} features, {} skipped, {} failed ({}ms)",
        order.line_count(width, height),
        order,
        peak_active,
        summary.regions,
        summary.features,
        summary.skipped,
        summary.failures.len(),
        t_start.elapsed().as_millis()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{CellValue, Grid};

    const ND: CellValue = 0;

    fn finalize_all(grid: &Grid, config: &PolygonizeConfig) -> Vec<Finalized> {
        accumulate::accumulate(grid, config.scan_order, config.nodata)
            .into_iter()
            .filter_map(|r| finalize(r, grid.width(), grid.height(), config).unwrap())
            .collect()
    }

    fn config() -> PolygonizeConfig {
        PolygonizeConfig {
            nodata: Some(ND),
            fix_direction: false,
            ..PolygonizeConfig::default()
        }
    }

    #[test]
    fn raw_rings_wind_against_each_other() {
        let grid = Grid::from_rows(&[[3, 3, 3], [3, ND, 3], [3, 3, 3]]).unwrap();
        let done = finalize_all(&grid, &config());
        assert_eq!(done.len(), 1);
        let feature = &done[0].feature;
        assert_eq!(feature.holes.len(), 1);
        let ext = crate::geom::signed_area(&feature.exterior);
        let hole = crate::geom::signed_area(&feature.holes[0]);
        assert_eq!(ext, -9.0);
        assert_eq!(hole, 1.0);
    }

    #[test]
    fn small_regions_are_skipped() {
        let grid = Grid::from_rows(&[[1, ND, 2], [ND, ND, 2]]).unwrap();
        let config = PolygonizeConfig {
            min_cells: 2,
            ..config()
        };
        let done = finalize_all(&grid, &config);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].feature.value, 2);
    }

    #[test]
    fn island_is_nested_in_its_lake() {
        // Land (1) around a lake (2) around an island (3).
        let rows: [[CellValue; 5]; 5] = [
            [1, 1, 1, 1, 1],
            [1, 2, 2, 2, 1],
            [1, 2, 3, 2, 1],
            [1, 2, 2, 2, 1],
            [1, 1, 1, 1, 1],
        ];
        let grid = Grid::from_rows(&rows).unwrap();
        let config = PolygonizeConfig {
            nodata: None,
            ..config()
        };
        let mut containment = Containment::default();
        let features: Vec<PolygonFeature> = finalize_all(&grid, &config)
            .into_iter()
            .map(|f| containment.place(f))
            .collect();
        let by_value = |v: CellValue| features.iter().find(|f| f.value == v).unwrap();
        let (land, lake, island) = (by_value(1), by_value(2), by_value(3));
        assert_eq!(lake.nested, vec![island.region]);
        assert_eq!(land.nested, vec![lake.region]);
        assert!(island.nested.is_empty());
    }

    #[test]
    fn scan_orders_trace_the_same_outline() {
        let grid = Grid::from_rows(&[[5, 5, ND], [5, ND, ND], [5, 5, 5]]).unwrap();
        let area = |order: ScanOrder| {
            let config = PolygonizeConfig {
                scan_order: order,
                fix_direction: true,
                ..config()
            };
            let done = finalize_all(&grid, &config);
            assert_eq!(done.len(), 1);
            crate::geom::signed_area(&done[0].feature.exterior)
        };
        assert_eq!(area(ScanOrder::ColumnMajor), 6.0);
        assert_eq!(area(ScanOrder::RowMajor), 6.0);
    }
}
