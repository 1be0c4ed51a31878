//! raster2poly: raster cells → polygon rings.
//!
//! Scans a grid of cell values one line at a time, grows 4-connected
//! regions of equal value, and turns each completed region into a closed
//! exterior ring plus hole rings in world coordinates.
//!
//! # Example
//!
//! ```
//! use raster2poly::{polygonize, Grid, PolygonizeConfig};
//!
//! let grid = Grid::from_vec(3, 3, vec![0, 0, 0, 0, 5, 0, 0, 0, 0])?;
//! let config = PolygonizeConfig { nodata: Some(0), ..Default::default() };
//! let result = polygonize(&grid, &config)?;
//! assert_eq!(result.features.len(), 1);
//! assert_eq!(result.features[0].value, 5);
//! # Ok::<(), raster2poly::PolygonizeError>(())
//! ```

#![forbid(unsafe_code)]

mod cleanup;
mod config;
mod geom;
mod raster;
mod vectorize;

pub mod error;
pub mod output;

// Re-export kurbo so downstream users get the same version
// used by PolygonFeature rings.
pub use kurbo;

pub use config::{Band, GeoTransform, PolygonizeConfig, ScanOrder};
pub use error::PolygonizeError;
pub use output::{FeatureSink, GeoJsonWriter};
pub use raster::{CellSource, CellValue, Grid};
pub use vectorize::RegionId;

#[cfg(feature = "image")]
pub use raster::load_image;

use kurbo::{BezPath, Point};

/// One finalized region: an exterior ring, its hole rings and the regions
/// found inside those holes.
///
/// Rings are closed (first point == last point) and in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    pub region: RegionId,
    /// Cell value shared by every cell of the region.
    pub value: CellValue,
    pub exterior: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
    /// Regions whose cells lie in one of the holes, innermost container only.
    pub nested: Vec<RegionId>,
    pub cell_count: usize,
}

impl PolygonFeature {
    /// All rings as one path, exterior first, each ring a closed subpath.
    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        for ring in std::iter::once(&self.exterior).chain(&self.holes) {
            // The closing point is implied by ClosePath.
            let open = match ring.split_last() {
                Some((last, rest)) if rest.first() == Some(last) => rest,
                _ => ring.as_slice(),
            };
            let mut points = open.iter();
            if let Some(&first) = points.next() {
                path.move_to(first);
                for &p in points {
                    path.line_to(p);
                }
                path.close_path();
            }
        }
        path
    }
}

/// A region that could not be traced. The run carries on without it.
#[derive(Debug)]
pub struct RegionFailure {
    pub region: RegionId,
    pub value: CellValue,
    pub error: PolygonizeError,
}

/// Counts from one [`polygonize_into`] run.
#[derive(Debug, Default)]
pub struct PolygonizeSummary {
    /// Regions completed by the scan.
    pub regions: usize,
    /// Features handed to the sink.
    pub features: usize,
    /// Regions below `min_cells`.
    pub skipped: usize,
    pub failures: Vec<RegionFailure>,
}

/// Every feature of a raster, plus the regions that failed.
#[derive(Debug, Default)]
pub struct PolygonizeResult {
    pub features: Vec<PolygonFeature>,
    pub failures: Vec<RegionFailure>,
}

/// Polygonize `source` and collect the features in completion order.
pub fn polygonize<S: CellSource + ?Sized>(
    source: &S,
    config: &PolygonizeConfig,
) -> Result<PolygonizeResult, PolygonizeError> {
    let mut features = Vec::new();
    let summary = polygonize_into(source, config, &mut features)?;
    Ok(PolygonizeResult {
        features,
        failures: summary.failures,
    })
}

/// Polygonize `source`, streaming each feature into `sink` as soon as its
/// region is complete.
pub fn polygonize_into<S, K>(
    source: &S,
    config: &PolygonizeConfig,
    sink: &mut K,
) -> Result<PolygonizeSummary, PolygonizeError>
where
    S: CellSource + ?Sized,
    K: FeatureSink + ?Sized,
{
    config.validate()?;
    if source.width() == 0 || source.height() == 0 {
        return Err(PolygonizeError::EmptyRaster);
    }
    vectorize::run(source, config, sink)
}

/// Convenience: load an image with `config.band` and polygonize it.
#[cfg(feature = "image")]
pub fn polygonize_file(
    path: &std::path::Path,
    config: &PolygonizeConfig,
) -> Result<PolygonizeResult, PolygonizeError> {
    let grid = raster::load_image(path, config.band)?;
    polygonize(&grid, config)
}
