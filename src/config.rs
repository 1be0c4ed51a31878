use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PolygonizeError;
use crate::geom::Cell;
use crate::raster::CellValue;

/// All polygonization parameters in one struct.
/// Serializable so presets can be kept in TOML files next to the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonizeConfig {
    // -- Accumulation stage --
    /// Cell value that is never assigned to any region.
    pub nodata: Option<CellValue>,
    /// Order in which scan lines are read.
    pub scan_order: ScanOrder,
    /// Regions made of fewer cells than this are not emitted.
    pub min_cells: usize,

    // -- Finalization stage --
    /// Finalize regions on the rayon pool instead of streaming them one by one.
    /// Output order is the same either way.
    pub parallel: bool,

    // -- Output --
    /// Cell-corner grid to world coordinates.
    pub transform: GeoTransform,
    /// Wind exteriors CCW and holes CW in world coordinates.
    pub fix_direction: bool,
    /// Drop ring corners that sit in the middle of a straight run.
    pub merge_collinear: bool,
    /// How image pixels become cell values (only used when loading images).
    pub band: Band,
}

impl Default for PolygonizeConfig {
    fn default() -> Self {
        Self {
            nodata: None,
            scan_order: ScanOrder::ColumnMajor,
            min_cells: 1,
            parallel: false,
            transform: GeoTransform::default(),
            fix_direction: true,
            merge_collinear: false,
            band: Band::Luma,
        }
    }
}

impl PolygonizeConfig {
    /// Load a preset from a TOML file. Missing keys fall back to defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, PolygonizeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, PolygonizeError> {
        let config: Self = toml::from_str(text).map_err(|e| PolygonizeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PolygonizeError> {
        let t = &self.transform;
        if t.pixel_width == 0.0 || t.pixel_height == 0.0 {
            return Err(PolygonizeError::Config("pixel size must be non-zero".into()));
        }
        if !(t.origin_x.is_finite() && t.origin_y.is_finite()) {
            return Err(PolygonizeError::Config("origin must be finite".into()));
        }
        Ok(())
    }
}

/// Which axis a scan line runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScanOrder {
    /// One scan line per column: x is the line, y the position within it.
    #[default]
    ColumnMajor,
    /// One scan line per row: y is the line, x the position within it.
    RowMajor,
}

impl ScanOrder {
    /// Number of scan lines in a `width` x `height` raster.
    pub fn line_count(self, width: u32, height: u32) -> u32 {
        match self {
            Self::ColumnMajor => width,
            Self::RowMajor => height,
        }
    }

    /// Number of cells in each scan line.
    pub fn line_len(self, width: u32, height: u32) -> u32 {
        match self {
            Self::ColumnMajor => height,
            Self::RowMajor => width,
        }
    }

    /// Grid cell at position `pos` of scan line `line`.
    pub fn cell(self, line: u32, pos: u32) -> Cell {
        match self {
            Self::ColumnMajor => Cell::new(line as i32, pos as i32),
            Self::RowMajor => Cell::new(pos as i32, line as i32),
        }
    }

    /// Inverse of [`ScanOrder::cell`]. `None` for cells left of or above the raster.
    pub fn split(self, cell: Cell) -> Option<(u32, u32)> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        let (x, y) = (cell.x as u32, cell.y as u32);
        Some(match self {
            Self::ColumnMajor => (x, y),
            Self::RowMajor => (y, x),
        })
    }
}

/// Affine mapping from the cell-corner grid to world coordinates.
///
/// Corner `(cx, cy)` maps to
/// `(origin_x + cx * pixel_width, origin_y + cy * pixel_height)`.
/// North-up rasters usually carry a negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            pixel_width: 1.0,
            pixel_height: 1.0,
        }
    }
}

impl GeoTransform {
    pub fn apply(&self, corner: (i32, i32)) -> kurbo::Point {
        kurbo::Point::new(
            self.origin_x + corner.0 as f64 * self.pixel_width,
            self.origin_y + corner.1 as f64 * self.pixel_height,
        )
    }
}

/// Pixel-to-value conversion for image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Band {
    /// 8-bit luminance.
    #[default]
    Luma,
    /// 24-bit color packed as 0xRRGGBB.
    Rgb,
}
