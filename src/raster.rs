//! Read-only cell sources.
//!
//! The vectorizer only ever asks for `value_at(x, y)` in scan order, so
//! anything that can answer that (a tiled store, a decoded image, a test
//! grid) can feed it.

use crate::error::PolygonizeError;

/// Value carried by a raster cell.
pub type CellValue = i64;

/// A read-only grid of cell values with declared dimensions.
pub trait CellSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Value at `(x, y)`. Only called with in-bounds coordinates.
    fn value_at(&self, x: u32, y: u32) -> CellValue;
}

impl<S: CellSource + ?Sized> CellSource for &S {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn value_at(&self, x: u32, y: u32) -> CellValue {
        (**self).value_at(x, y)
    }
}

/// Row-major in-memory raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    data: Vec<CellValue>,
}

impl Grid {
    pub fn from_vec(width: u32, height: u32, data: Vec<CellValue>) -> Result<Self, PolygonizeError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or(PolygonizeError::SizeMismatch {
                expected: usize::MAX,
                actual: data.len(),
            })?;
        if data.len() != expected {
            return Err(PolygonizeError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn filled(width: u32, height: u32, value: CellValue) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    /// Build from equally long rows, top row first.
    pub fn from_rows<R: AsRef<[CellValue]>>(rows: &[R]) -> Result<Self, PolygonizeError> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.as_ref().len()) as u32;
        let data: Vec<CellValue> = rows.iter().flat_map(|r| r.as_ref().iter().copied()).collect();
        Self::from_vec(width, height, data)
    }

    pub fn set(&mut self, x: u32, y: u32, value: CellValue) {
        let idx = y as usize * self.width as usize + x as usize;
        self.data[idx] = value;
    }

    pub fn data(&self) -> &[CellValue] {
        &self.data
    }
}

impl CellSource for Grid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn value_at(&self, x: u32, y: u32) -> CellValue {
        self.data[y as usize * self.width as usize + x as usize]
    }
}

/// Decode an image file into a [`Grid`].
#[cfg(feature = "image")]
pub fn load_image(path: &std::path::Path, band: crate::config::Band) -> Result<Grid, PolygonizeError> {
    use crate::config::Band;

    let img = image::ImageReader::open(path)
        .map_err(|e| PolygonizeError::ImageLoad(e.to_string()))?
        .decode()
        .map_err(|e| PolygonizeError::ImageLoad(e.to_string()))?;

    let (width, height) = (img.width(), img.height());
    let data: Vec<CellValue> = match band {
        Band::Luma => img.into_luma8().pixels().map(|p| p.0[0] as CellValue).collect(),
        Band::Rgb => img
            .into_rgb8()
            .pixels()
            .map(|p| ((p.0[0] as CellValue) << 16) | ((p.0[1] as CellValue) << 8) | p.0[2] as CellValue)
            .collect(),
    };
    log::info!("Load        {}x{} px, {:?} band", width, height, band);

    Grid::from_vec(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_row_major() {
        let rows: [[CellValue; 3]; 2] = [[1, 2, 3], [4, 5, 6]];
        let grid = Grid::from_rows(&rows).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.value_at(2, 0), 3);
        assert_eq!(grid.value_at(0, 1), 4);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows: Vec<Vec<CellValue>> = vec![vec![1, 2], vec![3]];
        let err = Grid::from_rows(&rows).unwrap_err();
        assert!(matches!(err, PolygonizeError::SizeMismatch { expected: 4, actual: 3 }));
    }

    #[cfg(feature = "image")]
    #[test]
    fn loads_png_luma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        let mut img = image::GrayImage::new(3, 2);
        img.put_pixel(1, 1, image::Luma([200]));
        img.save(&path).unwrap();

        let grid = load_image(&path, crate::config::Band::Luma).unwrap();
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert_eq!(grid.value_at(1, 1), 200);
        assert_eq!(grid.value_at(0, 0), 0);
    }
}
