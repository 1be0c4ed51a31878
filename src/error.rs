use thiserror::Error;

use crate::vectorize::RegionId;

/// Errors that can occur while polygonizing a raster.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PolygonizeError {
    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("raster has no cells")]
    EmptyRaster,

    #[error("size mismatch: expected {expected} cells, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The boundary walker ran out of legal moves before closing the ring.
    /// Points at an inconsistent boundary index, not at bad input data.
    #[error("malformed adjacency in region {region} at ({x}, {y})")]
    MalformedAdjacency { region: RegionId, x: i32, y: i32 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
