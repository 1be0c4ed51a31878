//! Where finalized polygons go.

mod geojson;

pub use geojson::GeoJsonWriter;

use crate::error::PolygonizeError;
use crate::PolygonFeature;

/// Receives polygon features in region completion order.
pub trait FeatureSink {
    fn accept(&mut self, feature: PolygonFeature) -> Result<(), PolygonizeError>;

    /// Called once after the last feature.
    fn finish(&mut self) -> Result<(), PolygonizeError> {
        Ok(())
    }
}

impl FeatureSink for Vec<PolygonFeature> {
    fn accept(&mut self, feature: PolygonFeature) -> Result<(), PolygonizeError> {
        self.push(feature);
        Ok(())
    }
}

impl<K: FeatureSink + ?Sized> FeatureSink for &mut K {
    fn accept(&mut self, feature: PolygonFeature) -> Result<(), PolygonizeError> {
        (**self).accept(feature)
    }

    fn finish(&mut self) -> Result<(), PolygonizeError> {
        (**self).finish()
    }
}
