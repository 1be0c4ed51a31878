//! Streaming GeoJSON FeatureCollection writer.
//!
//! Each feature is written as soon as it arrives; the collection is closed
//! by [`FeatureSink::finish`].

use std::io::Write;

use kurbo::Point;
use serde_json::{json, Value};

use super::FeatureSink;
use crate::error::PolygonizeError;
use crate::PolygonFeature;

pub struct GeoJsonWriter<W: Write> {
    out: W,
    written: usize,
    started: bool,
    closed: bool,
}

impl<W: Write> GeoJsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            written: 0,
            started: false,
            closed: false,
        }
    }

    /// Number of features written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Give back the underlying writer. Call [`FeatureSink::finish`] first.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn start(&mut self) -> Result<(), PolygonizeError> {
        if !self.started {
            write!(self.out, r#"{{"type":"FeatureCollection","features":["#)?;
            self.started = true;
        }
        Ok(())
    }
}

fn ring_coords(ring: &[Point]) -> Value {
    Value::Array(ring.iter().map(|p| json!([p.x, p.y])).collect())
}

/// GeoJSON `Feature` for one polygon; the exterior ring comes first.
pub fn feature_json(feature: &PolygonFeature) -> Value {
    let mut rings = Vec::with_capacity(1 + feature.holes.len());
    rings.push(ring_coords(&feature.exterior));
    rings.extend(feature.holes.iter().map(|h| ring_coords(h)));
    json!({
        "type": "Feature",
        "id": feature.region,
        "geometry": {
            "type": "Polygon",
            "coordinates": rings,
        },
        "properties": {
            "region": feature.region,
            "value": feature.value,
            "cells": feature.cell_count,
            "nested": feature.nested,
        },
    })
}

impl<W: Write> FeatureSink for GeoJsonWriter<W> {
    fn accept(&mut self, feature: PolygonFeature) -> Result<(), PolygonizeError> {
        self.start()?;
        if self.written > 0 {
            self.out.write_all(b",")?;
        }
        self.out.write_all(b"\n")?;
        serde_json::to_writer(&mut self.out, &feature_json(&feature))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), PolygonizeError> {
        if self.closed {
            return Ok(());
        }
        self.start()?;
        writeln!(self.out, "\n]}}")?;
        self.out.flush()?;
        self.closed = true;
        log::info!("wrote {} GeoJSON features", self.written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(region: u32, value: i64) -> PolygonFeature {
        let ring = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)];
        PolygonFeature {
            region,
            value,
            exterior: ring.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            holes: Vec::new(),
            nested: Vec::new(),
            cell_count: 1,
        }
    }

    #[test]
    fn empty_collection_is_valid_json() {
        let mut writer = GeoJsonWriter::new(Vec::new());
        writer.finish().unwrap();
        let doc: Value = serde_json::from_slice(&writer.into_inner()).unwrap();
        assert_eq!(doc["type"], "FeatureCollection");
        assert_eq!(doc["features"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn features_carry_region_properties() {
        let mut writer = GeoJsonWriter::new(Vec::new());
        writer.accept(square(0, 5)).unwrap();
        let mut second = square(1, 9);
        second.nested = vec![0];
        writer.accept(second).unwrap();
        writer.finish().unwrap();
        assert_eq!(writer.written(), 2);

        let doc: Value = serde_json::from_slice(&writer.into_inner()).unwrap();
        let features = doc["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[1]["properties"]["value"], 9);
        assert_eq!(features[1]["properties"]["nested"], json!([0]));
        let ring = &features[0]["geometry"]["coordinates"][0];
        assert_eq!(ring.as_array().unwrap().len(), 5);
        assert_eq!(ring[2], json!([1.0, 1.0]));
    }
}
