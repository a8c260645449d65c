// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Geometry extraction from GeoJSON feature collections.
//!
//! Turns raw FeatureCollection bytes into per-feature MultiPolygon ring sets.
//! Only MultiPolygon geometries contribute polygons; any other feature still
//! keeps its index so that palette slots line up with collection order.

use geojson::GeoJson;
use log::debug;
use thiserror::Error;

/// Errors that can occur while extracting geometry.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("feature data is empty")]
    Empty,

    #[error("malformed GeoJSON: {0}")]
    Malformed(String),

    #[error("expected a FeatureCollection, found a {0}")]
    NotFeatureCollection(&'static str),

    #[error("feature {feature}: position with {len} value(s), expected at least 2")]
    InvalidPosition { feature: usize, len: usize },
}

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    /// Coordinate from longitude and latitude in degrees.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Ordered sequence of coordinates. The last point repeats the first.
pub type Ring = Vec<LonLat>;

/// A polygon as an outer boundary followed by zero or more holes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    /// The outer boundary, if the polygon has any ring at all.
    #[must_use]
    pub fn outer(&self) -> Option<&[LonLat]> {
        self.rings.first().map(Vec::as_slice)
    }
}

/// The polygons of one feature, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feature {
    pub polygons: Vec<Polygon>,
}

/// Ordered, immutable list of extracted features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    /// Wrap already extracted features.
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Number of features, including those without polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features in document order.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Parse FeatureCollection bytes into per-feature ring sets.
pub fn extract(input: &[u8]) -> Result<FeatureCollection, ParseError> {
    if input.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::Empty);
    }

    let text = std::str::from_utf8(input).map_err(|e| ParseError::Malformed(e.to_string()))?;
    let document: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| ParseError::Malformed(e.to_string()))?;

    let collection = match document {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(_) => return Err(ParseError::NotFeatureCollection("Feature")),
        GeoJson::Geometry(_) => return Err(ParseError::NotFeatureCollection("Geometry")),
    };

    let features = collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| convert_feature(index, feature))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureCollection::new(features))
}

fn convert_feature(index: usize, feature: geojson::Feature) -> Result<Feature, ParseError> {
    let Some(geometry) = feature.geometry else {
        debug!("feature {index} has no geometry");
        return Ok(Feature::default());
    };

    let geojson::Value::MultiPolygon(polygons) = geometry.value else {
        debug!("feature {index} is not a MultiPolygon, skipping its geometry");
        return Ok(Feature::default());
    };

    let polygons = polygons
        .into_iter()
        .map(|rings| {
            rings
                .into_iter()
                .map(|ring| convert_ring(index, &ring))
                .collect::<Result<Vec<_>, _>>()
                .map(|rings| Polygon { rings })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Feature { polygons })
}

fn convert_ring(feature: usize, ring: &[geojson::Position]) -> Result<Ring, ParseError> {
    ring.iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok(LonLat::new(*lon, *lat)),
            other => Err(ParseError::InvalidPosition {
                feature,
                len: other.len(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FEATURES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"name": "first"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]],
                         [[0.2, 0.2], [0.4, 0.2], [0.4, 0.4], [0.2, 0.2]]],
                        [[[5, 5], [6, 5], [6, 6], [5, 5]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "Point", "coordinates": [10, 10]}
            }
        ]
    }"#;

    #[test]
    fn test_extract_feature_collection() {
        let collection = extract(TWO_FEATURES.as_bytes()).unwrap();
        assert_eq!(collection.len(), 2);

        let first = &collection.features()[0];
        assert_eq!(first.polygons.len(), 2);
        assert_eq!(first.polygons[0].rings.len(), 2);

        let outer = first.polygons[0].outer().unwrap();
        assert_eq!(outer.len(), 5);
        assert_eq!(outer[1], LonLat::new(1.0, 0.0));
    }

    #[test]
    fn test_non_multipolygon_keeps_its_index() {
        let collection = extract(TWO_FEATURES.as_bytes()).unwrap();
        assert!(collection.features()[1].polygons.is_empty());
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        assert!(matches!(extract(b""), Err(ParseError::Empty)));
        assert!(matches!(extract(b"  \n"), Err(ParseError::Empty)));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            extract(b"{\"type\": \"FeatureCollection\""),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_bare_geometry_is_rejected() {
        let input = br#"{"type": "Point", "coordinates": [1, 2]}"#;
        assert!(matches!(
            extract(input),
            Err(ParseError::NotFeatureCollection("Geometry"))
        ));
    }

    #[test]
    fn test_extra_position_values_are_ignored() {
        let input = br#"{"type": "FeatureCollection", "features": [{
            "type": "Feature", "properties": null,
            "geometry": {"type": "MultiPolygon",
                "coordinates": [[[[30, 50, 120], [31, 50, 80], [31, 51, 0], [30, 50, 120]]]]}
        }]}"#;
        let collection = extract(input).unwrap();
        let outer = collection.features()[0].polygons[0].outer().unwrap();
        assert_eq!(outer[2], LonLat::new(31.0, 51.0));
    }
}
