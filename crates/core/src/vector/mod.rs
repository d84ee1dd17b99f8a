//! GeoJSON feature model used to hand boundaries to the prediction service.
//!
//! Coordinates follow the GeoJSON convention: `[longitude, latitude]`.

use std::collections::BTreeMap;

use geo_types::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// GeoJSON geometry. Only polygons are produced or accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon {
        /// Rings of `[lng, lat]` positions; the first ring is the exterior.
        coordinates: Vec<Vec<[f64; 2]>>,
    },
}

impl Geometry {
    /// Exterior ring of a polygon geometry.
    pub fn exterior(&self) -> Option<&[[f64; 2]]> {
        match self {
            Self::Polygon { coordinates } => coordinates.first().map(Vec::as_slice),
        }
    }
}

impl From<&Polygon<f64>> for Geometry {
    fn from(polygon: &Polygon<f64>) -> Self {
        let ring = |ls: &LineString<f64>| ls.coords().map(|c| [c.x, c.y]).collect::<Vec<_>>();
        let mut coordinates = vec![ring(polygon.exterior())];
        coordinates.extend(polygon.interiors().iter().map(ring));
        Self::Polygon { coordinates }
    }
}

impl TryFrom<&Geometry> for Polygon<f64> {
    type Error = Error;

    fn try_from(geometry: &Geometry) -> Result<Self> {
        let Geometry::Polygon { coordinates } = geometry;
        let mut rings = coordinates.iter().map(|ring| {
            ring.iter()
                .map(|&[x, y]| Coord { x, y })
                .collect::<LineString<f64>>()
        });
        let exterior = rings
            .next()
            .ok_or_else(|| Error::UnsupportedGeometry("polygon without rings".into()))?;
        Ok(Polygon::new(exterior, rings.collect()))
    }
}

/// A GeoJSON feature with geometry and attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub type_: String,

    /// Optional feature ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Feature attributes
    #[serde(default)]
    pub properties: BTreeMap<String, AttributeValue>,

    /// Feature geometry (`null` is valid GeoJSON)
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            properties: BTreeMap::new(),
            geometry: Some(geometry),
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            properties: BTreeMap::new(),
            geometry: None,
        }
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// The feature geometry as a `geo_types` polygon, if it has one.
    pub fn polygon(&self) -> Option<Result<Polygon<f64>>> {
        self.geometry.as_ref().map(Polygon::try_from)
    }
}

/// Collection of features (GeoJSON `FeatureCollection`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<Feature>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    /// Collection holding exactly one feature.
    pub fn single(feature: Feature) -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: vec![feature],
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Parse a GeoJSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize to a compact GeoJSON string.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
            vec![],
        )
    }

    #[test]
    fn polygon_to_geometry_is_closed() {
        let geom = Geometry::from(&square());
        let ring = geom.exterior().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn feature_serializes_as_geojson() {
        let feature = Feature::new(Geometry::from(&square()));
        let value = serde_json::to_value(FeatureCollection::single(feature)).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["properties"], json!({}));
        assert_eq!(value["features"][0]["geometry"]["type"], "Polygon");
        assert_eq!(
            value["features"][0]["geometry"]["coordinates"][0][1],
            json!([1.0, 0.0])
        );
        assert!(value["features"][0].get("id").is_none());
    }

    #[test]
    fn parse_feature_collection() {
        let src = r#"{
          "type": "FeatureCollection",
          "features": [{
            "type": "Feature",
            "properties": {"name": "ugb", "zones": 3, "ratio": 0.5, "draft": false, "note": null},
            "geometry": {"type": "Polygon", "coordinates": [[[10, 10], [20, 10], [20, 20], [10, 10]]]}
          }]
        }"#;
        let fc = FeatureCollection::from_json_str(src).unwrap();
        assert_eq!(fc.len(), 1);
        let feature = &fc.features[0];
        assert_eq!(
            feature.get_property("name"),
            Some(&AttributeValue::String("ugb".into()))
        );
        assert_eq!(feature.get_property("zones"), Some(&AttributeValue::Int(3)));
        assert_eq!(feature.get_property("ratio"), Some(&AttributeValue::Float(0.5)));
        assert_eq!(feature.get_property("draft"), Some(&AttributeValue::Bool(false)));
        assert_eq!(feature.get_property("note"), Some(&AttributeValue::Null));

        let polygon = feature.polygon().unwrap().unwrap();
        assert_eq!(polygon.exterior().0.len(), 4);
    }

    #[test]
    fn null_geometry_round_trips() {
        let json = serde_json::to_string(&Feature::empty()).unwrap();
        assert!(json.contains("\"geometry\":null"));
        let back: Feature = serde_json::from_str(&json).unwrap();
        assert!(back.polygon().is_none());
    }

    #[test]
    fn unsupported_geometry_type_is_rejected() {
        let src = r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#;
        assert!(serde_json::from_str::<Geometry>(src).is_err());
    }

    #[test]
    fn empty_polygon_is_rejected() {
        let geom = Geometry::Polygon { coordinates: vec![] };
        assert!(matches!(
            Polygon::try_from(&geom),
            Err(Error::UnsupportedGeometry(_))
        ));
    }
}
