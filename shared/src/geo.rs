use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LoadError;

/// Geographic coordinate in degrees. Serialized as a GeoJSON position `[lng, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

impl TryFrom<Vec<f64>> for LngLat {
    type Error = String;

    fn try_from(position: Vec<f64>) -> Result<Self, Self::Error> {
        match position.as_slice() {
            [lng, lat, ..] => Ok(Self::new(*lng, *lat)),
            _ => Err(format!(
                "position needs at least 2 numbers, got {}",
                position.len()
            )),
        }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(value: LngLat) -> Self {
        [value.lng, value.lat]
    }
}

/// GeoJSON geometry. Polygon rings: first exterior, the rest holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: LngLat },
    MultiPoint { coordinates: Vec<LngLat> },
    LineString { coordinates: Vec<LngLat> },
    MultiLineString { coordinates: Vec<Vec<LngLat>> },
    Polygon { coordinates: Vec<Vec<LngLat>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<LngLat>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    /// Visit every position in document order.
    pub fn for_each_position(&self, f: &mut impl FnMut(LngLat)) {
        match self {
            Self::Point { coordinates } => f(*coordinates),
            Self::MultiPoint { coordinates } | Self::LineString { coordinates } => {
                coordinates.iter().copied().for_each(f);
            }
            Self::MultiLineString { coordinates } | Self::Polygon { coordinates } => {
                for ring in coordinates {
                    ring.iter().copied().for_each(&mut *f);
                }
            }
            Self::MultiPolygon { coordinates } => {
                for polygon in coordinates {
                    for ring in polygon {
                        ring.iter().copied().for_each(&mut *f);
                    }
                }
            }
            Self::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.for_each_position(f);
                }
            }
        }
    }
}

/// Position of a feature in its collection (load order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub usize);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    /// The document's own `id` member, if any.
    pub source_id: Option<Value>,
    /// `None` for null, missing, or undecodable geometry.
    pub geometry: Option<Geometry>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(Value::as_str)
    }
}

/// Geographic extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    pub fn from_point(p: LngLat) -> Self {
        Self {
            west: p.lng,
            south: p.lat,
            east: p.lng,
            north: p.lat,
        }
    }

    pub fn extend(&mut self, p: LngLat) {
        self.west = self.west.min(p.lng);
        self.south = self.south.min(p.lat);
        self.east = self.east.max(p.lng);
        self.north = self.north.max(p.lat);
    }

}

/// Ordered, immutable set of features loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Feature>,
    malformed: usize,
}

impl FeatureCollection {
    pub fn from_json_str(text: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Decode a FeatureCollection document. Individual features never fail:
    /// anything undecodable keeps its slot with no geometry.
    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        let mut doc = match value {
            Value::Object(doc) => doc,
            other => return Err(LoadError::NotAnObject(json_kind(&other))),
        };
        let Some(Value::Array(raw_features)) = doc.remove("features") else {
            return Err(LoadError::MissingFeatures);
        };

        let mut malformed = 0;
        let features = raw_features
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                let (feature, ok) = decode_feature(FeatureId(idx), raw);
                if !ok {
                    malformed += 1;
                }
                feature
            })
            .collect();

        Ok(Self {
            features,
            malformed,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id.0)
    }

    /// Number of features whose geometry (or the feature itself) could not be decoded.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    /// Extent of every finite position, or `None` when there are none.
    pub fn bounds(&self) -> Option<GeoBounds> {
        let mut bounds: Option<GeoBounds> = None;
        for geometry in self.features.iter().filter_map(|f| f.geometry.as_ref()) {
            geometry.for_each_position(&mut |p| {
                if !p.is_finite() {
                    return;
                }
                match bounds.as_mut() {
                    Some(b) => b.extend(p),
                    None => bounds = Some(GeoBounds::from_point(p)),
                }
            });
        }
        bounds
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

fn decode_feature(id: FeatureId, raw: Value) -> (Feature, bool) {
    let Value::Object(mut obj) = raw else {
        return (
            Feature {
                id,
                source_id: None,
                geometry: None,
                properties: Map::new(),
            },
            false,
        );
    };

    let properties = match obj.remove("properties") {
        Some(Value::Object(props)) => props,
        _ => Map::new(),
    };
    let source_id = obj.remove("id");
    let (geometry, ok) = match obj.remove("geometry") {
        None | Some(Value::Null) => (None, true),
        Some(raw) => match serde_json::from_value::<Geometry>(raw) {
            Ok(geometry) => (Some(geometry), true),
            Err(_) => (None, false),
        },
    };

    (
        Feature {
            id,
            source_id,
            geometry,
            properties,
        },
        ok,
    )
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Small built-in dataset shown when no data URL is configured.
pub fn demo_collection() -> FeatureCollection {
    let doc = serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "Africa" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-6, 36], [33, 30], [43, 11], [51, 12], [29, -33],
                        [18, -35], [7, 5], [-17, 14], [-6, 36]
                    ]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Australia" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [143, -11], [153, -28], [144, -38], [131, -31], [116, -35],
                        [114, -22], [136, -12], [140, -17], [143, -11]
                    ]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Timbuktu" },
                "geometry": { "type": "Point", "coordinates": [-3.0026, 16.7666] }
            }
        ]
    });
    FeatureCollection::from_value(doc).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_features_in_order_with_index_ids() {
        let fc = FeatureCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "id": "a", "properties": { "name": "A" },
                  "geometry": { "type": "Point", "coordinates": [1.0, 2.0] } },
                { "type": "Feature", "properties": null,
                  "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] } }
            ]
        }))
        .unwrap();

        assert_eq!(fc.len(), 2);
        assert_eq!(fc.malformed(), 0);
        let first = fc.get(FeatureId(0)).unwrap();
        assert_eq!(first.name(), Some("A"));
        assert_eq!(first.source_id, Some(json!("a")));
        assert_eq!(
            first.geometry,
            Some(Geometry::Point {
                coordinates: LngLat::new(1.0, 2.0)
            })
        );
        assert_eq!(fc.get(FeatureId(1)).unwrap().id, FeatureId(1));
        assert!(fc.get(FeatureId(1)).unwrap().properties.is_empty());
    }

    #[test]
    fn positions_accept_altitude_and_reject_short_arrays() {
        let ok: LngLat = serde_json::from_value(json!([10.0, 20.0, 300.0])).unwrap();
        assert_eq!(ok, LngLat::new(10.0, 20.0));
        assert!(serde_json::from_value::<LngLat>(json!([10.0])).is_err());
    }

    #[test]
    fn malformed_geometry_keeps_its_slot() {
        let fc = FeatureCollection::from_value(json!({
            "features": [
                { "geometry": { "type": "Polygon", "coordinates": [[[0, "x"]]] } },
                { "geometry": { "type": "Hexagon", "coordinates": [] } },
                { "geometry": null },
                42,
                { "geometry": { "type": "Point", "coordinates": [3, 4] } }
            ]
        }))
        .unwrap();

        assert_eq!(fc.len(), 5);
        assert_eq!(fc.malformed(), 3);
        assert!(fc.iter().take(4).all(|f| f.geometry.is_none()));
        assert_eq!(fc.get(FeatureId(4)).unwrap().id, FeatureId(4));
        assert!(fc.get(FeatureId(4)).unwrap().geometry.is_some());
    }

    #[test]
    fn rejects_documents_without_features() {
        assert!(matches!(
            FeatureCollection::from_value(json!([1, 2])),
            Err(LoadError::NotAnObject("an array"))
        ));
        assert!(matches!(
            FeatureCollection::from_value(json!({ "type": "FeatureCollection" })),
            Err(LoadError::MissingFeatures)
        ));
        assert!(matches!(
            FeatureCollection::from_json_str("{ not json"),
            Err(LoadError::Json(_))
        ));
    }

    #[test]
    fn bounds_cover_all_geometries() {
        let fc = demo_collection();
        let b = fc.bounds().unwrap();
        assert_eq!(b.west, -17.0);
        assert_eq!(b.east, 153.0);
        assert_eq!(b.south, -38.0);
        assert_eq!(b.north, 36.0);
    }

    #[test]
    fn demo_collection_has_three_named_features() {
        let fc = demo_collection();
        let names: Vec<_> = fc.iter().filter_map(Feature::name).collect();
        assert_eq!(names, vec!["Africa", "Australia", "Timbuktu"]);
    }

    #[test]
    fn multi_geometries_visit_every_position() {
        let g: Geometry = serde_json::from_value(json!({
            "type": "GeometryCollection",
            "geometries": [
                { "type": "MultiPolygon", "coordinates": [[[[0, 0], [2, 0], [2, 2], [0, 0]]]] },
                { "type": "MultiLineString", "coordinates": [[[5, 5], [6, 6]]] }
            ]
        }))
        .unwrap();
        let mut count = 0;
        g.for_each_position(&mut |_| count += 1);
        assert_eq!(count, 6);
    }
}
