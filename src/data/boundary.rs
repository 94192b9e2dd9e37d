//! Boundary Documents
//! Reads county/state outlines from TopoJSON or GeoJSON into regions.

use super::topology::{Topology, TopologyError};
use super::Region;
use geo::{Geometry, MultiPolygon};
use geojson::GeoJson;
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// Which properties identify and name each region.
#[derive(Debug, Clone)]
pub struct FeatureKeys<'a> {
    pub id_property: &'a str,
    pub name_property: Option<&'a str>,
    /// TopoJSON object to read; the first object when `None`.
    pub object: Option<&'a str>,
}

/// Loads boundary documents in either encoding.
pub struct BoundaryLoader;

impl BoundaryLoader {
    pub fn load(path: &Path, keys: &FeatureKeys<'_>) -> Result<Vec<Region>, BoundaryError> {
        let text = std::fs::read_to_string(path).map_err(|source| BoundaryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let regions = Self::parse(&text, keys)?;
        log::info!("Loaded {} regions from {}", regions.len(), path.display());
        Ok(regions)
    }

    pub fn parse(text: &str, keys: &FeatureKeys<'_>) -> Result<Vec<Region>, BoundaryError> {
        let value: Value = serde_json::from_str(text)?;
        if value.get("type").and_then(Value::as_str) == Some("Topology") {
            let topology = Topology::from_value(value)?;
            let features = topology.features(keys.object)?;
            Ok(features
                .into_iter()
                .map(|f| to_region(f.id.as_ref(), &f.properties, f.geometry, keys))
                .collect())
        } else {
            Self::from_geojson(GeoJson::from_json_value(value)?, keys)
        }
    }

    fn from_geojson(geojson: GeoJson, keys: &FeatureKeys<'_>) -> Result<Vec<Region>, BoundaryError> {
        let features = match geojson {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(geometry) => vec![geojson::Feature::from(geometry)],
        };

        let mut regions = Vec::with_capacity(features.len());
        for feature in features {
            let Some(geometry) = feature.geometry else {
                log::warn!("Skipping feature without geometry");
                continue;
            };
            let Some(polygons) = polygonal(Geometry::<f64>::try_from(geometry)?) else {
                log::warn!("Skipping non-polygonal feature");
                continue;
            };
            let id = feature.id.map(|id| match id {
                geojson::feature::Id::String(s) => Value::String(s),
                geojson::feature::Id::Number(n) => Value::Number(n),
            });
            let properties = feature.properties.unwrap_or_default();
            regions.push(to_region(id.as_ref(), &properties, polygons, keys));
        }
        Ok(regions)
    }
}

fn polygonal(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(polygons) => Some(polygons),
        Geometry::GeometryCollection(collection) => {
            let polygons: Vec<_> = collection
                .into_iter()
                .filter_map(polygonal)
                .flat_map(|mp| mp.0)
                .collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

fn to_region(
    feature_id: Option<&Value>,
    properties: &Map<String, Value>,
    geometry: MultiPolygon<f64>,
    keys: &FeatureKeys<'_>,
) -> Region {
    let id = properties
        .get(keys.id_property)
        .or(feature_id)
        .map(value_text)
        .unwrap_or_default();
    let name = keys
        .name_property
        .and_then(|key| properties.get(key))
        .map(value_text)
        .filter(|name| !name.is_empty());
    Region::new(id, name, geometry)
}

/// Identifiers may be encoded as strings (`"001"`) or numbers (`1`).
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEYS: FeatureKeys<'static> = FeatureKeys {
        id_property: "COUNTYFP",
        name_property: Some("NAME"),
        object: None,
    };

    #[test]
    fn reads_geojson_feature_collection() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "COUNTYFP": "001", "NAME": "Bernalillo" },
                    "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] }
                },
                {
                    "type": "Feature",
                    "properties": { "COUNTYFP": 3 },
                    "geometry": { "type": "MultiPolygon", "coordinates": [[[[2,0],[3,0],[3,1],[2,0]]]] }
                },
                {
                    "type": "Feature",
                    "properties": { "COUNTYFP": "999" },
                    "geometry": { "type": "Point", "coordinates": [5, 5] }
                }
            ]
        });

        let regions = BoundaryLoader::parse(&doc.to_string(), &KEYS).unwrap();

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].id, "001");
        assert_eq!(regions[0].display_name(), "Bernalillo");
        assert_eq!(regions[1].id, "3");
        assert_eq!(regions[1].key(), Some(3));
        assert_eq!(regions[1].geometry.0.len(), 1);
    }

    #[test]
    fn reads_topojson_and_falls_back_to_feature_id() {
        let doc = json!({
            "type": "Topology",
            "arcs": [[[0,0],[1,0],[1,1],[0,0]]],
            "objects": {
                "new_mexico_limited": {
                    "type": "GeometryCollection",
                    "geometries": [ { "type": "Polygon", "arcs": [[0]], "id": "035" } ]
                }
            }
        });

        let keys = FeatureKeys {
            object: Some("new_mexico_limited"),
            ..KEYS
        };
        let regions = BoundaryLoader::parse(&doc.to_string(), &keys).unwrap();

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].key(), Some(35));
        assert!(regions[0].name.is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BoundaryLoader::load(Path::new("/nonexistent/counties.topojson"), &KEYS);
        assert!(matches!(err, Err(BoundaryError::Io { .. })));
    }
}
