//! TopoJSON Decoder
//! Converts Topology documents (shared, optionally quantized arcs) into
//! polygon features.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Invalid TopoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Topology has no object named {0:?} (objects: {1})")]
    MissingObject(String, String),
    #[error("Topology contains no objects")]
    NoObjects,
    #[error("Arc index {0} out of range")]
    ArcOutOfRange(i64),
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TopoGeometry {
    GeometryCollection {
        geometries: Vec<TopoGeometry>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Map<String, Value>>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Map<String, Value>>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct RawTopology {
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    objects: BTreeMap<String, TopoGeometry>,
}

/// A polygonal feature extracted from a topology object.
#[derive(Debug, Clone)]
pub struct TopoFeature {
    pub id: Option<Value>,
    pub properties: Map<String, Value>,
    pub geometry: MultiPolygon<f64>,
}

/// A parsed topology with its arcs already decoded to absolute positions.
pub struct Topology {
    arcs: Vec<Vec<Coord<f64>>>,
    objects: BTreeMap<String, TopoGeometry>,
}

impl Topology {
    pub fn from_value(value: Value) -> Result<Self, TopologyError> {
        let raw: RawTopology = serde_json::from_value(value)?;
        let arcs = raw
            .arcs
            .iter()
            .map(|arc| decode_arc(arc, raw.transform))
            .collect();
        Ok(Self {
            arcs,
            objects: raw.objects,
        })
    }

    pub fn object_names(&self) -> Vec<&str> {
        self.objects.keys().map(String::as_str).collect()
    }

    /// Features of the named object, or of the first object when no name is given.
    pub fn features(&self, object: Option<&str>) -> Result<Vec<TopoFeature>, TopologyError> {
        let geometry = match object {
            Some(name) => self
                .objects
                .get(name)
                .ok_or_else(|| {
                    TopologyError::MissingObject(name.to_string(), self.object_names().join(", "))
                })?,
            None => {
                let (name, geometry) = self.objects.iter().next().ok_or(TopologyError::NoObjects)?;
                if self.objects.len() > 1 {
                    log::warn!("Topology has several objects, using {name:?}");
                }
                geometry
            }
        };

        let mut features = Vec::new();
        self.collect(geometry, &mut features)?;
        Ok(features)
    }

    fn collect(
        &self,
        geometry: &TopoGeometry,
        out: &mut Vec<TopoFeature>,
    ) -> Result<(), TopologyError> {
        match geometry {
            TopoGeometry::GeometryCollection { geometries } => {
                for child in geometries {
                    self.collect(child, out)?;
                }
            }
            TopoGeometry::Polygon {
                arcs,
                id,
                properties,
            } => out.push(TopoFeature {
                id: id.clone(),
                properties: properties.clone().unwrap_or_default(),
                geometry: MultiPolygon::new(vec![self.polygon(arcs)?]),
            }),
            TopoGeometry::MultiPolygon {
                arcs,
                id,
                properties,
            } => {
                let polygons = arcs
                    .iter()
                    .map(|rings| self.polygon(rings))
                    .collect::<Result<Vec<_>, _>>()?;
                out.push(TopoFeature {
                    id: id.clone(),
                    properties: properties.clone().unwrap_or_default(),
                    geometry: MultiPolygon::new(polygons),
                });
            }
            TopoGeometry::Unsupported => {
                log::warn!("Skipping non-polygonal topology geometry");
            }
        }
        Ok(())
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Polygon<f64>, TopologyError> {
        let mut rings = rings.iter().map(|ring| self.ring(ring));
        let exterior = match rings.next() {
            Some(ring) => ring?,
            None => LineString::new(vec![]),
        };
        let interiors = rings.collect::<Result<Vec<_>, _>>()?;
        Ok(Polygon::new(exterior, interiors))
    }

    /// Stitch arcs into one ring. Negative indices (`!i`) walk an arc backwards;
    /// consecutive arcs share their joining point, so it is kept only once.
    fn ring(&self, indices: &[i64]) -> Result<LineString<f64>, TopologyError> {
        let mut coords: Vec<Coord<f64>> = Vec::new();
        for &index in indices {
            let (slot, reversed) = if index < 0 {
                (!index, true)
            } else {
                (index, false)
            };
            let arc = usize::try_from(slot)
                .ok()
                .and_then(|slot| self.arcs.get(slot))
                .ok_or(TopologyError::ArcOutOfRange(index))?;

            if !coords.is_empty() {
                coords.pop();
            }
            if reversed {
                coords.extend(arc.iter().rev().copied());
            } else {
                coords.extend(arc.iter().copied());
            }
        }
        Ok(LineString::new(coords))
    }
}

fn decode_arc(positions: &[Vec<f64>], transform: Option<Transform>) -> Vec<Coord<f64>> {
    let point = |p: &Vec<f64>| {
        (
            p.first().copied().unwrap_or_default(),
            p.get(1).copied().unwrap_or_default(),
        )
    };

    match transform {
        None => positions
            .iter()
            .map(|p| {
                let (x, y) = point(p);
                Coord { x, y }
            })
            .collect(),
        Some(t) => {
            // Quantized arcs are delta-encoded.
            let (mut x, mut y) = (0.0, 0.0);
            positions
                .iter()
                .map(|p| {
                    let (dx, dy) = point(p);
                    x += dx;
                    y += dy;
                    Coord {
                        x: x * t.scale[0] + t.translate[0],
                        y: y * t.scale[1] + t.translate[1],
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square_topology() -> Value {
        // Two unit squares sharing the edge x = 1, quantized with scale 1.
        json!({
            "type": "Topology",
            "transform": { "scale": [1.0, 1.0], "translate": [100.0, 30.0] },
            "arcs": [
                [[1, 0], [0, 1]],
                [[1, 1], [-1, 0], [0, -1], [1, 0]],
                [[1, 0], [1, 0], [0, 1], [-1, 0]]
            ],
            "objects": {
                "counties": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "Polygon", "arcs": [[0, 1]], "properties": { "COUNTYFP": "001" } },
                        { "type": "Polygon", "arcs": [[2, -1]], "properties": { "COUNTYFP": "003" } },
                        { "type": "LineString", "arcs": [0] }
                    ]
                }
            }
        })
    }

    #[test]
    fn decodes_quantized_arcs_and_stitches_rings() {
        let topology = Topology::from_value(square_topology()).unwrap();
        let features = topology.features(Some("counties")).unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].properties["COUNTYFP"], "001");

        let left: Vec<(f64, f64)> = features[0].geometry.0[0]
            .exterior()
            .coords()
            .map(|c| (c.x, c.y))
            .collect();
        assert_eq!(
            left,
            vec![
                (101.0, 30.0),
                (101.0, 31.0),
                (100.0, 31.0),
                (100.0, 30.0),
                (101.0, 30.0)
            ]
        );

        // Second county walks the shared arc backwards.
        let right: Vec<(f64, f64)> = features[1].geometry.0[0]
            .exterior()
            .coords()
            .map(|c| (c.x, c.y))
            .collect();
        assert_eq!(right.first(), Some(&(101.0, 30.0)));
        assert!(right.contains(&(102.0, 31.0)));
        assert_eq!(right.last(), Some(&(101.0, 30.0)));
    }

    #[test]
    fn untransformed_arcs_are_absolute() {
        let value = json!({
            "type": "Topology",
            "arcs": [[[0.5, 0.5], [1.5, 0.5], [1.5, 1.5], [0.5, 0.5]]],
            "objects": { "only": { "type": "MultiPolygon", "arcs": [[[0]]], "id": 42 } }
        });
        let topology = Topology::from_value(value).unwrap();
        let features = topology.features(None).unwrap();

        assert_eq!(features[0].id, Some(json!(42)));
        assert_eq!(features[0].geometry.0[0].exterior().0[1], Coord { x: 1.5, y: 0.5 });
    }

    #[test]
    fn missing_object_and_bad_arc_are_errors() {
        let topology = Topology::from_value(square_topology()).unwrap();
        assert!(matches!(
            topology.features(Some("states")),
            Err(TopologyError::MissingObject(..))
        ));

        let value = json!({
            "type": "Topology",
            "arcs": [],
            "objects": { "bad": { "type": "Polygon", "arcs": [[3]] } }
        });
        let topology = Topology::from_value(value).unwrap();
        assert!(matches!(
            topology.features(None),
            Err(TopologyError::ArcOutOfRange(3))
        ));
    }
}
