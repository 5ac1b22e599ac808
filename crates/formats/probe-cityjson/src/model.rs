//! The parts of the `CityJSON` data model the probe needs.

use geoprobe_core_common::EnvelopeBuilder;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A `CityJSON` document, or the header line of a `CityJSONSeq` stream.
#[derive(Debug, Clone, Deserialize)]
pub struct CityJsonDocument {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(rename = "CityObjects", default)]
    pub city_objects: Map<String, Value>,
    #[serde(default)]
    pub vertices: Option<Vec<Vertex>>,
}

/// One `CityJSONFeature` line of a `CityJSONSeq` stream.
#[derive(Debug, Clone, Deserialize)]
pub struct CityJsonFeature {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "CityObjects", default)]
    pub city_objects: Map<String, Value>,
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metadata {
    #[serde(rename = "referenceSystem", default)]
    pub reference_system: Option<String>,
}

/// A vertex as stored in the file: integers when a transform is present,
/// real coordinates otherwise.
pub type Vertex = [f64; 3];

/// Quantisation of vertex coordinates: `real = stored * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    pub scale: [f64; 3],
    pub translate: [f64; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: [1.0; 3],
            translate: [0.0; 3],
        }
    }
}

impl Transform {
    #[must_use]
    pub fn apply(&self, vertex: &Vertex) -> (f64, f64) {
        (
            vertex[0] * self.scale[0] + self.translate[0],
            vertex[1] * self.scale[1] + self.translate[1],
        )
    }
}

/// Adds the planar footprint of `vertices` to `builder`.
pub fn accumulate_vertices(vertices: &[Vertex], transform: &Transform, builder: &mut EnvelopeBuilder) {
    for vertex in vertices {
        let (x, y) = transform.apply(vertex);
        builder.add_point(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoprobe_core_common::Envelope;

    #[test]
    fn test_transform_is_applied() {
        let transform = Transform {
            scale: [0.001, 0.001, 0.001],
            translate: [84_000.0, 446_000.0, 0.0],
        };
        let mut builder = EnvelopeBuilder::new();
        accumulate_vertices(&[[0.0, 0.0, 0.0], [1500.0, 250.0, 9.0]], &transform, &mut builder);
        assert_eq!(
            builder.finish(),
            Some(Envelope::from_corners(84_000.0, 446_000.0, 84_001.5, 446_000.25))
        );
    }

    #[test]
    fn test_document_defaults() {
        let document: CityJsonDocument =
            serde_json::from_str(r#"{"type": "CityJSON", "version": "2.0"}"#).unwrap();
        assert!(document.transform.is_none());
        assert!(document.vertices.is_none());
        assert!(document.city_objects.is_empty());
        assert_eq!(Transform::default().apply(&[2.0, 3.0, 4.0]), (2.0, 3.0));
    }
}
