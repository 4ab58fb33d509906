use super::property::{PropertyMap, PropertyValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3D,
    pub max: Point3D,
}

/// Geometry payload of a space in source (building model) coordinates, z up.
///
/// The backend may fill any combination of the fields; which one is used
/// for display is decided by the scene's shape builder.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry3D {
    #[serde(default)]
    pub vertices: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
}

impl Geometry3D {
    /// Vertices that carry at least three coordinates.
    #[must_use]
    pub fn points(&self) -> Vec<Point3D> {
        self.vertices
            .iter()
            .filter(|v| v.len() >= 3)
            .map(|v| Point3D::new(v[0], v[1], v[2]))
            .collect()
    }
}

/// A room extracted from the building model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Point3D>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry3D>,
    #[serde(default)]
    pub related_equipment_ids: Vec<String>,
    #[serde(default)]
    pub properties: PropertyMap,
}

impl Space {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Stringified value of a custom property; `None` when missing or null.
    #[must_use]
    pub fn property_text(&self, key: &str) -> Option<String> {
        super::property::display_value(self.properties.get(key))
    }

    /// Merges `delta` into the property map, overwriting existing keys.
    pub fn merge_properties(&mut self, delta: &PropertyMap) {
        for (key, value) in delta {
            self.properties.insert(key.clone(), value.clone());
        }
    }

    /// Name shown in lists: the long name when present, else the short name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match &self.long_name {
            Some(long) if !long.is_empty() => long,
            _ => &self.name,
        }
    }
}

/// `GET /api/ifc/{modelId}/spaces` body.
#[derive(Debug, Clone, Deserialize)]
pub struct SpaceList {
    #[serde(default)]
    pub total: usize,
    pub spaces: Vec<Space>,
}
