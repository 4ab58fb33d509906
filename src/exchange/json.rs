use super::record::ImportRecord;
use crate::error::{ExportError, ImportError};
use crate::model::{Point3D, PropertyMap, Space};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Exported view of a space; geometry and equipment links are left out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedSpace<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    global_id: Option<&'a str>,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    long_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    floor_level: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<Point3D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    occupancy: Option<u32>,
    properties: &'a PropertyMap,
}

impl<'a> From<&'a Space> for ExportedSpace<'a> {
    fn from(space: &'a Space) -> Self {
        Self {
            id: &space.id,
            global_id: space.global_id.as_deref(),
            name: &space.name,
            long_name: space.long_name.as_deref(),
            description: space.description.as_deref(),
            area: space.area,
            volume: space.volume,
            height: space.height,
            floor_level: space.floor_level.as_deref(),
            location: space.location,
            usage: space.usage.as_deref(),
            occupancy: space.occupancy,
            properties: &space.properties,
        }
    }
}

pub fn export_json<P: AsRef<Path>>(spaces: &[&Space], path: P) -> Result<(), ExportError> {
    if spaces.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let path_ref = path.as_ref();
    let exported: Vec<ExportedSpace<'_>> = spaces.iter().map(|s| ExportedSpace::from(*s)).collect();
    let json = serde_json::to_string_pretty(&exported)?;

    let mut file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    file.write_all(json.as_bytes())
        .map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })?;

    Ok(())
}

pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Vec<ImportRecord>, ImportError> {
    let path_ref = path.as_ref();
    let text = std::fs::read_to_string(path_ref).map_err(|source| ImportError::FileRead {
        path: path_ref.to_path_buf(),
        source,
    })?;
    parse_json(&text)
}

/// Parses a top-level JSON array of partial spaces.
pub fn parse_json(text: &str) -> Result<Vec<ImportRecord>, ImportError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ImportError::from))
            .collect(),
        _ => Err(ImportError::NotAnArray),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::into_updates;
    use crate::model::{Geometry3D, PropertyValue};
    use crate::store::repository::model_info;
    use crate::store::SpaceRepository;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Space> {
        let mut a = Space::new("s1", "101");
        a.global_id = Some("2O2Fr$t4X7Zf8NOew3FLOH".into());
        a.long_name = Some("Meeting room".into());
        a.area = Some(42.5);
        a.volume = Some(114.75);
        a.height = Some(2.7);
        a.floor_level = Some("1F".into());
        a.location = Some(Point3D::new(1.0, 2.0, 0.0));
        a.usage = Some("meeting_room".into());
        a.occupancy = Some(8);
        a.geometry = Some(Geometry3D::default());
        a.related_equipment_ids = vec!["e1".into()];
        a.properties.insert("Zone".into(), "A".into());
        a.properties.insert("Rating".into(), 4.0.into());
        a.properties.insert("Sprinklered".into(), true.into());
        a.properties.insert("Notes".into(), PropertyValue::Null);
        let b = Space::new("s2", "102");
        vec![a, b]
    }

    #[test]
    fn export_leaves_out_geometry_and_equipment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spaces.json");
        let spaces = sample();
        export_json(&spaces.iter().collect::<Vec<_>>(), &path).unwrap();

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let first = &value[0];
        assert_eq!(first["id"], "s1");
        assert_eq!(first["globalId"], "2O2Fr$t4X7Zf8NOew3FLOH");
        assert_eq!(first["floorLevel"], "1F");
        assert!(first.get("geometry").is_none());
        assert!(first.get("relatedEquipmentIds").is_none());
        assert_eq!(value[1]["properties"], serde_json::json!({}));
    }

    #[test]
    fn round_trip_preserves_exported_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spaces.json");
        let spaces = sample();
        export_json(&spaces.iter().collect::<Vec<_>>(), &path).unwrap();

        let mut repo = SpaceRepository::new();
        repo.load(spaces.clone(), model_info("m1"));
        let updates = into_updates(read_json(&path).unwrap()).unwrap();
        assert_eq!(repo.mutate_many(&updates), 2);

        assert_eq!(repo.spaces(), spaces.as_slice());
    }

    #[test]
    fn top_level_must_be_an_array() {
        assert!(matches!(parse_json(r#"{"id": "s1"}"#), Err(ImportError::NotAnArray)));
        assert!(matches!(parse_json("not json"), Err(ImportError::Json { .. })));
    }
}
