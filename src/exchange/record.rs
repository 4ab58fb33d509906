use crate::error::ImportError;
use crate::model::{PropertyMap, PropertyValue, Space};
use crate::store::PropertyUpdate;
use serde::Deserialize;

/// Fixed columns of the tabular formats. Every other column is a custom property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Name,
    Area,
    Volume,
    Height,
    FloorLevel,
    Usage,
    Occupancy,
}

impl Column {
    pub const ALL: [Self; 8] = [
        Self::Id,
        Self::Name,
        Self::Area,
        Self::Volume,
        Self::Height,
        Self::FloorLevel,
        Self::Usage,
        Self::Occupancy,
    ];

    /// Matches a header against the synonym table, ignoring case.
    #[must_use]
    pub fn from_header(header: &str) -> Option<Self> {
        match header.trim().to_lowercase().as_str() {
            "id" => Some(Self::Id),
            "name" | "室名" => Some(Self::Name),
            "area" | "面積" | "面積 (m²)" => Some(Self::Area),
            "volume" | "容積" | "容積 (m³)" => Some(Self::Volume),
            "height" | "天井高" | "天井高 (m)" => Some(Self::Height),
            "floorlevel" | "階" => Some(Self::FloorLevel),
            "usage" | "用途" => Some(Self::Usage),
            "occupancy" | "在室人数" => Some(Self::Occupancy),
            _ => None,
        }
    }

    /// Header written by the CSV exporter.
    #[must_use]
    pub fn csv_header(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Area => "area",
            Self::Volume => "volume",
            Self::Height => "height",
            Self::FloorLevel => "floorLevel",
            Self::Usage => "usage",
            Self::Occupancy => "occupancy",
        }
    }

    /// Header written by the spreadsheet exporter.
    #[must_use]
    pub fn sheet_header(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Name => "室名",
            Self::Area => "面積 (m²)",
            Self::Volume => "容積 (m³)",
            Self::Height => "天井高 (m)",
            Self::FloorLevel => "階",
            Self::Usage => "用途",
            Self::Occupancy => "在室人数",
        }
    }

    /// Cell text of this column for `space`; empty when unset.
    #[must_use]
    pub fn text_of(self, space: &Space) -> String {
        let number = |v: Option<f64>| v.map(crate::model::property::format_number);
        match self {
            Self::Id => Some(space.id.clone()),
            Self::Name => Some(space.name.clone()),
            Self::Area => number(space.area),
            Self::Volume => number(space.volume),
            Self::Height => number(space.height),
            Self::FloorLevel => space.floor_level.clone(),
            Self::Usage => space.usage.clone(),
            Self::Occupancy => space.occupancy.map(|o| o.to_string()),
        }
        .unwrap_or_default()
    }
}

/// A partial space read from an import file.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub floor_level: Option<String>,
    #[serde(default)]
    pub usage: Option<String>,
    #[serde(default)]
    pub occupancy: Option<u32>,
    #[serde(default)]
    pub properties: Option<PropertyMap>,
}

impl ImportRecord {
    /// Builds a record from one tabular row. Blank cells are skipped and
    /// unknown columns land in `properties` under their literal header.
    pub fn from_row<'a>(headers: &[String], cells: impl IntoIterator<Item = &'a str>) -> Self {
        let mut record = Self {
            properties: Some(PropertyMap::new()),
            ..Self::default()
        };
        for (header, cell) in headers.iter().zip(cells) {
            record.set_cell(header, cell);
        }
        record
    }

    fn set_cell(&mut self, header: &str, cell: &str) {
        let value = cell.trim();
        if value.is_empty() {
            return;
        }

        match Column::from_header(header) {
            Some(Column::Id) => self.id = Some(value.to_string()),
            Some(Column::Name) => self.name = Some(value.to_string()),
            Some(Column::Area) => self.area = value.parse().ok(),
            Some(Column::Volume) => self.volume = value.parse().ok(),
            Some(Column::Height) => self.height = value.parse().ok(),
            Some(Column::FloorLevel) => self.floor_level = Some(value.to_string()),
            Some(Column::Usage) => self.usage = Some(value.to_string()),
            Some(Column::Occupancy) => self.occupancy = parse_count(value),
            None => {
                self.properties
                    .get_or_insert_with(PropertyMap::new)
                    .insert(header.to_string(), PropertyValue::from(value));
            }
        }
    }
}

/// Integer prefix of `value`; `"12.7"` reads as 12.
fn parse_count(value: &str) -> Option<u32> {
    value
        .parse::<u32>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().filter(|n| *n >= 0.0).map(|n| n as u32))
}

/// Turns import records into property merges. Records without an id or
/// without a property map are dropped.
pub fn into_updates(records: Vec<ImportRecord>) -> Result<Vec<PropertyUpdate>, ImportError> {
    let updates: Vec<PropertyUpdate> = records
        .into_iter()
        .filter_map(|record| match (record.id, record.properties) {
            (Some(id), Some(properties)) if !id.is_empty() => Some(PropertyUpdate { id, properties }),
            _ => None,
        })
        .collect();

    if updates.is_empty() {
        return Err(ImportError::NothingToImport);
    }
    Ok(updates)
}

/// Sorted union of the custom property keys of `spaces`.
pub fn property_keys(spaces: &[&Space]) -> Vec<String> {
    let mut keys: Vec<String> = spaces
        .iter()
        .flat_map(|s| s.properties.keys().cloned())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn synonyms_match_case_insensitively() {
        assert_eq!(Column::from_header("ID"), Some(Column::Id));
        assert_eq!(Column::from_header("FloorLevel"), Some(Column::FloorLevel));
        assert_eq!(Column::from_header("面積 (m²)"), Some(Column::Area));
        assert_eq!(Column::from_header("面積"), Some(Column::Area));
        assert_eq!(Column::from_header("Fire Zone"), None);
        for column in Column::ALL {
            assert_eq!(Column::from_header(column.csv_header()), Some(column));
            assert_eq!(Column::from_header(column.sheet_header()), Some(column));
        }
    }

    #[test]
    fn row_maps_fixed_and_custom_columns() {
        let record = ImportRecord::from_row(
            &headers(&["ID", "室名", "面積 (m²)", "在室人数", "Fire Zone", "Note"]),
            ["s1", "Office", "75.5", "4", "FZ-1", "  "],
        );

        let mut properties = PropertyMap::new();
        properties.insert("Fire Zone".into(), "FZ-1".into());
        assert_eq!(
            record,
            ImportRecord {
                id: Some("s1".into()),
                name: Some("Office".into()),
                area: Some(75.5),
                occupancy: Some(4),
                properties: Some(properties),
                ..ImportRecord::default()
            }
        );
    }

    #[test]
    fn updates_require_id_and_properties() {
        let records = vec![
            ImportRecord {
                id: Some("a".into()),
                properties: Some(PropertyMap::new()),
                ..ImportRecord::default()
            },
            ImportRecord {
                id: Some("b".into()),
                properties: None,
                ..ImportRecord::default()
            },
            ImportRecord {
                id: None,
                properties: Some(PropertyMap::new()),
                ..ImportRecord::default()
            },
        ];
        let updates = into_updates(records).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id, "a");

        assert!(matches!(
            into_updates(vec![ImportRecord::default()]),
            Err(ImportError::NothingToImport)
        ));
    }

    #[test]
    fn counts_truncate_fractions() {
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count("12.7"), Some(12));
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("many"), None);
    }
}
