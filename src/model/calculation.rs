use super::Space;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VentilationMethod {
    #[default]
    BuildingCode,
    OccupancyBased,
    AreaBased,
    Custom,
}

impl VentilationMethod {
    pub const ALL: [Self; 4] = [
        Self::BuildingCode,
        Self::AreaBased,
        Self::OccupancyBased,
        Self::Custom,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BuildingCode => "building_code",
            Self::OccupancyBased => "occupancy_based",
            Self::AreaBased => "area_based",
            Self::Custom => "custom",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::BuildingCode => "Building code",
            Self::OccupancyBased => "Occupancy based",
            Self::AreaBased => "Floor area based",
            Self::Custom => "Custom",
        }
    }

    /// Next method in `ALL`, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for VentilationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VentilationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown ventilation method '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomUsageType {
    Office,
    Residence,
    MeetingRoom,
    Corridor,
    Toilet,
    Kitchen,
    Storage,
    Other,
}

impl RoomUsageType {
    /// Parses free-form usage text from the model ("Office", "meeting room", ...).
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "office" => Some(Self::Office),
            "residence" => Some(Self::Residence),
            "meeting_room" => Some(Self::MeetingRoom),
            "corridor" => Some(Self::Corridor),
            "toilet" => Some(Self::Toilet),
            "kitchen" => Some(Self::Kitchen),
            "storage" => Some(Self::Storage),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Request body of the single and batch ventilation endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VentilationInput {
    pub space_id: String,
    pub method: VentilationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<RoomUsageType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_change_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresh_air_per_person: Option<f64>,
    pub use_natural_ventilation: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub custom_parameters: Map<String, Value>,
}

impl VentilationInput {
    #[must_use]
    pub fn from_space(space: &Space, method: VentilationMethod) -> Self {
        Self {
            space_id: space.id.clone(),
            method,
            area: space.area,
            volume: space.volume,
            height: space.height,
            usage: space.usage.as_deref().and_then(RoomUsageType::parse),
            occupancy: space.occupancy,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplianceStatus {
    Ok,
    Warning,
    Ng,
}

impl ComplianceStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Ng => "NG",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VentilationResult {
    pub space_id: String,
    pub space_name: String,
    pub required_ventilation: f64,
    pub air_change_rate: f64,
    pub method: VentilationMethod,
    #[serde(default)]
    pub used_area: Option<f64>,
    #[serde(default)]
    pub used_volume: Option<f64>,
    #[serde(default)]
    pub used_occupancy: Option<u32>,
    #[serde(default)]
    pub used_usage: Option<RoomUsageType>,
    #[serde(default)]
    pub standard_air_change_rate: Option<f64>,
    #[serde(default)]
    pub standard_fresh_air_per_person: Option<f64>,
    pub compliance_status: ComplianceStatus,
    #[serde(default)]
    pub compliance_notes: Option<String>,
    #[serde(default)]
    pub calculation_details: Map<String, Value>,
    #[serde(default)]
    pub applied_standard: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VentilationBatchResult {
    pub total: usize,
    pub results: Vec<VentilationResult>,
    #[serde(default)]
    pub summary: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn input_serializes_camel_case_and_skips_unset() {
        let mut space = Space::new("s1", "Office 1");
        space.area = Some(20.0);
        space.usage = Some("Meeting Room".into());

        let input = VentilationInput::from_space(&space, VentilationMethod::AreaBased);
        let json = serde_json::to_value(&input).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "spaceId": "s1",
                "method": "area_based",
                "area": 20.0,
                "usage": "meeting_room",
                "useNaturalVentilation": false
            })
        );
    }

    #[test]
    fn result_parses_compliance_status() {
        let json = r#"{
            "spaceId": "s1", "spaceName": "A", "requiredVentilation": 120.0,
            "airChangeRate": 2.0, "method": "building_code",
            "complianceStatus": "WARNING", "calculationDetails": {"note": 1}
        }"#;
        let result: VentilationResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.compliance_status, ComplianceStatus::Warning);
        assert_eq!(result.used_area, None);
    }

    #[test]
    fn method_round_trips_through_str() {
        for method in VentilationMethod::ALL {
            assert_eq!(method.as_str().parse::<VentilationMethod>(), Ok(method));
        }
        assert!("nope".parse::<VentilationMethod>().is_err());
    }
}
