use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `POST /api/ifc/upload` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub model_id: String,
    pub filename: String,
    pub file_size: u64,
    pub uploaded_at: String,
    pub total_spaces: usize,
    pub total_equipment: usize,
    #[serde(default)]
    pub ifc_schema: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    pub parse_status: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// `GET /api/ifc/{modelId}/info` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub model_id: String,
    pub filename: String,
    pub uploaded_at: String,
    pub space_count: usize,
    pub equipment_count: usize,
    pub building_element_count: usize,
    #[serde(default)]
    pub project_info: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ModelInfo {
    /// Project name from `projectInfo.name`, if the backend reported one.
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.project_info.get("name").and_then(Value::as_str)
    }

    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.metadata.get("schema").and_then(Value::as_str)
    }
}
