use crate::error::ApiError;
use crate::model::{
    ModelInfo, Space, SpaceList, UploadResponse, VentilationBatchResult, VentilationInput,
    VentilationMethod, VentilationResult,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP client for the model and calculation endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Connection {
                url: base_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /health`; any answer with a success status counts as alive.
    pub async fn health(&self) -> Result<(), ApiError> {
        self.send(self.http.get(self.url("/health"))).await?;
        Ok(())
    }

    /// Uploads a building model as multipart field `file`.
    pub async fn upload(&self, path: &Path) -> Result<UploadResponse, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ApiError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "model.ifc".to_string(), |n| n.to_string_lossy().into_owned());
        info!(file = %file_name, bytes = bytes.len(), "uploading model");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .send(self.http.post(self.url("/api/ifc/upload")).multipart(form))
            .await?;
        decode(response).await
    }

    pub async fn model_info(&self, model_id: &str) -> Result<ModelInfo, ApiError> {
        self.get(&format!("/api/ifc/{model_id}/info")).await
    }

    pub async fn spaces(&self, model_id: &str) -> Result<SpaceList, ApiError> {
        self.get(&format!("/api/ifc/{model_id}/spaces")).await
    }

    pub async fn space(&self, model_id: &str, space_id: &str) -> Result<Space, ApiError> {
        self.get(&format!("/api/ifc/{model_id}/spaces/{space_id}"))
            .await
    }

    pub async fn delete_model(&self, model_id: &str) -> Result<(), ApiError> {
        self.send(self.http.delete(self.url(&format!("/api/ifc/{model_id}"))))
            .await?;
        Ok(())
    }

    pub async fn calculate_ventilation(
        &self,
        model_id: &str,
        input: &VentilationInput,
    ) -> Result<VentilationResult, ApiError> {
        let request = self
            .http
            .post(self.url("/api/calculations/ventilation"))
            .query(&[("model_id", model_id)])
            .json(input);
        decode(self.send(request).await?).await
    }

    pub async fn calculate_batch(
        &self,
        model_id: &str,
        inputs: &[VentilationInput],
    ) -> Result<VentilationBatchResult, ApiError> {
        let request = self
            .http
            .post(self.url("/api/calculations/ventilation/batch"))
            .query(&[("model_id", model_id)])
            .json(inputs);
        decode(self.send(request).await?).await
    }

    /// Runs the calculation for every space of the model on the backend.
    pub async fn calculate_all(
        &self,
        model_id: &str,
        method: VentilationMethod,
    ) -> Result<VentilationBatchResult, ApiError> {
        let request = self
            .http
            .post(self.url(&format!("/api/calculations/{model_id}/ventilation/all")))
            .query(&[("method", method.as_str())]);
        decode(self.send(request).await?).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.http.get(self.url(path))).await?;
        decode(response).await
    }

    /// Sends the request and turns transport failures and error statuses
    /// into [`ApiError`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(url = %self.base_url, error = %e, "backend unreachable");
            ApiError::Connection {
                url: self.base_url.clone(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        debug!(url = %response.url(), %status, "backend response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), extract_detail(&body));
        warn!(%status, error = %err, "backend request failed");
        Err(err)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await.map_err(|e| ApiError::Decode {
        message: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
        message: e.to_string(),
    })
}

/// Human-readable `detail` from an error body.
///
/// Accepts `{"detail": "text"}` and the validation form
/// `{"detail": [{"msg": "..."}, ...]}`; anything else yields `None`.
#[must_use]
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
