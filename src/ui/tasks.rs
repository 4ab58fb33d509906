//! Background requests. Each task reports back through the app's event
//! channel; the UI loop applies the outcome.

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::model::{
    ModelInfo, Space, UploadResponse, VentilationBatchResult, VentilationInput, VentilationMethod,
};
use std::path::{Path, PathBuf};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// Everything the upload chain produces.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub upload: UploadResponse,
    pub info: ModelInfo,
    pub spaces: Vec<Space>,
}

#[derive(Debug)]
pub enum AppEvent {
    Health(bool),
    ModelLoaded(Result<LoadedModel, ApiError>),
    /// Results for every space; replaces the cache.
    CalculatedAll(Result<VentilationBatchResult, ApiError>),
    /// Results for a subset; merged into the cache.
    CalculatedSome(Result<VentilationBatchResult, ApiError>),
    SpaceRefreshed(Result<Space, ApiError>),
}

/// Upload → model info → spaces. The first failing step ends the chain.
pub async fn load_model(client: &ApiClient, path: &Path) -> Result<LoadedModel, ApiError> {
    let upload = client.upload(path).await?;
    info!(model_id = %upload.model_id, spaces = upload.total_spaces, "model uploaded");
    let info = client.model_info(&upload.model_id).await?;
    let list = client.spaces(&upload.model_id).await?;
    Ok(LoadedModel {
        upload,
        info,
        spaces: list.spaces,
    })
}

#[derive(Clone)]
pub struct Tasks {
    client: ApiClient,
    runtime: Handle,
    events: UnboundedSender<AppEvent>,
}

impl Tasks {
    #[must_use]
    pub fn new(client: ApiClient, runtime: Handle, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            client,
            runtime,
            events,
        }
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn check_health(&self) {
        let client = self.client.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let alive = client.health().await.is_ok();
            let _ = events.send(AppEvent::Health(alive));
        });
    }

    pub fn upload(&self, path: PathBuf) {
        let client = self.client.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let result = load_model(&client, &path).await;
            let _ = events.send(AppEvent::ModelLoaded(result));
        });
    }

    pub fn calculate_all(&self, model_id: String, method: VentilationMethod) {
        let client = self.client.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let result = client.calculate_all(&model_id, method).await;
            let _ = events.send(AppEvent::CalculatedAll(result));
        });
    }

    pub fn calculate_batch(&self, model_id: String, inputs: Vec<VentilationInput>) {
        let client = self.client.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let result = client.calculate_batch(&model_id, &inputs).await;
            let _ = events.send(AppEvent::CalculatedSome(result));
        });
    }

    pub fn refresh_space(&self, model_id: String, space_id: String) {
        let client = self.client.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let result = client.space(&model_id, &space_id).await;
            let _ = events.send(AppEvent::SpaceRefreshed(result));
        });
    }

    /// Drops the stored model on the backend; failures are only logged.
    pub fn delete_model(&self, model_id: String) {
        let client = self.client.clone();
        self.runtime.spawn(async move {
            match client.delete_model(&model_id).await {
                Ok(()) => info!(%model_id, "model deleted"),
                Err(err) => warn!(%model_id, error = %err, "model delete failed"),
            }
        });
    }
}
