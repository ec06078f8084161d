//! HTTP Remote API
//!
//! `reqwest`-backed implementation of [`RemoteApi`]. Every request carries
//! `Content-Type: application/json` and the `X-User-Id` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::AppConfig;
use crate::domain::{FileChanges, Item, OrderUpdate, PendingOperation, Workspace};
use super::error::{error_message, ApiError, ApiResult};
use super::models::{
    AiGenerateRequest, AiGenerateResponse, BatchSyncRequest, BatchSyncResponse, NewFile,
    NewWorkspace, OrderPatch, SyncFilesResponse, WorkspaceProgress,
};
use super::traits::RemoteApi;

pub const USER_ID_HEADER: &str = "X-User-Id";

pub struct HttpApi {
    client: Client,
    base_url: String,
    user_id: String,
    timeout: Duration,
    ai_timeout: Duration,
}

impl HttpApi {
    pub fn new(config: &AppConfig, user_id: impl Into<String>) -> ApiResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self::with_client(
            client,
            &config.api_base_url,
            user_id,
            config.request_timeout(),
            config.ai_timeout(),
        ))
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        user_id: impl Into<String>,
        timeout: Duration,
        ai_timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: user_id.into(),
            timeout,
            ai_timeout,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json")
            .header(USER_ID_HEADER, &self.user_id)
    }

    async fn send(&self, builder: RequestBuilder, timeout: Duration) -> ApiResult<Response> {
        let response = builder
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            log::warn!("API error {}: {}", status, message);
            return Err(ApiError::Status { status: status.as_u16(), message });
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response, timeout: Duration) -> ApiResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::from_reqwest(e, timeout))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.send(self.request(Method::GET, path), self.timeout).await?;
        Self::read_json(response, self.timeout).await
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: &B, timeout: Duration) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(self.request(method, path).json(body), timeout).await?;
        Self::read_json(response, timeout).await
    }

    /// Request whose response body is ignored
    async fn send_unit<B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<()>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder, self.timeout).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn sync_files(&self) -> ApiResult<SyncFilesResponse> {
        self.get("/workspaces/sync-files").await
    }

    async fn create_workspace(&self, name: &str) -> ApiResult<Workspace> {
        self.send_json(Method::POST, "/workspaces", &NewWorkspace { name }, self.timeout)
            .await
    }

    async fn create_file(&self, workspace_id: &str, file: &NewFile) -> ApiResult<Item> {
        let path = format!("/workspaces/{}/files", workspace_id);
        self.send_json(Method::POST, &path, file, self.timeout).await
    }

    async fn update_file(&self, id: &str, changes: &FileChanges) -> ApiResult<()> {
        self.send_unit(Method::PATCH, &format!("/files/{}", id), Some(changes))
            .await
    }

    async fn update_order(&self, update: &OrderUpdate) -> ApiResult<()> {
        let patch = OrderPatch {
            parent_id: update.parent_id.as_deref(),
            order_index: update.order_index,
        };
        self.send_unit(Method::PATCH, &format!("/files/{}", update.id), Some(&patch))
            .await
    }

    async fn delete_file(&self, id: &str) -> ApiResult<()> {
        self.send_unit::<()>(Method::DELETE, &format!("/files/{}", id), None)
            .await
    }

    async fn restore_file(&self, id: &str) -> ApiResult<()> {
        self.send_unit::<()>(Method::POST, &format!("/files/{}/restore", id), None)
            .await
    }

    async fn batch_sync(&self, operations: &[PendingOperation]) -> ApiResult<BatchSyncResponse> {
        let body = BatchSyncRequest { operations };
        self.send_json(Method::POST, "/workspaces/sync", &body, self.timeout)
            .await
    }

    async fn workspace_progress(&self, workspace_id: &str) -> ApiResult<WorkspaceProgress> {
        self.get(&format!("/progress/workspaces/{}", workspace_id)).await
    }

    async fn ai_generate(&self, request: &AiGenerateRequest) -> ApiResult<AiGenerateResponse> {
        self.send_json(Method::POST, "/ai/generate", request, self.ai_timeout)
            .await
    }
}
