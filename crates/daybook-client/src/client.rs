//! HTTP client for the daybook backend

use async_trait::async_trait;
use daybook_core::{
    AuthRemote, AuthRequest, AuthResponse, Credential, JournalRemote, RemoteDayRecord,
    RemoteError, RemoveMediaRequest, UploadRequest,
};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::types::*;

/// HTTP client for the daybook REST API
pub struct DaybookClient {
    config: ClientConfig,
    client: Client,
}

impl DaybookClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    // ==================== Auth API ====================

    /// Create an account
    pub async fn signup(&self, request: &AuthRequest) -> Result<AuthResponse> {
        let response = self
            .client
            .post(self.url("/signup"))
            .json(request)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Exchange username/password for a bearer token
    pub async fn login(&self, request: &AuthRequest) -> Result<AuthResponse> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(request)
            .send()
            .await?;
        self.handle_response(response).await
    }

    // ==================== Days API ====================

    /// List every day record of the user
    pub async fn list_days(&self, credential: &Credential) -> Result<Vec<RemoteDayRecord>> {
        let response = self
            .client
            .get(self.url("/days"))
            .bearer_auth(&credential.token)
            .send()
            .await?;

        let body: DaysResponse = self.handle_response(response).await?;
        let records = body.into_records();
        debug!(count = records.len(), "Fetched days");
        Ok(records)
    }

    /// Save text/mood and upload files for a day (multipart form)
    pub async fn upload_day(
        &self,
        credential: &Credential,
        day_number: u32,
        request: &UploadRequest,
    ) -> Result<RemoteDayRecord> {
        let mut form = Form::new();
        if let Some(text) = &request.text {
            form = form.text("text", text.clone());
        }
        if let Some(mood) = request.mood {
            form = form.text("mood", mood.as_str());
        }
        form = form.text("month", request.month.to_string());

        for file in &request.files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)?;
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(self.url(&format!("/upload/{}", day_number)))
            .bearer_auth(&credential.token)
            .multipart(form)
            .send()
            .await?;

        self.day_entry(response).await
    }

    /// Remove attachments from a day
    pub async fn remove_media(
        &self,
        credential: &Credential,
        day_number: u32,
        request: &RemoveMediaRequest,
    ) -> Result<RemoteDayRecord> {
        let response = self
            .client
            .patch(self.url(&format!("/upload/{}", day_number)))
            .bearer_auth(&credential.token)
            .json(request)
            .send()
            .await?;

        self.day_entry(response).await
    }

    // ==================== Helpers ====================

    async fn day_entry(&self, response: reqwest::Response) -> Result<RemoteDayRecord> {
        let body: DayEntryResponse = self.handle_response(response).await?;
        body.day_entry
            .ok_or_else(|| ClientError::InvalidResponse("response has no dayEntry".to_string()))
    }

    /// Decode a success body, or turn the `{error}` body into [`ClientError::Server`]
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_default();
            return Err(ClientError::Server { status, message });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl JournalRemote for DaybookClient {
    async fn fetch_days(&self, credential: &Credential) -> std::result::Result<Vec<RemoteDayRecord>, RemoteError> {
        Ok(self.list_days(credential).await?)
    }

    async fn upload_day(
        &self,
        credential: &Credential,
        day_number: u32,
        request: UploadRequest,
    ) -> std::result::Result<RemoteDayRecord, RemoteError> {
        Ok(DaybookClient::upload_day(self, credential, day_number, &request).await?)
    }

    async fn remove_media(
        &self,
        credential: &Credential,
        day_number: u32,
        request: RemoveMediaRequest,
    ) -> std::result::Result<RemoteDayRecord, RemoteError> {
        Ok(DaybookClient::remove_media(self, credential, day_number, &request).await?)
    }
}

#[async_trait]
impl AuthRemote for DaybookClient {
    async fn signup(&self, request: AuthRequest) -> std::result::Result<AuthResponse, RemoteError> {
        Ok(DaybookClient::signup(self, &request).await?)
    }

    async fn login(&self, request: AuthRequest) -> std::result::Result<AuthResponse, RemoteError> {
        Ok(DaybookClient::login(self, &request).await?)
    }
}
