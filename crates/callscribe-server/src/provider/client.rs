//! HTTP client for the Transcriptor provider API

use async_trait::async_trait;
use reqwest::{Body, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument, warn};

use super::{ProviderError, RemoteStatus, TranscriptionProvider};
use crate::config::ProviderConfig;

#[derive(Debug, Deserialize)]
struct UploadTargetResponse {
    upload_url: Option<String>,
    public_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct InitiateRequest<'a> {
    url: &'a str,
    language: &'a str,
    service: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitiateResponse {
    order_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobDetailResponse {
    status: Option<String>,
    #[serde(default)]
    transcription: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the Transcriptor HTTP API
///
/// Holds its full configuration (endpoint, credentials, locale) as an
/// explicit value, so several differently-configured clients can coexist.
pub struct TorClient {
    http: Client,
    config: ProviderConfig,
}

impl TorClient {
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("callscribe/0.1")
            .build()?;

        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Step 1: ask the provider for an upload destination plus the public
    /// reference later used to initiate the job.
    async fn acquire_upload_target(
        &self,
        file_name: &str,
    ) -> Result<(String, String), ProviderError> {
        let response = self
            .http
            .post(self.endpoint("local_file/get_upload_url"))
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({ "file_name": file_name }))
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("get_upload_url failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "get_upload_url returned {}",
                response.status()
            )));
        }

        let target: UploadTargetResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("malformed upload target: {}", e)))?;

        match (target.upload_url, target.public_url) {
            (Some(upload_url), Some(public_url)) => Ok((upload_url, public_url)),
            _ => Err(ProviderError::Unavailable(
                "provider did not issue an upload destination".to_string(),
            )),
        }
    }

    /// Step 2: stream the audio bytes to the issued destination.
    async fn upload_file(&self, path: &Path, upload_url: &str) -> Result<(), ProviderError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ProviderError::UploadFailed(format!("could not read audio file: {}", e)))?;

        let response = self
            .http
            .put(upload_url)
            .header(reqwest::header::CONTENT_TYPE, "audio/mpeg")
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .map_err(|e| ProviderError::UploadFailed(format!("upload request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::UploadFailed(format!(
                "upload returned {}",
                response.status()
            )));
        }

        debug!("Audio bytes uploaded");
        Ok(())
    }

    /// Step 3: initiate the transcription job against the public reference.
    async fn initiate(&self, public_url: &str) -> Result<String, ProviderError> {
        let request = InitiateRequest {
            url: public_url,
            language: &self.config.language,
            service: &self.config.service,
        };

        let response = self
            .http
            .post(self.endpoint("local_file/initiate_transcription"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ProviderError::SubmissionRejected(format!("initiate_transcription failed: {}", e))
            })?;

        if response.status() != StatusCode::ACCEPTED {
            return Err(ProviderError::SubmissionRejected(format!(
                "initiate_transcription returned {}",
                response.status()
            )));
        }

        let body: InitiateResponse = response.json().await.map_err(|e| {
            ProviderError::SubmissionRejected(format!("malformed initiation response: {}", e))
        })?;

        body.order_id.ok_or_else(|| {
            ProviderError::SubmissionRejected(
                body.message
                    .unwrap_or_else(|| "provider did not return a job identifier".to_string()),
            )
        })
    }
}

#[async_trait]
impl TranscriptionProvider for TorClient {
    /// No rollback on partial failure: a destination orphaned by step 2/3
    /// failing is provider-side garbage with no cleanup API.
    #[instrument(skip(self), fields(file_name = %file_name))]
    async fn submit(&self, path: &Path, file_name: &str) -> Result<String, ProviderError> {
        let (upload_url, public_url) = self.acquire_upload_target(file_name).await?;

        if let Err(e) = self.upload_file(path, &upload_url).await {
            warn!("Upload failed after target was issued: {}", e);
            return Err(e);
        }

        let order_id = self.initiate(&public_url).await?;
        info!(provider_job_id = %order_id, "Transcription job accepted");

        Ok(order_id)
    }

    #[instrument(skip(self))]
    async fn query_status(&self, provider_job_id: &str) -> Result<RemoteStatus, ProviderError> {
        let response = self
            .http
            .get(self.endpoint("local_file/get_file_detail"))
            .bearer_auth(&self.config.api_key)
            .query(&[("order_id", provider_job_id)])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("get_file_detail failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "get_file_detail returned {}",
                response.status()
            )));
        }

        let detail: JobDetailResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("malformed job detail: {}", e)))?;

        match detail.status.as_deref() {
            Some("completed") => match detail.transcription {
                Some(text) if !text.is_empty() => Ok(RemoteStatus::Completed(text)),
                _ => Err(ProviderError::Unavailable(
                    "completed job is missing its transcription".to_string(),
                )),
            },
            Some("error") | Some("failed") => Ok(RemoteStatus::Failed(
                detail
                    .message
                    .or(detail.error)
                    .unwrap_or_else(|| "provider reported failure".to_string()),
            )),
            Some(_) => Ok(RemoteStatus::Processing),
            None => Err(ProviderError::Unavailable(
                "job detail response is missing a status".to_string(),
            )),
        }
    }
}
