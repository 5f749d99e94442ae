use super::{PunchService, UploadPayload};
use crate::error::ServiceError;
use crate::model::{AnalysisResult, HealthResponse, PresetsResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::time::Duration;

pub struct HttpPunchService {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpPunchService {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid base URL: {base_url}"))?;
        // Url::join replaces the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(format!("punch-console/{}", env!("CARGO_PKG_VERSION")));
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build().context("build HTTP client")?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|e| ServiceError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    async fn post_form(
        &self,
        path: &str,
        context: &'static str,
        payload: UploadPayload,
    ) -> Result<Bytes, ServiceError> {
        let url = self.endpoint(path)?;
        log::debug!(
            "POST {url} ({} bytes of {})",
            payload.file_bytes.len(),
            payload.file_name
        );

        let resp = self.http.post(url).multipart(build_form(payload)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                context,
                status: status.as_u16(),
            });
        }
        Ok(resp.bytes().await?)
    }
}

fn build_form(payload: UploadPayload) -> Form {
    let len = payload.file_bytes.len() as u64;
    let file = Part::stream_with_length(payload.file_bytes, len).file_name(payload.file_name);
    payload
        .fields
        .into_iter()
        .fold(Form::new().part("file", file), |form, (k, v)| form.text(k, v))
}

#[async_trait]
impl PunchService for HttpPunchService {
    async fn health(&self) -> Result<HealthResponse, ServiceError> {
        let url = self.endpoint("health")?;
        log::debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ServiceError::Status {
                context: "Health check failed",
                status: resp.status().as_u16(),
            });
        }
        let body: serde_json::Value = serde_json::from_slice(&resp.bytes().await?)?;
        Ok(HealthResponse::from_value(&body))
    }

    async fn settings_presets(&self) -> Result<PresetsResponse, ServiceError> {
        let url = self.endpoint("settings-presets")?;
        log::debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ServiceError::Status {
                context: "Preset fetch failed",
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json().await?)
    }

    async fn upload(&self, payload: UploadPayload) -> Result<AnalysisResult, ServiceError> {
        let body = self.post_form("upload", "Upload failed", payload).await?;
        let raw: serde_json::Value = serde_json::from_slice(&body)?;
        Ok(AnalysisResult::from_value(raw))
    }

    async fn upload_csv(&self, payload: UploadPayload) -> Result<Bytes, ServiceError> {
        self.post_form("upload-csv", "CSV export failed", payload).await
    }
}
