//! Remote analysis service.
//!
//! The pose/punch pipeline runs elsewhere; this module only knows its four endpoints.

mod client;

pub use client::HttpPunchService;

use crate::error::ServiceError;
use crate::model::{AnalysisResult, DetectionConfig, HealthResponse, PresetsResponse};
use async_trait::async_trait;
use bytes::Bytes;

/// Multipart body shared by `/upload` and `/upload-csv`, captured at submission time.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub file_name: String,
    pub file_bytes: Bytes,
    pub fields: Vec<(&'static str, String)>,
}

impl UploadPayload {
    pub fn new(file_name: String, file_bytes: Bytes, cfg: &DetectionConfig) -> Self {
        Self {
            file_name,
            file_bytes,
            fields: cfg.form_fields(),
        }
    }
}

#[async_trait]
pub trait PunchService: Send + Sync {
    /// `GET /health`
    async fn health(&self) -> Result<HealthResponse, ServiceError>;

    /// `GET /settings-presets`
    async fn settings_presets(&self) -> Result<PresetsResponse, ServiceError>;

    /// `POST /upload`
    async fn upload(&self, payload: UploadPayload) -> Result<AnalysisResult, ServiceError>;

    /// `POST /upload-csv`; the body is returned untouched.
    async fn upload_csv(&self, payload: UploadPayload) -> Result<Bytes, ServiceError>;
}
