//! In-memory stand-in for the analysis service.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use punch_console::engine::{PunchService, UploadPayload};
use punch_console::error::ServiceError;
use punch_console::model::{AnalysisResult, DetectionConfig, HealthResponse, PresetsResponse};
use punch_console::orchestrator::{Session, SessionOptions};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Canned behavior for one endpoint.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Body(Bytes),
    Status(u16),
    Unreachable,
    Malformed,
}

impl Reply {
    fn into_body(self, context: &'static str) -> Result<Bytes, ServiceError> {
        match self {
            Reply::Json(v) => Ok(Bytes::from(v.to_string())),
            Reply::Body(b) => Ok(b),
            Reply::Status(status) => Err(ServiceError::Status { context, status }),
            Reply::Unreachable => Err(ServiceError::Transport("connection refused".into())),
            Reply::Malformed => Ok(Bytes::from_static(b"<html>not json")),
        }
    }

    fn into_json<T: serde::de::DeserializeOwned>(self, context: &'static str) -> Result<T, ServiceError> {
        let body = self.into_body(context)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

pub struct FakeService {
    pub health: Reply,
    pub presets: Reply,
    pub upload: Mutex<Reply>,
    pub csv: Mutex<Reply>,
    pub upload_calls: AtomicUsize,
    pub csv_calls: AtomicUsize,
    pub last_payload: Mutex<Option<UploadPayload>>,
    /// Signalled when a submission reaches the service.
    pub entered: Notify,
    /// When set, submissions wait here before replying.
    pub gate: Option<Arc<Notify>>,
}

impl Default for FakeService {
    fn default() -> Self {
        Self {
            health: Reply::Json(json!({"status": "ok"})),
            presets: Reply::Json(json!({"preset_overrides": {"balanced": {}}})),
            upload: Mutex::new(Reply::Json(sample_result(3))),
            csv: Mutex::new(Reply::Body(Bytes::from_static(b"frame,time_sec\n1,0.5\n"))),
            upload_calls: AtomicUsize::new(0),
            csv_calls: AtomicUsize::new(0),
            last_payload: Mutex::new(None),
            entered: Notify::new(),
            gate: None,
        }
    }
}

impl FakeService {
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_upload(&self, reply: Reply) {
        *self.upload.lock().unwrap() = reply;
    }

    pub fn set_csv(&self, reply: Reply) {
        *self.csv.lock().unwrap() = reply;
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn csv_calls(&self) -> usize {
        self.csv_calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<UploadPayload> {
        self.last_payload.lock().unwrap().clone()
    }

    async fn hold(&self, payload: UploadPayload) {
        *self.last_payload.lock().unwrap() = Some(payload);
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl PunchService for FakeService {
    async fn health(&self) -> Result<HealthResponse, ServiceError> {
        let body: Value = self.health.clone().into_json("Health check failed")?;
        Ok(HealthResponse::from_value(&body))
    }

    async fn settings_presets(&self) -> Result<PresetsResponse, ServiceError> {
        self.presets.clone().into_json("Preset fetch failed")
    }

    async fn upload(&self, payload: UploadPayload) -> Result<AnalysisResult, ServiceError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.hold(payload).await;
        let reply = self.upload.lock().unwrap().clone();
        let raw: Value = reply.into_json("Upload failed")?;
        Ok(AnalysisResult::from_value(raw))
    }

    async fn upload_csv(&self, payload: UploadPayload) -> Result<Bytes, ServiceError> {
        self.csv_calls.fetch_add(1, Ordering::SeqCst);
        self.hold(payload).await;
        let reply = self.csv.lock().unwrap().clone();
        reply.into_body("CSV export failed")
    }
}

/// Result document with `n` events at 0.1 s spacing.
pub fn sample_result(n: usize) -> Value {
    let events: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "frame": i * 3,
                "time_sec": i as f64 * 0.1,
                "hand": if i % 2 == 0 { "left" } else { "right" },
                "type": "jab",
                "confidence": 0.9,
                "counted": i % 3 != 0,
            })
        })
        .collect();
    json!({
        "filename": "fight.mp4",
        "video_stats": {
            "counted_punches": n,
            "detected_punches_raw": n + 2,
            "pose_coverage": 0.87654,
            "analytics": {"punches_per_minute": 42.5, "combo_count": 2, "max_combo": 4},
            "punch_events": events,
        }
    })
}

pub fn new_session(service: Arc<FakeService>, download_dir: &Path) -> Session {
    Session::new(
        service,
        SessionOptions {
            download_dir: download_dir.to_path_buf(),
            initial_config: DetectionConfig::default(),
        },
    )
}

pub fn write_video(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42fake-video").expect("write video");
    path
}
