//! Analysis session state and the single-flight submission state machine.

use super::{bootstrap, post_process};
use crate::config_store::ConfigStore;
use crate::engine::{PunchService, UploadPayload};
use crate::error::{ConfigError, SubmitError};
use crate::model::{
    AnalysisResult, ConfigField, ConfigValue, DetectionConfig, HealthStatus, PresetCatalog,
    SelectedFile,
};
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

pub const STATUS_NO_FILE: &str = "Select a video file first.";
pub const STATUS_ANALYZING: &str = "Analyzing video...";
pub const STATUS_ANALYZED: &str = "Analysis complete.";
pub const STATUS_PREPARING_CSV: &str = "Preparing CSV...";
pub const STATUS_CSV_DONE: &str = "CSV downloaded.";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Where exported CSV files are written.
    pub download_dir: PathBuf,
    pub initial_config: DetectionConfig,
}

/// Read-only copy of everything a shell renders.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub health: HealthStatus,
    pub presets: PresetCatalog,
    pub config: DetectionConfig,
    pub status: String,
    pub busy: bool,
    pub result: Option<Arc<AnalysisResult>>,
    pub file: Option<SelectedFile>,
    pub last_download: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Analyze,
    ExportCsv,
}

impl Operation {
    fn started_status(self) -> &'static str {
        match self {
            Operation::Analyze => STATUS_ANALYZING,
            Operation::ExportCsv => STATUS_PREPARING_CSV,
        }
    }
}

struct SessionState {
    config: ConfigStore,
    health: HealthStatus,
    presets: PresetCatalog,
    status: String,
    busy: bool,
    result: Option<Arc<AnalysisResult>>,
    file: Option<SelectedFile>,
    last_download: Option<PathBuf>,
}

/// One console session. Shared by `Arc` between the shell and spawned submissions.
///
/// All state sits behind a single mutex that is never held across an await, so the
/// busy check-and-set is atomic and at most one submission runs at a time.
pub struct Session {
    service: Arc<dyn PunchService>,
    download_dir: PathBuf,
    state: Mutex<SessionState>,
}

/// Clears the busy flag when a submission ends, however it ends.
struct BusyGuard<'a> {
    session: &'a Session,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.session.lock().busy = false;
    }
}

impl Session {
    pub fn new(service: Arc<dyn PunchService>, opts: SessionOptions) -> Self {
        Self {
            service,
            download_dir: opts.download_dir,
            state: Mutex::new(SessionState {
                config: ConfigStore::new(opts.initial_config),
                health: HealthStatus::default(),
                presets: PresetCatalog::default(),
                status: String::new(),
                busy: false,
                result: None,
                file: None,
                last_download: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Load health and presets from the service. Never fails.
    pub async fn bootstrap(&self) {
        let (health, presets) = bootstrap::bootstrap(self.service.as_ref()).await;
        let mut st = self.lock();
        st.health = health;
        st.presets = presets;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let st = self.lock();
        SessionSnapshot {
            health: st.health.clone(),
            presets: st.presets.clone(),
            config: st.config.get().clone(),
            status: st.status.clone(),
            busy: st.busy,
            result: st.result.clone(),
            file: st.file.clone(),
            last_download: st.last_download.clone(),
        }
    }

    pub fn config(&self) -> DetectionConfig {
        self.lock().config.get().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    pub fn set_config_field(
        &self,
        field: ConfigField,
        value: ConfigValue,
    ) -> Result<DetectionConfig, ConfigError> {
        self.lock().config.set(field, value).cloned()
    }

    /// Select or clear the video. Submissions already in flight keep their own copy.
    pub fn set_file(&self, file: Option<SelectedFile>) {
        self.lock().file = file;
    }

    /// Upload the selected video for analysis and keep the decoded result.
    pub async fn run_analyze(&self) -> Result<Arc<AnalysisResult>, SubmitError> {
        let (_guard, file, cfg) = self.begin(Operation::Analyze)?;

        let outcome = match self.build_payload(&file, &cfg).await {
            Ok(payload) => self.service.upload(payload).await.map_err(SubmitError::from),
            Err(e) => Err(e),
        };

        let mut st = self.lock();
        match outcome {
            Ok(result) => {
                let result = Arc::new(result);
                log::info!(
                    "analysis of {} complete ({} events)",
                    file.name(),
                    result.events().len()
                );
                st.result = Some(result.clone());
                st.status = STATUS_ANALYZED.to_string();
                Ok(result)
            }
            Err(e) => {
                log::warn!("analysis of {} failed: {e}", file.name());
                st.result = None;
                st.status = format!("Error: {e}");
                Err(e)
            }
        }
    }

    /// Upload the selected video to the CSV endpoint and save the body to the
    /// download directory. Returns the saved path.
    pub async fn run_export_csv(&self) -> Result<PathBuf, SubmitError> {
        let (_guard, file, cfg) = self.begin(Operation::ExportCsv)?;

        let outcome = async {
            let payload = self.build_payload(&file, &cfg).await?;
            let body = self.service.upload_csv(payload).await?;
            post_process::save_csv(&self.download_dir, &file.name(), &body).await
        }
        .await;

        let mut st = self.lock();
        match outcome {
            Ok(path) => {
                log::info!("saved {}", path.display());
                st.last_download = Some(path.clone());
                st.status = STATUS_CSV_DONE.to_string();
                Ok(path)
            }
            Err(e) => {
                log::warn!("CSV export of {} failed: {e}", file.name());
                st.status = format!("Error: {e}");
                Err(e)
            }
        }
    }

    /// Check preconditions, enter `Busy`, and snapshot the file and configuration.
    fn begin(
        &self,
        op: Operation,
    ) -> Result<(BusyGuard<'_>, SelectedFile, DetectionConfig), SubmitError> {
        let mut st = self.lock();
        if st.busy {
            log::debug!("{op:?} ignored: another request is in flight");
            return Err(SubmitError::Busy);
        }
        let Some(file) = st.file.clone() else {
            st.status = STATUS_NO_FILE.to_string();
            return Err(SubmitError::NoFileSelected);
        };

        st.busy = true;
        if op == Operation::Analyze {
            st.result = None;
        }
        st.status = op.started_status().to_string();
        let cfg = st.config.get().clone();
        drop(st);

        Ok((BusyGuard { session: self }, file, cfg))
    }

    async fn build_payload(
        &self,
        file: &SelectedFile,
        cfg: &DetectionConfig,
    ) -> Result<UploadPayload, SubmitError> {
        let bytes = tokio::fs::read(file.path())
            .await
            .map_err(|source| SubmitError::ReadFile {
                path: file.path.clone(),
                source,
            })?;
        Ok(UploadPayload::new(file.name(), Bytes::from(bytes), cfg))
    }
}
