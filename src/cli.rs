use crate::config_store::ConfigStore;
use crate::engine::HttpPunchService;
use crate::model::{ConfigField, ConfigValue, DetectionConfig, SelectedFile};
use crate::orchestrator::{Session, SessionOptions};
use anyhow::{Context, Result};
use clap::Parser;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "punch-console",
    version,
    about = "Operator console for the punch-detection video service"
)]
pub struct Cli {
    /// Base URL of the analysis service
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    pub base_url: String,

    /// Request timeout (e.g. 90s, 10m). Requests wait indefinitely when omitted
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Print the raw analysis JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print summary cards and the event table and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Download punch events as CSV instead of analyzing (no TUI)
    #[arg(long)]
    pub export_csv: bool,

    /// Directory for downloaded CSV files [default: your downloads directory]
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Detection preset
    #[arg(long)]
    pub preset: Option<String>,

    /// Minimum keypoint confidence (0..1)
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Minimum keypoint visibility (0..1)
    #[arg(long)]
    pub min_visibility: Option<f64>,

    /// Wrist speed threshold
    #[arg(long)]
    pub speed_threshold: Option<f64>,

    /// Arm extension threshold
    #[arg(long)]
    pub extension_threshold: Option<f64>,

    /// Elbow angle threshold in degrees (60..180)
    #[arg(long)]
    pub elbow_angle_threshold: Option<f64>,

    /// Minimum seconds between counted punches
    #[arg(long)]
    pub cooldown_sec: Option<f64>,

    /// Maximum gap in seconds between punches of one combo
    #[arg(long)]
    pub combo_gap_sec: Option<f64>,

    /// Timeline bucket width in seconds
    #[arg(long)]
    pub timeline_bucket_sec: Option<f64>,

    /// Video file to analyze
    pub file: Option<PathBuf>,
}

impl Cli {
    /// Whether this invocation hands the terminal to the interactive UI.
    pub fn is_interactive(&self) -> bool {
        cfg!(feature = "tui") && !self.json && !self.text && !self.export_csv
    }

    fn overrides(&self) -> Vec<(ConfigField, ConfigValue)> {
        let mut out = Vec::new();
        if let Some(p) = &self.preset {
            out.push((ConfigField::Preset, ConfigValue::Text(p.clone())));
        }
        let numeric = [
            (ConfigField::MinConfidence, self.min_confidence),
            (ConfigField::MinVisibility, self.min_visibility),
            (ConfigField::SpeedThreshold, self.speed_threshold),
            (ConfigField::ExtensionThreshold, self.extension_threshold),
            (ConfigField::ElbowAngleThreshold, self.elbow_angle_threshold),
            (ConfigField::CooldownSec, self.cooldown_sec),
            (ConfigField::ComboGapSec, self.combo_gap_sec),
            (ConfigField::TimelineBucketSec, self.timeline_bucket_sec),
        ];
        for (field, v) in numeric {
            if let Some(n) = v {
                out.push((field, ConfigValue::Number(n)));
            }
        }
        out
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!(
            "--json and --text are mutually exclusive. Pick one output mode."
        ));
    }

    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
    }

    if args.json {
        return run_json(args).await;
    }

    run_text(args).await
}

/// Build `SessionOptions` from CLI arguments.
pub fn build_session_options(args: &Cli) -> Result<SessionOptions> {
    let mut store = ConfigStore::new(DetectionConfig::default());
    for (field, value) in args.overrides() {
        store
            .set(field, value)
            .with_context(|| format!("apply --{}", field.name().replace('_', "-")))?;
    }

    let download_dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => match dirs::download_dir() {
            Some(dir) => dir,
            None => std::env::current_dir().context("get current directory")?,
        },
    };

    Ok(SessionOptions {
        download_dir,
        initial_config: store.get().clone(),
    })
}

/// Compose the HTTP service and a session primed with the CLI's file and settings.
pub fn build_session(args: &Cli) -> Result<Arc<Session>> {
    let timeout = args.timeout.map(Duration::from);
    let service = HttpPunchService::new(&args.base_url, timeout)?;
    let session = Session::new(Arc::new(service), build_session_options(args)?);
    session.set_file(args.file.clone().map(SelectedFile::new));
    Ok(Arc::new(session))
}

/// Bootstrap and report service state on stderr.
async fn bootstrap_and_report(
    args: &Cli,
    session: &Session,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) {
    session.bootstrap().await;
    let snap = session.snapshot();
    let _ = out_tx.send(OutputLine::Stderr(format!(
        "{} ({})",
        snap.health.text, args.base_url
    )));
    if !snap.presets.contains(&snap.config.preset) {
        log::warn!(
            "preset '{}' is not offered by the service (available: {})",
            snap.config.preset,
            snap.presets.names().join(", ")
        );
    }
}

/// Drive a submission, echoing the session status once it is actually in flight.
/// Submissions rejected up front report only their final status.
async fn announce_started<T>(
    session: &Session,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
    submission: impl Future<Output = T>,
) -> T {
    tokio::pin!(submission);
    if let Poll::Ready(out) = futures::poll!(&mut submission) {
        return out;
    }
    let _ = out_tx.send(OutputLine::Stderr(session.snapshot().status));
    submission.await
}

async fn run_text(args: Cli) -> Result<()> {
    let session = build_session(&args)?;
    let (out_tx, out_handle) = spawn_output_writer();

    bootstrap_and_report(&args, &session, &out_tx).await;

    let res = if args.export_csv {
        let outcome = announce_started(&session, &out_tx, session.run_export_csv()).await;
        let _ = out_tx.send(OutputLine::Stderr(session.snapshot().status));
        outcome
            .map(|path| {
                let _ = out_tx.send(OutputLine::Stdout(format!("Saved: {}", path.display())));
            })
            .context("CSV export failed")
    } else {
        let outcome = announce_started(&session, &out_tx, session.run_analyze()).await;
        let _ = out_tx.send(OutputLine::Stderr(session.snapshot().status));
        outcome
            .map(|result| {
                let vm = crate::view_model::project(&result);
                for line in crate::text_summary::build_text_summary(&vm).lines {
                    let _ = out_tx.send(OutputLine::Stdout(line));
                }
            })
            .context("analysis failed")
    };

    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn run_json(args: Cli) -> Result<()> {
    let session = build_session(&args)?;
    let (out_tx, out_handle) = spawn_output_writer();

    bootstrap_and_report(&args, &session, &out_tx).await;

    let res = if args.export_csv {
        session
            .run_export_csv()
            .await
            .context("CSV export failed")
            .and_then(|path| {
                let out = serde_json::to_string_pretty(&serde_json::json!({
                    "status": session.snapshot().status,
                    "path": path,
                }))?;
                let _ = out_tx.send(OutputLine::Stdout(out));
                Ok(())
            })
    } else {
        session
            .run_analyze()
            .await
            .context("analysis failed")
            .and_then(|result| {
                let out = serde_json::to_string_pretty(&result.raw)?;
                let _ = out_tx.send(OutputLine::Stdout(out));
                Ok(())
            })
    };

    drop(out_tx);
    let _ = out_handle.await;
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_flow_into_initial_config() {
        let args = Cli::parse_from([
            "punch-console",
            "--preset",
            "aggressive",
            "--cooldown-sec",
            "0.3",
            "--out-dir",
            "/tmp/exports",
            "fight.mp4",
        ]);
        let opts = build_session_options(&args).unwrap();
        assert_eq!(opts.initial_config.preset, "aggressive");
        assert_eq!(opts.initial_config.cooldown_sec, 0.3);
        assert_eq!(opts.initial_config.combo_gap_sec, 0.8);
        assert_eq!(opts.download_dir, PathBuf::from("/tmp/exports"));
        assert_eq!(args.file, Some(PathBuf::from("fight.mp4")));
    }

    fn drain(mut rx: mpsc::UnboundedReceiver<OutputLine>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            match line {
                OutputLine::Stdout(l) | OutputLine::Stderr(l) => lines.push(l),
            }
        }
        lines
    }

    #[tokio::test]
    async fn rejected_submission_is_not_announced() {
        let args = Cli::parse_from(["punch-console", "--text"]);
        let session = build_session(&args).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        let res = announce_started(&session, &tx, session.run_analyze()).await;
        assert!(res.is_err());
        drop(tx);
        assert!(drain(rx).is_empty());
        assert_eq!(session.snapshot().status, crate::orchestrator::STATUS_NO_FILE);
    }

    #[tokio::test]
    async fn pending_submission_announces_current_status() {
        let args = Cli::parse_from(["punch-console", "--text"]);
        let session = build_session(&args).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        let out = announce_started(&session, &tx, async {
            tokio::task::yield_now().await;
            7
        })
        .await;
        assert_eq!(out, 7);
        drop(tx);
        assert_eq!(drain(rx).len(), 1);
    }

    #[test]
    fn one_shot_flags_disable_tui() {
        let args = Cli::parse_from(["punch-console", "--text", "clip"]);
        assert!(!args.is_interactive());
        let args = Cli::parse_from(["punch-console", "--export-csv", "clip"]);
        assert!(!args.is_interactive());
    }
}
