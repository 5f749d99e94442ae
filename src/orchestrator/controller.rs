//! Submission controller for the interactive shell.
//!
//! Bootstraps the session while turning UI commands into submissions. Each submission
//! runs as its own task; overlap is rejected by the session itself, not by this loop.

use super::Session;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;

/// Commands emitted by the UI thread.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Analyze,
    ExportCsv,
    Quit,
}

#[derive(Debug)]
enum Finished {
    Analyze(bool),
    ExportCsv(bool),
}

pub(crate) async fn run_controller(
    session: Arc<Session>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> anyhow::Result<()> {
    // Bootstrap is polled alongside commands so Quit is honored while the service hangs.
    let boot = session.bootstrap();
    tokio::pin!(boot);
    let mut booted = false;

    let mut tasks: JoinSet<Finished> = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut boot, if !booted => {
                booted = true;
                log::debug!("bootstrap finished");
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Analyze) => {
                        let s = session.clone();
                        tasks.spawn(async move { Finished::Analyze(s.run_analyze().await.is_ok()) });
                    }
                    Some(UiCommand::ExportCsv) => {
                        let s = session.clone();
                        tasks.spawn(async move { Finished::ExportCsv(s.run_export_csv().await.is_ok()) });
                    }
                    // In-flight uploads end with the session; nothing is left to receive them.
                    Some(UiCommand::Quit) | None => break,
                }
            }
            done = async {
                if tasks.is_empty() {
                    futures::future::pending().await
                } else {
                    tasks.join_next().await
                }
            } => {
                match done {
                    Some(Ok(f)) => log::debug!("submission finished: {f:?}"),
                    Some(Err(e)) => log::error!("submission task failed: {e}"),
                    None => {}
                }
            }
        }
    }

    tasks.shutdown().await;
    Ok(())
}
