use crate::model::AnalysisResult;
use anyhow::{Context, Result};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

// Clipboard worker channel, started on first copy.
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Start the clipboard worker if needed.
/// Each copy gets its own clipboard handle, held open long enough for Linux
/// clipboard managers to take ownership of the contents.
fn clipboard_worker() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard worker"))
}

/// Queue text for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    clipboard_worker()?
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard worker channel closed"))?;
    Ok(())
}

/// Copy the analysis document as pretty JSON. Returns the copied length in bytes.
pub fn copy_raw_json(result: &AnalysisResult) -> Result<usize> {
    let text = serde_json::to_string_pretty(&result.raw).context("serialize analysis JSON")?;
    copy_to_clipboard(&text)?;
    Ok(text.len())
}
