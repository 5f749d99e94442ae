//! Post-export handling: naming and saving the downloaded CSV.

use crate::error::SubmitError;
use bytes::Bytes;
use std::path::{Path, PathBuf};

const CSV_SUFFIX: &str = "_events.csv";

/// `fight.mp4` -> `fight_events.csv`. Only a trailing `.ext` with a non-empty,
/// dot-free extension is stripped; names without one keep their full text.
pub fn csv_file_name(video_name: &str) -> String {
    let stem = match video_name.rfind('.') {
        Some(i) if i + 1 < video_name.len() => &video_name[..i],
        _ => video_name,
    };
    format!("{stem}{CSV_SUFFIX}")
}

/// Write the export body into `dir`, replacing any previous export of the same video.
pub(crate) async fn save_csv(dir: &Path, video_name: &str, body: &Bytes) -> Result<PathBuf, SubmitError> {
    let path = dir.join(csv_file_name(video_name));
    let save_err = |source| SubmitError::SaveCsv {
        path: path.clone(),
        source,
    };
    tokio::fs::create_dir_all(dir).await.map_err(save_err)?;
    tokio::fs::write(&path, body).await.map_err(save_err)?;
    Ok(path)
}
