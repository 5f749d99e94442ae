//! Operator console for a punch-detection video analysis service.
//!
//! The crate owns the analysis session: detection settings, service bootstrap,
//! single-flight analyze/export submissions and the view-model shown to the user.
//! Pose estimation and punch classification run in the remote service.

pub mod cli;
pub mod config_store;
pub mod engine;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod text_summary;
#[cfg(feature = "tui")]
mod tui;
pub mod view_model;
