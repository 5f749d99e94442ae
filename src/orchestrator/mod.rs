//! Application-level orchestration.
//!
//! This module owns the analysis session (configuration, bootstrap, single-flight
//! submissions) and post-export handling. Shells call into it and only render.

mod bootstrap;
#[cfg(feature = "tui")]
mod controller;
mod post_process;
mod session;

#[cfg(feature = "tui")]
pub(crate) use controller::{run_controller, UiCommand};
pub use post_process::csv_file_name;
pub use session::{
    Session, SessionOptions, SessionSnapshot, STATUS_ANALYZED, STATUS_ANALYZING,
    STATUS_CSV_DONE, STATUS_NO_FILE, STATUS_PREPARING_CSV,
};
