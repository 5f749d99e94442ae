//! Presentation-ready projection of an analysis result.
//!
//! Total over any document shape: missing or malformed values render as
//! [`PLACEHOLDER`], never as an error or a zero.

use crate::model::{AnalysisResult, PunchEvent};
use serde_json::Value;

pub const PLACEHOLDER: &str = "-";
pub const MAX_EVENT_ROWS: usize = 40;
pub const DEFAULT_DIGITS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCard {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub time_sec: String,
    pub hand: String,
    pub kind: String,
    pub confidence: String,
    pub counted: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub cards: Vec<SummaryCard>,
    pub events: Vec<EventRow>,
    /// Events in the result, including those beyond the table limit.
    pub total_events: usize,
}

pub fn project(result: &AnalysisResult) -> ViewModel {
    let stats = result.video_stats.as_ref();
    let analytics = stats.and_then(|s| s.analytics.as_ref());

    let cards = vec![
        card("Counted punches", display_raw(stats.and_then(|s| s.counted_punches.as_ref()))),
        card("Raw detections", display_raw(stats.and_then(|s| s.detected_punches_raw.as_ref()))),
        card("Pose coverage", format_num(stats.and_then(|s| s.pose_coverage.as_ref()), 2)),
        card(
            "Punches / minute",
            display_raw(analytics.and_then(|a| a.punches_per_minute.as_ref())),
        ),
        card("Combo count", display_raw(analytics.and_then(|a| a.combo_count.as_ref()))),
        card("Max combo", display_raw(analytics.and_then(|a| a.max_combo.as_ref()))),
    ];

    let all = result.events();
    ViewModel {
        cards,
        events: all.iter().take(MAX_EVENT_ROWS).map(event_row).collect(),
        total_events: all.len(),
    }
}

fn card(label: &'static str, value: String) -> SummaryCard {
    SummaryCard { label, value }
}

fn event_row(e: &PunchEvent) -> EventRow {
    EventRow {
        time_sec: format_num(e.time_sec.as_ref(), 3),
        hand: display_text(e.hand.as_ref()),
        kind: display_text(e.kind.as_ref()),
        confidence: format_num(e.confidence.as_ref(), 2),
        counted: if is_truthy(e.counted.as_ref()) { "yes" } else { "no" },
    }
}

/// Fixed-point rendering with `digits` decimals, or the placeholder when the value
/// is absent or does not coerce to a finite number.
pub fn format_num(value: Option<&Value>, digits: usize) -> String {
    match value.and_then(coerce_number) {
        Some(n) => format!("{n:.digits$}"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Numeric coercion of a loosely typed value. Numeric strings are trimmed and parsed,
/// an empty string counts as zero, booleans as one and zero.
fn coerce_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().ok()?
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    n.is_finite().then_some(n)
}

/// Card value shown as received; only absence maps to the placeholder.
fn display_raw(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => PLACEHOLDER.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn display_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
