//! Text summary builder for CLI output.

use crate::view_model::ViewModel;

/// Pre-formatted lines for text output.
pub struct TextSummary {
    pub lines: Vec<String>,
}

/// Cards as `label: value` lines followed by the event table.
pub fn build_text_summary(vm: &ViewModel) -> TextSummary {
    let mut lines = Vec::new();

    // Room for the longest label plus its colon.
    let width = vm.cards.iter().map(|c| c.label.len()).max().unwrap_or(0) + 1;
    for c in &vm.cards {
        lines.push(format!("{:<width$}  {}", format!("{}:", c.label), c.value));
    }

    lines.push(String::new());
    if vm.events.len() < vm.total_events {
        lines.push(format!("Top Events (first {} of {})", vm.events.len(), vm.total_events));
    } else {
        lines.push("Top Events".to_string());
    }

    if vm.events.is_empty() {
        lines.push("  (no events)".to_string());
        return TextSummary { lines };
    }

    lines.push(format!(
        "{:>9}  {:<6}  {:<10}  {:>5}  {}",
        "t (s)", "Hand", "Type", "Conf.", "Counted"
    ));
    for e in &vm.events {
        lines.push(format!(
            "{:>9}  {:<6}  {:<10}  {:>5}  {}",
            e.time_sec, e.hand, e.kind, e.confidence, e.counted
        ));
    }

    TextSummary { lines }
}
