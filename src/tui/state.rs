use crate::model::ConfigField;
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};

/// Form rows: the video path first, then every detection field in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRow {
    File,
    Field(ConfigField),
}

impl FormRow {
    pub const COUNT: usize = ConfigField::ALL.len() + 1;

    pub fn at(index: usize) -> Self {
        match index {
            0 => FormRow::File,
            i => FormRow::Field(ConfigField::ALL[(i - 1).min(ConfigField::ALL.len() - 1)]),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormRow::File => "Video file",
            FormRow::Field(f) => f.label(),
        }
    }
}

/// UI-thread-only state. Session data is read from snapshots, never stored here.
#[derive(Debug, Default)]
pub struct UiState {
    pub tab: usize,
    pub selected: usize,
    /// Text being typed into the selected row, if editing.
    pub editing: Option<String>,
    /// Local feedback (clipboard, edit errors); the session status is shown separately.
    pub info: String,
    pub event_scroll: usize,
}

impl UiState {
    pub fn selected_row(&self) -> FormRow {
        FormRow::at(self.selected)
    }

    pub fn move_selection(&mut self, down: bool) {
        self.selected = if down {
            (self.selected + 1).min(FormRow::COUNT - 1)
        } else {
            self.selected.saturating_sub(1)
        };
    }

    pub fn scroll_events(&mut self, down: bool, rows: usize) {
        self.event_scroll = if down {
            (self.event_scroll + 5).min(rows.saturating_sub(1))
        } else {
            self.event_scroll.saturating_sub(5)
        };
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}
