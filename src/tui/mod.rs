mod export;
mod help;
mod state;

use crate::cli::{build_session, Cli};
use crate::model::{ConfigField, ConfigValue, SelectedFile};
use crate::orchestrator::{self, Session, SessionSnapshot, UiCommand};
use crate::view_model::{self, ViewModel};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Terminal,
};
use state::{push_wrapped_status_kv, FormRow, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc::{self, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let session = build_session(&args)?;
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_session = session.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_session, cmd_tx));

    let res = orchestrator::run_controller(session, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(session: Arc<Session>, cmd_tx: UnboundedSender<UiCommand>) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState::default();
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now()
        .checked_sub(tick_rate)
        .unwrap_or_else(Instant::now);

    let res = loop {
        if last_tick.elapsed() >= tick_rate {
            let snap = session.snapshot();
            terminal.draw(|f| draw(f.area(), f, &state, &snap)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        let Ok(Event::Key(k)) = event::read() else {
            continue;
        };
        if k.kind != KeyEventKind::Press {
            continue;
        }

        if state.editing.is_some() {
            handle_edit_key(&session, &mut state, k.code);
            continue;
        }

        match (k.modifiers, k.code) {
            (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                let _ = cmd_tx.send(UiCommand::Quit);
                break Ok(());
            }
            (_, KeyCode::Char('a')) => submit(&session, &mut state, &cmd_tx, UiCommand::Analyze),
            (_, KeyCode::Char('c')) => submit(&session, &mut state, &cmd_tx, UiCommand::ExportCsv),
            (_, KeyCode::Char('y')) => match session.snapshot().result {
                Some(r) => {
                    state.info = match export::copy_raw_json(&r) {
                        Ok(n) => format!("✓ Copied raw JSON to clipboard ({n} bytes)"),
                        Err(e) => format!("Clipboard copy failed: {e:#}"),
                    };
                }
                None => state.info = "No analysis result to copy yet.".into(),
            },
            (_, KeyCode::Char('f')) => {
                state.tab = 0;
                state.selected = 0;
                begin_edit(&session, &mut state);
            }
            (_, KeyCode::Enter) if state.tab == 0 => begin_edit(&session, &mut state),
            (_, KeyCode::Up) | (_, KeyCode::Char('k')) => state.move_selection(false),
            (_, KeyCode::Down) | (_, KeyCode::Char('j')) => state.move_selection(true),
            (_, KeyCode::Left) | (_, KeyCode::Right) => {
                if state.selected_row() == FormRow::Field(ConfigField::Preset) {
                    let snap = session.snapshot();
                    let next = snap
                        .presets
                        .cycle(&snap.config.preset, k.code == KeyCode::Right)
                        .to_string();
                    if let Err(e) =
                        session.set_config_field(ConfigField::Preset, ConfigValue::Text(next))
                    {
                        state.info = e.to_string();
                    }
                }
            }
            (_, KeyCode::PageDown) => {
                let rows = session.snapshot().result.map(|r| r.events().len()).unwrap_or(0);
                state.scroll_events(true, rows.min(view_model::MAX_EVENT_ROWS));
            }
            (_, KeyCode::PageUp) => state.scroll_events(false, 0),
            (_, KeyCode::Tab) => state.tab = (state.tab + 1) % 2,
            (_, KeyCode::Char('?')) => state.tab = 1,
            _ => {}
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

/// Triggers are disabled while busy; the session rejects overlaps on its own as well.
fn submit(
    session: &Session,
    state: &mut UiState,
    cmd_tx: &UnboundedSender<UiCommand>,
    cmd: UiCommand,
) {
    if session.is_busy() {
        state.info = "A request is already running.".into();
        return;
    }
    state.info.clear();
    if matches!(cmd, UiCommand::Analyze) {
        state.event_scroll = 0;
    }
    let _ = cmd_tx.send(cmd);
}

fn begin_edit(session: &Session, state: &mut UiState) {
    let snap = session.snapshot();
    let current = match state.selected_row() {
        FormRow::File => snap
            .file
            .map(|f| f.path.to_string_lossy().into_owned())
            .unwrap_or_default(),
        FormRow::Field(field) => snap.config.get(field).to_string(),
    };
    state.editing = Some(current);
}

fn handle_edit_key(session: &Session, state: &mut UiState, code: KeyCode) {
    let Some(buf) = state.editing.as_mut() else {
        return;
    };
    match code {
        KeyCode::Char(c) => buf.push(c),
        KeyCode::Backspace => {
            buf.pop();
        }
        KeyCode::Esc => state.editing = None,
        KeyCode::Enter => {
            let text = state.editing.take().unwrap_or_default();
            commit_edit(session, state, &text);
        }
        _ => {}
    }
}

fn commit_edit(session: &Session, state: &mut UiState, text: &str) {
    match state.selected_row() {
        FormRow::File => {
            let path = text.trim();
            if path.is_empty() {
                session.set_file(None);
                state.info = "Video cleared".into();
            } else {
                session.set_file(Some(SelectedFile::new(path)));
                state.info = format!("Selected {path}");
            }
        }
        FormRow::Field(field) => {
            let res = field
                .parse_value(text)
                .and_then(|v| session.set_config_field(field, v));
            state.info = match res {
                Ok(_) => format!("{} updated", field.label()),
                Err(e) => e.to_string(),
            };
        }
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, snap: &SessionSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let titles = ["Console", "Help"]
        .iter()
        .map(|t| Line::from(Span::raw(*t)))
        .collect::<Vec<_>>();
    let tabs = Tabs::new(titles)
        .select(state.tab)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(health_title(snap)),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_console(chunks[1], f, state, snap),
        _ => help::draw_help(chunks[1], f),
    }
}

fn health_title(snap: &SessionSnapshot) -> Line<'static> {
    let color = if snap.health.ok { Color::Green } else { Color::Red };
    Line::from(vec![
        Span::raw("Boxing AI Console "),
        Span::styled("●", Style::default().fg(color)),
        Span::raw(format!(" {} ", snap.health.text)),
    ])
}

fn draw_console(area: Rect, f: &mut ratatui::Frame, state: &UiState, snap: &SessionSnapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(7)].as_ref())
        .split(cols[0]);

    draw_form(left[0], f, state, snap);
    draw_status(left[1], f, state, snap);

    match snap.result.as_deref() {
        Some(r) => draw_results(cols[1], f, state, &view_model::project(r)),
        None => {
            let msg = if snap.busy {
                "Waiting for the service..."
            } else {
                "No results yet. Select a video and press 'a'."
            };
            let p = Paragraph::new(msg).block(Block::default().borders(Borders::ALL).title("Results"));
            f.render_widget(p, cols[1]);
        }
    }
}

fn draw_form(area: Rect, f: &mut ratatui::Frame, state: &UiState, snap: &SessionSnapshot) {
    let mut lines = Vec::with_capacity(FormRow::COUNT + 2);
    for i in 0..FormRow::COUNT {
        let row = FormRow::at(i);
        let selected = i == state.selected;
        let value = match (&state.editing, selected) {
            (Some(buf), true) => format!("{buf}▏"),
            _ => match row {
                FormRow::File => snap
                    .file
                    .as_ref()
                    .map(|file| file.name())
                    .unwrap_or_else(|| "-".into()),
                FormRow::Field(field) => snap.config.get(field).to_string(),
            },
        };
        let hint = match row {
            FormRow::Field(ConfigField::Preset) => format!("  [{}]", snap.presets.names().join("|")),
            FormRow::Field(field) => format!("  ({})", field.domain()),
            FormRow::File => String::new(),
        };
        let marker = if selected { "› " } else { "  " };
        let label_style = if selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:<22}", row.label()), label_style),
            Span::raw(value),
            Span::styled(hint, Style::default().fg(Color::DarkGray)),
        ]));
    }

    let action_style = if snap.busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Magenta)
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[a] Analyze", action_style),
        Span::raw("   "),
        Span::styled("[c] Download CSV", action_style),
    ]));

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Analyze Video"),
    );
    f.render_widget(p, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState, snap: &SessionSnapshot) {
    let mut lines = Vec::new();
    let status = if snap.busy {
        format!("{} (busy)", snap.status)
    } else {
        snap.status.clone()
    };
    push_wrapped_status_kv(&mut lines, "Status", &status, area.width);
    if let Some(p) = &snap.last_download {
        push_wrapped_status_kv(&mut lines, "Saved", &p.display().to_string(), area.width);
    }
    push_wrapped_status_kv(&mut lines, "Info", &state.info, area.width);

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

fn draw_results(area: Rect, f: &mut ratatui::Frame, state: &UiState, vm: &ViewModel) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    for (chunk, cards) in rows.iter().take(2).zip(vm.cards.chunks(3)) {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3].as_ref())
            .split(*chunk);
        for (cell, card) in cells.iter().zip(cards) {
            let p = Paragraph::new(Line::from(Span::styled(
                card.value.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )))
            .block(Block::default().borders(Borders::ALL).title(card.label));
            f.render_widget(p, *cell);
        }
    }

    let header = Row::new(["t (s)", "Hand", "Type", "Conf.", "Counted"])
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let body = vm.events.iter().skip(state.event_scroll).map(|e| {
        let counted_style = if e.counted == "yes" {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Row::new(vec![
            Cell::from(e.time_sec.clone()),
            Cell::from(e.hand.clone()),
            Cell::from(e.kind.clone()),
            Cell::from(e.confidence.clone()),
            Cell::from(Span::styled(e.counted, counted_style)),
        ])
    });
    let title = if vm.events.len() < vm.total_events {
        format!("Top Events ({} of {})", vm.events.len(), vm.total_events)
    } else {
        "Top Events".to_string()
    };
    let table = Table::new(
        body,
        [
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, rows[2]);
}
