use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use nfl_picks_terminal::api::PicksApi;
use nfl_picks_terminal::config::AppConfig;
use nfl_picks_terminal::demo_feed::DemoBackend;
use nfl_picks_terminal::export::build_export_job;
use nfl_picks_terminal::format::{history_cell, prediction_cell};
use nfl_picks_terminal::provider::spawn_provider;
use nfl_picks_terminal::state::{
    self, AppState, Delta, ProviderCommand, Screen, TablePage, apply_delta, screen_label,
};
use nfl_picks_terminal::table_sort::{Column, SortableRow, column_label, direction_arrow};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    export_dir: std::path::PathBuf,
}

impl App {
    fn new(config: &AppConfig, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::from_config(config),
            should_quit: false,
            cmd_tx,
            export_dir: config.export_dir.clone(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.show_screen(Screen::Predictions),
            KeyCode::Char('2') => self.show_screen(Screen::History),
            KeyCode::Tab => {
                self.state.toggle_screen();
                self.show_screen(self.state.screen);
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('h') | KeyCode::Left => self.state.cursor_prev(),
            KeyCode::Char('l') | KeyCode::Right => self.state.cursor_next(),
            KeyCode::Char('s') | KeyCode::Enter => self.state.sort_by_cursor(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.request_active(true);
                self.send(ProviderCommand::FetchHealth, "Health");
            }
            KeyCode::Char(']') => {
                if self.state.shift_week(1) {
                    self.request_active(true);
                }
            }
            KeyCode::Char('[') => {
                if self.state.shift_week(-1) {
                    self.request_active(true);
                }
            }
            KeyCode::Char('}') => {
                if self.state.shift_season(1) {
                    self.request_active(true);
                }
            }
            KeyCode::Char('{') => {
                if self.state.shift_season(-1) {
                    self.request_active(true);
                }
            }
            KeyCode::Char('p') | KeyCode::Char('P') => self.request_snapshot(),
            KeyCode::Char('x') | KeyCode::Char('X') => self.request_export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn show_screen(&mut self, screen: Screen) {
        self.state.screen = screen;
        let (season, week) = (self.state.season, self.state.week);
        let stale = match screen {
            Screen::Predictions => self.state.predictions.is_stale(season, week),
            Screen::History => self.state.history.is_stale(season, week),
        };
        if stale {
            self.request_active(false);
        }
    }

    fn send(&mut self, cmd: ProviderCommand, label: &str) -> bool {
        let Some(tx) = &self.cmd_tx else {
            self.state
                .push_log(format!("[INFO] {label} fetch unavailable"));
            return false;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {label} request failed"));
            return false;
        }
        true
    }

    fn request_active(&mut self, announce: bool) {
        match self.state.screen {
            Screen::Predictions => self.request_predictions(announce),
            Screen::History => self.request_history(announce),
        }
    }

    fn request_predictions(&mut self, announce: bool) {
        let (season, week) = (self.state.season, self.state.week);
        self.state.predictions.begin_fetch();
        if self.send(
            ProviderCommand::FetchPredictions { season, week },
            "Predictions",
        ) {
            if announce {
                self.state
                    .push_log(format!("[INFO] Predictions request sent ({season} wk{week})"));
            }
        } else {
            self.state
                .predictions
                .finish_err("Provider unavailable".to_string());
        }
    }

    fn request_history(&mut self, announce: bool) {
        let (season, week, limit) = (self.state.season, self.state.week, self.state.history_limit);
        self.state.history.begin_fetch();
        if self.send(
            ProviderCommand::FetchHistory {
                season,
                week,
                limit,
            },
            "History",
        ) {
            if announce {
                self.state
                    .push_log(format!("[INFO] History request sent ({season} wk{week})"));
            }
        } else {
            self.state
                .history
                .finish_err("Provider unavailable".to_string());
        }
    }

    fn request_snapshot(&mut self) {
        if !self.state.begin_snapshot() {
            self.state.push_log("[INFO] Snapshot already in progress");
            return;
        }
        let (season, week) = (self.state.season, self.state.week);
        if self.send(ProviderCommand::TriggerSnapshot { season, week }, "Snapshot") {
            self.state
                .push_log(format!("[INFO] Snapshot requested ({season} wk{week})"));
        } else {
            apply_delta(
                &mut self.state,
                Delta::SnapshotFailed("Provider unavailable".to_string()),
            );
        }
    }

    fn request_export(&mut self) {
        if self.state.export.active && !self.state.export.done {
            self.state.push_log("[INFO] Export already running");
            return;
        }
        let job = build_export_job(&self.state, &self.export_dir);
        if job.record_count() == 0 {
            self.state.push_log("[INFO] Nothing to export");
            return;
        }
        let path = job.path.display().to_string();
        self.state.export = state::ExportState {
            active: true,
            done: false,
            path: Some(path.clone()),
            message: "Exporting...".to_string(),
            last_updated: Some(Instant::now()),
        };
        if self.send(ProviderCommand::Export(job), "Export") {
            self.state.push_log(format!("[INFO] Export started: {path}"));
        } else {
            apply_delta(
                &mut self.state,
                Delta::ExportFailed("Provider unavailable".to_string()),
            );
        }
    }

    fn on_delta(&mut self, delta: Delta) {
        for cmd in apply_delta(&mut self.state, delta) {
            if !self.send(cmd, "History") {
                self.state
                    .history
                    .finish_err("Provider unavailable".to_string());
            }
        }
    }
}

fn main() -> io::Result<()> {
    let config = AppConfig::load();

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    if config.demo_mode {
        spawn_provider(Arc::new(DemoBackend::new(config.season, config.week)), tx, cmd_rx);
    } else {
        match PicksApi::new(&config.api_base, config.request_timeout_secs) {
            Ok(api) => spawn_provider(Arc::new(api), tx, cmd_rx),
            Err(err) => {
                eprintln!("error: {err:#}");
                return Ok(());
            }
        }
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(&config, Some(cmd_tx));
    if config.demo_mode {
        app.state.push_log("[INFO] Demo mode: serving synthetic predictions");
    }
    app.send(ProviderCommand::FetchHealth, "Health");
    app.request_predictions(true);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            app.on_delta(delta);
        }
        app.state.maybe_clear_export(Instant::now());

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Predictions => render_table(frame, chunks[1], &app.state.predictions, prediction_cell),
        Screen::History => render_table(frame, chunks[1], &app.state.history, history_cell),
    }

    render_status(frame, chunks[2], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[3]);

    let footer = Paragraph::new(footer_text());
    frame.render_widget(footer, chunks[4]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let sort = state.active_sort();
    let title = format!(
        "NFL PICKS | {} | Season {} Week {} | Sort: {} {}",
        screen_label(state.screen),
        state.season,
        state.week,
        column_label(sort.column),
        direction_arrow(sort.direction)
    );
    let source = if state.demo_mode {
        "demo feed".to_string()
    } else {
        state.api_base.clone()
    };
    let health = match (&state.health, &state.health_error) {
        (Some(h), _) if h.ok => {
            let cache = h
                .cache_size
                .map(|n| format!(" | cache {n}"))
                .unwrap_or_default();
            format!("API ok{cache}")
        }
        (Some(_), _) => "API degraded".to_string(),
        (None, Some(err)) => format!("API down: {err}"),
        (None, None) => "API ?".to_string(),
    };
    let line1 = format!("  /\\  {title}");
    let line2 = format!(" (  ) {source} | {health}");
    let line3 = match state.last_snapshot_label() {
        Some(label) => format!("  \\/  {label}"),
        None => "  \\/".to_string(),
    };
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text() -> &'static str {
    "1/2/Tab Page | j/k Row | h/l Column | s Sort | [/] Week | {/} Season | r Reload | p Snapshot | x Export | ? Help | q Quit"
}

fn render_status(frame: &mut Frame, area: Rect, state: &AppState) {
    let (text, style) = if let Some(err) = state.active_error() {
        (format!("Error: {err}"), Style::default().fg(Color::Red))
    } else if let Some(err) = state.snapshot_error.as_deref() {
        (format!("Snapshot error: {err}"), Style::default().fg(Color::Red))
    } else if state.active_loading() {
        ("Loading...".to_string(), Style::default().fg(Color::Yellow))
    } else if state.snapshot_busy {
        ("Saving snapshot...".to_string(), Style::default().fg(Color::Yellow))
    } else if state.export.active {
        (state.export.message.clone(), Style::default().fg(Color::Cyan))
    } else {
        (String::new(), Style::default())
    };
    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_table<R: SortableRow>(
    frame: &mut Frame,
    area: Rect,
    page: &TablePage<R>,
    cell: fn(&R, Column) -> String,
) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths: Vec<Constraint> = page.columns.iter().map(|c| column_width(*c)).collect();
    render_table_header(frame, sections[0], page, &widths);

    let list_area = sections[1];
    let rows = page.sorted_rows();
    if rows.is_empty() {
        let msg = if page.loading {
            "Loading..."
        } else {
            "No rows for this week"
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }
    if list_area.height == 0 {
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(page.selected, rows.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let selected = idx == page.selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths.clone())
            .split(row_area);
        let row = rows[idx];
        for (col_idx, column) in page.columns.iter().enumerate() {
            let text = cell(row, *column);
            let style = cell_style(*column, &text, row_style);
            render_cell_text(frame, cols[col_idx], &text, style);
        }
    }
}

fn render_table_header<R>(frame: &mut Frame, area: Rect, page: &TablePage<R>, widths: &[Constraint]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths.to_vec())
        .split(area);
    let base = Style::default().add_modifier(Modifier::BOLD);

    for (idx, column) in page.columns.iter().enumerate() {
        let mut label = column_label(*column).to_string();
        if page.sort.column == *column {
            label.push(' ');
            label.push_str(direction_arrow(page.sort.direction));
        }
        let style = if idx == page.column_cursor {
            base.add_modifier(Modifier::REVERSED)
        } else {
            base
        };
        render_cell_text(frame, cols[idx], &label, style);
    }
}

fn column_width(column: Column) -> Constraint {
    match column {
        Column::Id | Column::Week => Constraint::Length(5),
        Column::Season => Constraint::Length(7),
        Column::CreatedAt => Constraint::Length(17),
        Column::GameId => Constraint::Min(16),
        Column::AwayTeam | Column::HomeTeam | Column::Pick => Constraint::Length(6),
        Column::PredMargin | Column::KPair => Constraint::Length(8),
        Column::HomeWinProb | Column::PickProb => Constraint::Length(10),
        Column::HomeOffVsAwayDef | Column::AwayOffVsHomeDef => Constraint::Length(12),
        Column::HomeOffEpa
        | Column::AwayDefEpaAllowed
        | Column::AwayOffEpa
        | Column::HomeDefEpaAllowed
        | Column::NetEpaPerPlay => Constraint::Length(9),
    }
}

fn cell_style(column: Column, text: &str, base: Style) -> Style {
    match column {
        Column::PredMargin | Column::NetEpaPerPlay if text.starts_with('+') => base.fg(Color::Green),
        Column::NetEpaPerPlay if !text.starts_with('-') => base.fg(Color::Green),
        Column::PredMargin | Column::NetEpaPerPlay if text.len() > 1 && text.starts_with('-') => {
            base.fg(Color::Red)
        }
        Column::Pick => base.add_modifier(Modifier::BOLD),
        _ => base,
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, text_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "NFL Picks - Help",
        "",
        "Pages:",
        "  1 / 2 / Tab  Predictions / History",
        "  r            Reload page and health",
        "  [ / ]        Previous / next week",
        "  { / }        Previous / next season",
        "",
        "Table:",
        "  j/k or ↑/↓   Move row",
        "  h/l or ←/→   Move column cursor",
        "  s / Enter    Sort by column (again flips)",
        "",
        "Actions:",
        "  p            Save snapshot",
        "  x            Export view to .xlsx",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
