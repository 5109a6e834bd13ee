use std::collections::VecDeque;
use std::time::{Instant, SystemTime};

use crate::config::{AppConfig, MAX_WEEK, MIN_SEASON, MIN_WEEK};
use crate::rows::{Health, HistoryRow, PredictionRow, SnapshotReceipt};
use crate::table_sort::{Column, SortableRow, TableSort};

pub const PREDICTION_COLUMNS: [Column; 14] = [
    Column::Week,
    Column::AwayTeam,
    Column::HomeTeam,
    Column::PredMargin,
    Column::HomeWinProb,
    Column::Pick,
    Column::PickProb,
    Column::NetEpaPerPlay,
    Column::KPair,
    Column::HomeOffEpa,
    Column::AwayDefEpaAllowed,
    Column::AwayOffEpa,
    Column::HomeDefEpaAllowed,
    Column::GameId,
];

pub const HISTORY_COLUMNS: [Column; 10] = [
    Column::CreatedAt,
    Column::Season,
    Column::Week,
    Column::AwayTeam,
    Column::HomeTeam,
    Column::PredMargin,
    Column::HomeWinProb,
    Column::Pick,
    Column::PickProb,
    Column::Id,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Predictions,
    History,
}

/// One sortable page: the fetched rows plus their request/sort state.
#[derive(Debug, Clone)]
pub struct TablePage<R> {
    pub rows: Vec<R>,
    pub loading: bool,
    pub error: Option<String>,
    pub sort: TableSort,
    pub columns: &'static [Column],
    pub column_cursor: usize,
    pub selected: usize,
    pub fetched_at: Option<SystemTime>,
    /// `(season, week)` of the rows currently held.
    pub loaded_for: Option<(i32, u32)>,
}

impl<R: SortableRow> TablePage<R> {
    pub fn new(columns: &'static [Column]) -> Self {
        let sort = TableSort::default();
        let column_cursor = columns
            .iter()
            .position(|c| *c == sort.column)
            .unwrap_or(0);
        Self {
            rows: Vec::new(),
            loading: false,
            error: None,
            sort,
            columns,
            column_cursor,
            selected: 0,
            fetched_at: None,
            loaded_for: None,
        }
    }

    pub fn sorted_rows(&self) -> Vec<&R> {
        self.sort.sorted(&self.rows)
    }

    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn finish_ok(&mut self, rows: Vec<R>) {
        let selected_key = self.selected_key();
        self.rows = rows;
        self.loading = false;
        self.error = None;
        self.fetched_at = Some(SystemTime::now());
        self.reselect(selected_key);
    }

    /// Rows from the previous fetch stay visible.
    pub fn finish_err(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    pub fn is_stale(&self, season: i32, week: u32) -> bool {
        !self.loading && self.loaded_for != Some((season, week))
    }

    pub fn cursor_column(&self) -> Option<Column> {
        self.columns.get(self.column_cursor).copied()
    }

    pub fn cursor_next(&mut self) {
        if self.columns.is_empty() {
            return;
        }
        self.column_cursor = (self.column_cursor + 1) % self.columns.len();
    }

    pub fn cursor_prev(&mut self) {
        if self.columns.is_empty() {
            return;
        }
        self.column_cursor = if self.column_cursor == 0 {
            self.columns.len() - 1
        } else {
            self.column_cursor - 1
        };
    }

    pub fn sort_by_cursor(&mut self) {
        if let Some(column) = self.cursor_column() {
            let selected_key = self.selected_key();
            self.sort.select(column);
            self.reselect(selected_key);
        }
    }

    /// Key of the highlighted row in the sorted view.
    pub fn selected_key(&self) -> Option<String> {
        self.sorted_rows().get(self.selected).map(|row| row.row_key())
    }

    fn reselect(&mut self, key: Option<String>) {
        let pos = key.and_then(|key| {
            self.sorted_rows()
                .iter()
                .position(|row| row.row_key() == key)
        });
        match pos {
            Some(pos) => self.selected = pos,
            None => self.clamp_selection(),
        }
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.rows.len() - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }
}

#[derive(Debug, Clone)]
pub struct ExportState {
    pub active: bool,
    pub done: bool,
    pub path: Option<String>,
    pub message: String,
    pub last_updated: Option<Instant>,
}

impl Default for ExportState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportState {
    pub fn new() -> Self {
        Self {
            active: false,
            done: false,
            path: None,
            message: String::new(),
            last_updated: None,
        }
    }

    pub fn clear_if_done_for(&mut self, now: Instant, keep_secs: u64) {
        if !self.active || !self.done {
            return;
        }
        let Some(last) = self.last_updated else {
            return;
        };
        if now.duration_since(last).as_secs() >= keep_secs {
            *self = Self::new();
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub season: i32,
    pub week: u32,
    pub history_limit: u32,
    pub api_base: String,
    pub demo_mode: bool,
    pub predictions: TablePage<PredictionRow>,
    pub history: TablePage<HistoryRow>,
    pub snapshot_busy: bool,
    pub snapshot_error: Option<String>,
    pub last_snapshot: Option<SnapshotReceipt>,
    pub health: Option<Health>,
    pub health_error: Option<String>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export: ExportState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::from_config(&AppConfig::default())
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            screen: Screen::Predictions,
            season: config.season.max(MIN_SEASON),
            week: config.week.clamp(MIN_WEEK, MAX_WEEK),
            history_limit: config.history_limit,
            api_base: config.api_base.clone(),
            demo_mode: config.demo_mode,
            predictions: TablePage::new(&PREDICTION_COLUMNS),
            history: TablePage::new(&HISTORY_COLUMNS),
            snapshot_busy: false,
            snapshot_error: None,
            last_snapshot: None,
            health: None,
            health_error: None,
            logs: VecDeque::new(),
            help_overlay: false,
            export: ExportState::new(),
        }
    }

    pub fn maybe_clear_export(&mut self, now: Instant) {
        self.export.clear_if_done_for(now, 8);
    }

    pub fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Predictions => Screen::History,
            Screen::History => Screen::Predictions,
        };
    }

    pub fn active_loading(&self) -> bool {
        match self.screen {
            Screen::Predictions => self.predictions.loading,
            Screen::History => self.history.loading,
        }
    }

    pub fn active_error(&self) -> Option<&str> {
        match self.screen {
            Screen::Predictions => self.predictions.error.as_deref(),
            Screen::History => self.history.error.as_deref(),
        }
    }

    pub fn active_sort(&self) -> TableSort {
        match self.screen {
            Screen::Predictions => self.predictions.sort,
            Screen::History => self.history.sort,
        }
    }

    pub fn active_cursor_column(&self) -> Option<Column> {
        match self.screen {
            Screen::Predictions => self.predictions.cursor_column(),
            Screen::History => self.history.cursor_column(),
        }
    }

    pub fn cursor_next(&mut self) {
        match self.screen {
            Screen::Predictions => self.predictions.cursor_next(),
            Screen::History => self.history.cursor_next(),
        }
    }

    pub fn cursor_prev(&mut self) {
        match self.screen {
            Screen::Predictions => self.predictions.cursor_prev(),
            Screen::History => self.history.cursor_prev(),
        }
    }

    pub fn sort_by_cursor(&mut self) {
        match self.screen {
            Screen::Predictions => self.predictions.sort_by_cursor(),
            Screen::History => self.history.sort_by_cursor(),
        }
    }

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::Predictions => self.predictions.select_next(),
            Screen::History => self.history.select_next(),
        }
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::Predictions => self.predictions.select_prev(),
            Screen::History => self.history.select_prev(),
        }
    }

    /// Returns true when the week actually moved.
    pub fn shift_week(&mut self, delta: i32) -> bool {
        let next = (self.week as i32 + delta).clamp(MIN_WEEK as i32, MAX_WEEK as i32) as u32;
        let changed = next != self.week;
        self.week = next;
        changed
    }

    pub fn shift_season(&mut self, delta: i32) -> bool {
        let next = (self.season + delta).max(MIN_SEASON);
        let changed = next != self.season;
        self.season = next;
        changed
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Marks the snapshot busy. Returns false if one is already in flight.
    pub fn begin_snapshot(&mut self) -> bool {
        if self.snapshot_busy {
            return false;
        }
        self.snapshot_busy = true;
        self.snapshot_error = None;
        true
    }

    pub fn last_snapshot_label(&self) -> Option<String> {
        let receipt = self.last_snapshot.as_ref()?;
        let target = match (receipt.season, receipt.week) {
            (Some(season), Some(week)) => format!("{season} wk{week}"),
            _ => format!("{} wk{}", self.season, self.week),
        };
        Some(match receipt.saved {
            Some(saved) => format!("Last snapshot {target}: {saved} rows"),
            None => format!("Last snapshot {target}"),
        })
    }

    fn history_refetch(&mut self) -> ProviderCommand {
        self.history.begin_fetch();
        ProviderCommand::FetchHistory {
            season: self.season,
            week: self.week,
            limit: self.history_limit,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetPredictions {
        season: i32,
        week: u32,
        rows: Vec<PredictionRow>,
    },
    PredictionsFailed(String),
    SetHistory {
        season: i32,
        week: u32,
        rows: Vec<HistoryRow>,
    },
    HistoryFailed(String),
    SnapshotSaved(Option<SnapshotReceipt>),
    SnapshotFailed(String),
    SetHealth(Health),
    HealthFailed(String),
    ExportFinished {
        path: String,
        rows: usize,
    },
    ExportFailed(String),
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchPredictions {
        season: i32,
        week: u32,
    },
    FetchHistory {
        season: i32,
        week: u32,
        limit: u32,
    },
    TriggerSnapshot {
        season: i32,
        week: u32,
    },
    FetchHealth,
    Export(crate::export::ExportJob),
}

/// Folds a provider result into `state` and returns any requests it triggers.
pub fn apply_delta(state: &mut AppState, delta: Delta) -> Vec<ProviderCommand> {
    let mut follow_up = Vec::new();
    match delta {
        Delta::SetPredictions { season, week, rows } => {
            let count = rows.len();
            state.predictions.finish_ok(rows);
            state.predictions.loaded_for = Some((season, week));
            state.push_log(format!(
                "[INFO] Predictions {season} wk{week}: {count} games"
            ));
        }
        Delta::PredictionsFailed(message) => {
            state.push_log(format!("[WARN] Predictions failed: {message}"));
            state.predictions.finish_err(message);
        }
        Delta::SetHistory { season, week, rows } => {
            let count = rows.len();
            state.history.finish_ok(rows);
            state.history.loaded_for = Some((season, week));
            state.push_log(format!(
                "[INFO] History {season} wk{week}: {count} snapshots"
            ));
        }
        Delta::HistoryFailed(message) => {
            state.push_log(format!("[WARN] History failed: {message}"));
            state.history.finish_err(message);
        }
        Delta::SnapshotSaved(receipt) => {
            state.snapshot_busy = false;
            state.snapshot_error = None;
            let saved = receipt
                .as_ref()
                .and_then(|r| r.saved)
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string());
            state.push_log(format!("[INFO] Snapshot saved ({saved} rows)"));
            state.last_snapshot = receipt;
            follow_up.push(state.history_refetch());
        }
        Delta::SnapshotFailed(message) => {
            state.snapshot_busy = false;
            state.push_log(format!("[WARN] Snapshot failed: {message}"));
            state.snapshot_error = Some(message);
        }
        Delta::SetHealth(health) => {
            state.health = Some(health);
            state.health_error = None;
        }
        Delta::HealthFailed(message) => {
            state.push_log(format!("[WARN] Health check failed: {message}"));
            state.health_error = Some(message);
        }
        Delta::ExportFinished { path, rows } => {
            state.export.active = true;
            state.export.done = true;
            state.export.message = format!("Exported {rows} rows");
            state.export.path = Some(path.clone());
            state.export.last_updated = Some(Instant::now());
            state.push_log(format!("[INFO] Export finished: {path} ({rows} rows)"));
        }
        Delta::ExportFailed(message) => {
            state.export.active = true;
            state.export.done = true;
            state.export.message = format!("Export failed: {message}");
            state.export.last_updated = Some(Instant::now());
            state.push_log(format!("[WARN] Export failed: {message}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
    follow_up
}

pub fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Predictions => "PREDICTIONS",
        Screen::History => "HISTORY",
    }
}
