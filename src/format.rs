use chrono::NaiveDateTime;

use crate::rows::{HistoryRow, PredictionRow};
use crate::table_sort::Column;

pub const PLACEHOLDER: &str = "-";

pub fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}%", v * 100.0),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn fmt_signed(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:+.1}"),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn fmt_num(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => PLACEHOLDER.to_string(),
    }
}

fn fmt_text(value: &str) -> String {
    if value.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

pub fn fmt_created_at(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return PLACEHOLDER.to_string();
    };
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return PLACEHOLDER.to_string();
    }
    if let Some(dt) = parse_created_at(cleaned) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    cleaned.replace('T', " ").chars().take(16).collect()
}

fn parse_created_at(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    // Offsets ("+00:00", "Z") are dropped; the backend stores naive UTC.
    let naive = raw
        .strip_suffix('Z')
        .unwrap_or(raw)
        .split('+')
        .next()
        .unwrap_or(raw);
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt);
        }
    }
    None
}

pub fn prediction_cell(row: &PredictionRow, column: Column) -> String {
    match column {
        Column::GameId => fmt_text(&row.game_id),
        Column::Week => row
            .week
            .map(|w| w.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        Column::AwayTeam => fmt_text(&row.away_team),
        Column::HomeTeam => fmt_text(&row.home_team),
        Column::PredMargin => fmt_signed(row.pred_margin),
        Column::HomeWinProb => fmt_pct(row.home_win_prob),
        Column::Pick => row.pick.as_deref().map(fmt_text).unwrap_or_else(|| PLACEHOLDER.to_string()),
        Column::PickProb => fmt_pct(row.pick_prob),
        Column::HomeOffEpa => fmt_num(row.home_off_epa, 3),
        Column::AwayDefEpaAllowed => fmt_num(row.away_def_epa_allowed, 3),
        Column::HomeOffVsAwayDef => fmt_num(row.home_off_vs_away_def, 3),
        Column::AwayOffEpa => fmt_num(row.away_off_epa, 3),
        Column::HomeDefEpaAllowed => fmt_num(row.home_def_epa_allowed, 3),
        Column::AwayOffVsHomeDef => fmt_num(row.away_off_vs_home_def, 3),
        Column::NetEpaPerPlay => fmt_num(row.net_epa_per_play, 3),
        Column::KPair => fmt_num(row.k_pair, 2),
        Column::Id | Column::Season | Column::CreatedAt => PLACEHOLDER.to_string(),
    }
}

pub fn history_cell(row: &HistoryRow, column: Column) -> String {
    match column {
        Column::Id => row
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        Column::Season => row
            .season
            .map(|s| s.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        Column::CreatedAt => fmt_created_at(row.created_at.as_deref()),
        other => prediction_cell(&row.prediction, other),
    }
}
