use std::fs;

use nfl_picks_terminal::export::{build_export_job, export_file_name, write_export};
use nfl_picks_terminal::rows::PredictionRow;
use nfl_picks_terminal::state::{AppState, Delta, Screen, apply_delta};
use nfl_picks_terminal::table_sort::Column;

fn state_with_rows() -> AppState {
    let mut state = AppState::new();
    let rows = vec![
        PredictionRow {
            game_id: "g1".to_string(),
            away_team: "NYJ".to_string(),
            home_team: "NE".to_string(),
            pred_margin: Some(1.0),
            pick_prob: Some(0.53),
            ..PredictionRow::default()
        },
        PredictionRow {
            game_id: "g2".to_string(),
            away_team: "SF".to_string(),
            home_team: "SEA".to_string(),
            pred_margin: Some(-5.0),
            pick_prob: Some(0.64),
            ..PredictionRow::default()
        },
    ];
    apply_delta(
        &mut state,
        Delta::SetPredictions {
            season: 2025,
            week: 10,
            rows,
        },
    );
    state
}

#[test]
fn file_name_encodes_page_and_week() {
    assert_eq!(
        export_file_name(Screen::History, 2024, 7),
        "picks_history_2024_w7.xlsx"
    );
}

#[test]
fn export_job_follows_current_sort() {
    let mut state = state_with_rows();
    let dir = std::env::temp_dir();

    let job = build_export_job(&state, &dir);
    assert_eq!(job.record_count(), 2);
    let game_col = state
        .predictions
        .columns
        .iter()
        .position(|c| *c == Column::GameId)
        .expect("game column");
    // Default sort: pick probability, highest first.
    assert_eq!(job.rows[1][game_col], "g2");
    assert_eq!(job.rows[2][game_col], "g1");

    state.predictions.sort.select(Column::PredMargin);
    let job = build_export_job(&state, &dir);
    assert_eq!(job.rows[1][game_col], "g1");
    assert_eq!(job.rows[0][game_col], "Game");
}

#[test]
fn writes_workbook() {
    let state = state_with_rows();
    let dir = std::env::temp_dir().join(format!("nfl_picks_export_{}", std::process::id()));
    let job = build_export_job(&state, &dir);

    let written = write_export(&job).expect("export should succeed");
    assert_eq!(written, 2);
    let meta = fs::metadata(&job.path).expect("workbook exists");
    assert!(meta.len() > 0);

    let _ = fs::remove_dir_all(&dir);
}
