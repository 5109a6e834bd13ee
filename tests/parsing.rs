use std::fs;
use std::path::PathBuf;

use nfl_picks_terminal::format::{history_cell, prediction_cell};
use nfl_picks_terminal::rows::{
    parse_health_json, parse_history_rows_json, parse_prediction_rows_json,
};
use nfl_picks_terminal::table_sort::Column;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_predictions_fixture() {
    let raw = read_fixture("predictions.json");
    let rows = parse_prediction_rows_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].game_id, "2025_10_BUF_MIA");
    assert_eq!(rows[0].week, Some(10));
    assert_eq!(rows[0].k_pair, Some(61.4));
    assert_eq!(rows[1].net_epa_per_play, None);
    assert_eq!(rows[1].pick.as_deref(), Some("KC"));
    // Missing keys behave like nulls.
    assert_eq!(rows[2].home_off_epa, None);
    assert_eq!(rows[2].pick_prob, Some(0.694));
}

#[test]
fn parses_history_fixture() {
    let raw = read_fixture("history.json");
    let rows = parse_history_rows_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, Some(48));
    assert_eq!(rows[0].season, Some(2025));
    assert_eq!(rows[0].prediction.week, Some(10));
    assert_eq!(rows[0].prediction.game_id, "2025_10_KC_DEN");
    assert_eq!(rows[0].prediction.k_pair, Some(60.12));
    assert_eq!(rows[0].prediction.net_epa_per_play, None);
    assert_eq!(
        rows[1].created_at.as_deref(),
        Some("2025-11-06T09:02:45.118000")
    );
}

#[test]
fn parses_health_fixture() {
    let raw = read_fixture("health.json");
    let health = parse_health_json(&raw).expect("fixture should parse");
    assert!(health.ok);
    assert_eq!(health.cache_size, Some(3));
    let defaults = health.defaults.expect("defaults");
    assert_eq!(defaults.season, Some(2025));
    assert_eq!(defaults.week, Some(10));
}

#[test]
fn null_body_is_empty() {
    assert!(parse_prediction_rows_json("null").expect("null should parse").is_empty());
    assert!(parse_history_rows_json("null").expect("null should parse").is_empty());
}

#[test]
fn non_array_body_is_an_error() {
    let err = parse_prediction_rows_json(r#"{"detail":"Prediction failed"}"#)
        .expect_err("object is not a row list");
    assert!(format!("{err:#}").starts_with("invalid response"));
}

#[test]
fn absent_cells_render_placeholder_not_zero() {
    let raw = read_fixture("predictions.json");
    let rows = parse_prediction_rows_json(&raw).expect("fixture should parse");
    assert_eq!(prediction_cell(&rows[1], Column::NetEpaPerPlay), "-");
    assert_eq!(prediction_cell(&rows[1], Column::KPair), "-");
    assert_eq!(prediction_cell(&rows[1], Column::PickProb), "62.2%");
    assert_eq!(prediction_cell(&rows[1], Column::PredMargin), "-4.2");
    assert_eq!(prediction_cell(&rows[0], Column::NetEpaPerPlay), "-0.023");
}

#[test]
fn history_cells_format_timestamp() {
    let raw = read_fixture("history.json");
    let rows = parse_history_rows_json(&raw).expect("fixture should parse");
    assert_eq!(history_cell(&rows[0], Column::CreatedAt), "2025-11-07 16:20");
    assert_eq!(history_cell(&rows[0], Column::Id), "48");
    assert_eq!(history_cell(&rows[0], Column::Pick), "KC");
}
