use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One game as returned by `GET /predict`.
///
/// Every model output is optional: the backend emits `null` when a team had
/// too few plays to rate, and those must render as a placeholder, not zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionRow {
    #[serde(default, deserialize_with = "de_string_or_number")]
    pub game_id: String,
    #[serde(default)]
    pub week: Option<u32>,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub home_team: String,

    #[serde(default)]
    pub pred_margin: Option<f64>,
    #[serde(default)]
    pub home_win_prob: Option<f64>,
    #[serde(default)]
    pub pick: Option<String>,
    #[serde(default)]
    pub pick_prob: Option<f64>,

    // Efficiency splits (EPA per play, shrunk toward league mean upstream).
    #[serde(default)]
    pub home_off_epa: Option<f64>,
    #[serde(default)]
    pub away_def_epa_allowed: Option<f64>,
    #[serde(default)]
    pub home_off_vs_away_def: Option<f64>,
    #[serde(default)]
    pub away_off_epa: Option<f64>,
    #[serde(default)]
    pub home_def_epa_allowed: Option<f64>,
    #[serde(default)]
    pub away_off_vs_home_def: Option<f64>,
    #[serde(default)]
    pub net_epa_per_play: Option<f64>,
    #[serde(default, rename = "K_pair")]
    pub k_pair: Option<f64>,
}

/// A persisted snapshot from `GET /history`: the stored prediction payload
/// flattened next to the database columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryRow {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub prediction: PredictionRow,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthDefaults {
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default)]
    pub week: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub cache_size: Option<u64>,
    #[serde(default)]
    pub cache_ttl: Option<u64>,
    #[serde(default)]
    pub defaults: Option<HealthDefaults>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapshotReceipt {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub saved: Option<usize>,
    #[serde(default)]
    pub season: Option<i32>,
    #[serde(default)]
    pub week: Option<u32>,
}

pub fn parse_prediction_rows_json(raw: &str) -> Result<Vec<PredictionRow>> {
    let rows: Option<Vec<PredictionRow>> =
        serde_json::from_str(raw).context("invalid response")?;
    Ok(rows.unwrap_or_default())
}

pub fn parse_history_rows_json(raw: &str) -> Result<Vec<HistoryRow>> {
    let rows: Option<Vec<HistoryRow>> = serde_json::from_str(raw).context("invalid response")?;
    Ok(rows.unwrap_or_default())
}

pub fn parse_health_json(raw: &str) -> Result<Health> {
    serde_json::from_str(raw).context("invalid response")
}

/// The snapshot body is informational only; anything unexpected still
/// counts as a successful trigger.
pub fn parse_snapshot_receipt_json(raw: &str) -> Option<SnapshotReceipt> {
    serde_json::from_str(raw).ok()
}

// nflverse game ids are strings ("2025_10_BUF_MIA"), but older payloads
// stored them as numbers.
fn de_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
