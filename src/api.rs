use anyhow::{Result, anyhow};
use reqwest::blocking::{Client, RequestBuilder};

use crate::config::normalize_base_url;
use crate::http_client::http_client;
use crate::rows::{
    Health, HistoryRow, PredictionRow, SnapshotReceipt, parse_health_json,
    parse_history_rows_json, parse_prediction_rows_json, parse_snapshot_receipt_json,
};

const NETWORK_ERROR_FALLBACK: &str = "Network error";

/// What the UI needs from the prediction service.
pub trait PicksBackend: Send + Sync {
    fn predictions(&self, season: i32, week: u32) -> Result<Vec<PredictionRow>>;
    fn history(&self, season: i32, week: u32, limit: u32) -> Result<Vec<HistoryRow>>;
    /// `Ok(None)` means the trigger succeeded but the body was not a receipt.
    fn snapshot(&self, season: i32, week: u32) -> Result<Option<SnapshotReceipt>>;
    fn health(&self) -> Result<Health>;
}

pub struct PicksApi {
    client: Client,
    base: String,
}

impl PicksApi {
    pub fn new(base: &str, timeout_secs: u64) -> Result<Self> {
        let client = http_client(Some(timeout_secs))?.clone();
        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: Client, base: &str) -> Self {
        Self {
            client,
            base: normalize_base_url(base),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn fetch_text(&self, req: RequestBuilder) -> Result<String> {
        let resp = req.send().map_err(transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {}", status.as_u16()));
        }
        resp.text().map_err(transport_error)
    }
}

impl PicksBackend for PicksApi {
    fn predictions(&self, season: i32, week: u32) -> Result<Vec<PredictionRow>> {
        let req = self
            .client
            .get(self.url("/predict"))
            .query(&[("season", season.to_string()), ("week", week.to_string())]);
        let body = self.fetch_text(req)?;
        parse_prediction_rows_json(&body)
    }

    fn history(&self, season: i32, week: u32, limit: u32) -> Result<Vec<HistoryRow>> {
        let req = self.client.get(self.url("/history")).query(&[
            ("season", season.to_string()),
            ("week", week.to_string()),
            ("limit", limit.to_string()),
        ]);
        let body = self.fetch_text(req)?;
        parse_history_rows_json(&body)
    }

    fn snapshot(&self, season: i32, week: u32) -> Result<Option<SnapshotReceipt>> {
        let req = self
            .client
            .post(self.url("/predict/snapshot"))
            .query(&[("season", season.to_string()), ("week", week.to_string())]);
        let body = self.fetch_text(req)?;
        Ok(parse_snapshot_receipt_json(&body))
    }

    fn health(&self) -> Result<Health> {
        let body = self.fetch_text(self.client.get(self.url("/health")))?;
        parse_health_json(&body)
    }
}

fn transport_error(err: reqwest::Error) -> anyhow::Error {
    let msg = err.to_string();
    if msg.trim().is_empty() {
        anyhow!(NETWORK_ERROR_FALLBACK)
    } else {
        anyhow!(msg)
    }
}

/// Display form of a fetch failure, including any context chain.
pub fn error_message(err: &anyhow::Error) -> String {
    let msg = format!("{err:#}");
    if msg.trim().is_empty() {
        NETWORK_ERROR_FALLBACK.to_string()
    } else {
        msg
    }
}
