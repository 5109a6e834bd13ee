use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared client. The first caller fixes the timeout for the process.
pub fn http_client(timeout_secs: Option<u64>) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        build_client(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    })
}

pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("nfl_picks_terminal/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build http client")
}
