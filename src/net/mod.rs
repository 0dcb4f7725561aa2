//! Shared HTTP plumbing.

pub mod limiter;

use std::time::Duration;

use anyhow::{Context, Result};

const USER_AGENT: &str = concat!("factcheck-scores/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used by every network-facing component.
pub fn http_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")
}
