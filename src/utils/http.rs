use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::config::Config;

/// Client shared by every provider call. The timeout is the transport
/// default; the studio itself enforces none.
pub fn build_http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_seconds))
        .build()
        .context("Failed to build HTTP client")
}
