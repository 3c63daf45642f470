pub mod assistant;
pub mod git;
pub mod jira;
pub mod loader;

use crate::data::{Scope, StatusCategory, Ticket};
use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::time::Duration;
use thiserror::Error;

/// Shared HTTP client for all tracker requests to enable connection pooling
pub static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(5)
        .build()
        .expect("Failed to create HTTP client")
});

/// Why a single ticket fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("tracker returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode tracker response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request timed out")]
    Timeout,
}

/// Source of tickets for one (category, scope) pair.
///
/// Dropping the returned future must abandon the request; the loader relies on
/// that to enforce its deadline.
#[async_trait]
pub trait TicketFetcher: Send + Sync {
    async fn fetch(
        &self,
        category: StatusCategory,
        scope: Scope,
        max_results: u32,
    ) -> Result<Vec<Ticket>, FetchError>;
}

/// Open a URL in the user's browser without blocking.
pub fn open_url(url: &str) -> Result<()> {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    std::process::Command::new(opener)
        .arg(url)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .or_else(|_| {
            // Fallback to wslview for WSL
            std::process::Command::new("wslview").arg(url).spawn()
        })?;
    Ok(())
}
