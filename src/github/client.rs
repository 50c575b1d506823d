//! GitHub REST client for the public events listing.
//!
//! Pages are fetched one after another by following the `Link` header
//! until GitHub stops returning a `rel="next"` URL.

use crate::config::GitHubConfig;
use crate::error::FeedError;
use crate::models::Event;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{ACCEPT, LINK};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info};

const API_VERSION: &str = "2022-11-28";

/// Source of a user's public events, newest first.
pub trait EventSource {
    /// List every page of public events for `username`.
    async fn list_public_events(&self, username: &str) -> Result<Vec<Event>, FeedError>;
}

/// Authenticated client for the GitHub events API.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    per_page: u32,
    token: String,
    show_progress: bool,
}

impl GitHubClient {
    /// Creates a client from configuration and an access token.
    pub fn new(config: &GitHubConfig, token: &str) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                FeedError::SourceUnavailable(format!("failed to create HTTP client: {}", e))
            })?;

        Self::with_http_client(http, config, token)
    }

    /// Creates a client around a pre-configured `reqwest::Client`.
    pub fn with_http_client(
        http: reqwest::Client,
        config: &GitHubConfig,
        token: &str,
    ) -> Result<Self, FeedError> {
        if token.trim().is_empty() {
            return Err(FeedError::Auth("no access token provided".to_string()));
        }

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            per_page: config.per_page,
            token: token.trim().to_string(),
            show_progress: false,
        })
    }

    /// Show a spinner while pages are being fetched.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn first_page_url(&self, username: &str) -> String {
        format!(
            "{}/users/{}/events/public?per_page={}",
            self.api_url, username, self.per_page
        )
    }

    /// Fetch one page, returning its events and the next page URL if any.
    async fn fetch_page(&self, url: &str) -> Result<(Vec<Event>, Option<String>), FeedError> {
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FeedError::SourceUnavailable(format!("request timed out: {}", url))
                } else if e.is_connect() {
                    FeedError::SourceUnavailable(format!("cannot connect to {}", self.api_url))
                } else {
                    FeedError::SourceUnavailable(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let rate_limited = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|remaining| remaining.trim() == "0");
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, rate_limited, &body));
        }

        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_url);

        let events: Vec<Event> = response.json().await.map_err(|e| {
            FeedError::SourceUnavailable(format!("failed to decode events page: {}", e))
        })?;

        Ok((events, next))
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

impl EventSource for GitHubClient {
    async fn list_public_events(&self, username: &str) -> Result<Vec<Event>, FeedError> {
        info!("Fetching public events for {}", username);

        let progress = self.spinner();
        let mut events = Vec::new();
        let mut next = Some(self.first_page_url(username));
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let result = self.fetch_page(&url).await;
            let (page, following) = match result {
                Ok(page) => page,
                Err(e) => {
                    if let Some(pb) = &progress {
                        pb.abandon_with_message("Fetch failed");
                    }
                    return Err(e);
                }
            };

            pages += 1;
            events.extend(page);
            if let Some(pb) = &progress {
                pb.set_message(format!("{} events from {} page(s)", events.len(), pages));
            }

            // Stop if a page links back to itself.
            next = following.filter(|following| *following != url);
        }

        if let Some(pb) = progress {
            pb.finish_with_message(format!("Fetched {} events", events.len()));
        }

        info!("Fetched {} events across {} page(s)", events.len(), pages);
        Ok(events)
    }
}

/// Map an unsuccessful response to the error taxonomy.
pub fn classify_failure(status: StatusCode, rate_limited: bool, body: &str) -> FeedError {
    let message = error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string()
    });
    let detail = format!("HTTP {}: {}", status.as_u16(), message);

    match status {
        StatusCode::UNAUTHORIZED => FeedError::Auth(detail),
        StatusCode::FORBIDDEN if !rate_limited => FeedError::Auth(detail),
        _ => FeedError::SourceUnavailable(detail),
    }
}

/// The `message` field of a GitHub error body, if there is one.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(String::from)
}

/// Extract the `rel="next"` URL from a `Link` header.
pub fn next_page_url(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(String::from)
    })
}
