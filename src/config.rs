//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.activityfeed.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".activityfeed.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Feed rendering settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Persisted document settings.
    #[serde(default)]
    pub document: DocumentConfig,
}

/// GitHub API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Web base URL used for constructed repository links.
    #[serde(default = "default_web_url")]
    pub web_url: String,

    /// Events requested per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            web_url: default_web_url(),
            per_page: default_per_page(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_web_url() -> String {
    "https://github.com".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("activityfeed/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Where repository links in display lines point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UrlSource {
    /// `{web_url}/{owner}/{repo}`.
    #[default]
    Constructed,
    /// The `repo.url` field supplied on the event.
    Payload,
}

/// Feed rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Maximum entries kept in the region. 0 keeps everything.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Include `IssueCommentEvent`s in the feed.
    #[serde(default = "default_true")]
    pub include_comments: bool,

    /// Source of repository links.
    #[serde(default)]
    pub url_source: UrlSource,

    /// Base URL (or relative path) holding `<icon>.svg` images.
    #[serde(default = "default_icon_base_url")]
    pub icon_base_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
            include_comments: true,
            url_source: UrlSource::default(),
            icon_base_url: default_icon_base_url(),
        }
    }
}

fn default_max_lines() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_icon_base_url() -> String {
    "icons".to_string()
}

impl FeedConfig {
    /// The entry cap, `None` when unbounded.
    pub fn cap(&self) -> Option<usize> {
        (self.max_lines > 0).then_some(self.max_lines)
    }
}

/// Separator written between entries in the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Separator {
    /// One entry per line.
    #[default]
    Newline,
    /// Entries separated by an empty line (legacy layout).
    BlankLine,
}

impl Separator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::Newline => "\n",
            Separator::BlankLine => "\n\n",
        }
    }
}

/// Persisted document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Path of the document to update.
    #[serde(default = "default_path")]
    pub path: String,

    /// Marker opening the activity region.
    #[serde(default = "default_start_marker")]
    pub start_marker: String,

    /// Marker closing the activity region.
    #[serde(default = "default_end_marker")]
    pub end_marker: String,

    /// Separator between entries.
    #[serde(default)]
    pub separator: Separator,

    /// Write each entry's structural key as a trailing HTML comment.
    #[serde(default = "default_true")]
    pub store_keys: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            start_marker: default_start_marker(),
            end_marker: default_end_marker(),
            separator: Separator::default(),
            store_keys: true,
        }
    }
}

fn default_path() -> String {
    "README.md".to_string()
}

fn default_start_marker() -> String {
    "<!-- ACTIVITY_START -->".to_string()
}

fn default_end_marker() -> String {
    "<!-- ACTIVITY_END -->".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load `CONFIG_FILE_NAME` from `dir`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default(dir: &Path) -> Result<Option<Self>> {
        let default_path = dir.join(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(&default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref api_url) = args.api_url {
            self.github.api_url = api_url.trim_end_matches('/').to_string();
        }
        if let Some(ref web_url) = args.web_url {
            self.github.web_url = web_url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = args.timeout {
            self.github.timeout_seconds = timeout;
        }

        if let Some(max_lines) = args.max_lines {
            self.feed.max_lines = max_lines;
        }
        if let Some(url_source) = args.url_source {
            self.feed.url_source = url_source;
        }
        if args.no_comments {
            self.feed.include_comments = false;
        }

        if let Some(ref readme) = args.readme {
            self.document.path = readme.display().to_string();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
