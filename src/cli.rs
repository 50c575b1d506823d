//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::UrlSource;
use clap::Parser;
use std::path::PathBuf;

/// activityfeed - keep a profile README's recent activity up to date
///
/// Fetches your public GitHub events, collapses consecutive pushes,
/// and merges the result into the region between
/// `<!-- ACTIVITY_START -->` and `<!-- ACTIVITY_END -->`.
///
/// Examples:
///   activityfeed --user octocat --token $GITHUB_TOKEN
///   activityfeed --readme profile/README.md --max-lines 20
///   activityfeed --dry-run
///   activityfeed --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// GitHub account whose public activity is listed
    ///
    /// Defaults to the owner of $GITHUB_REPOSITORY when running in Actions.
    #[arg(short, long, value_name = "LOGIN", env = "INPUT_USERNAME")]
    pub user: Option<String>,

    /// Access token used for the events API
    ///
    /// Falls back to $GITHUB_TOKEN when not given.
    #[arg(
        short,
        long,
        value_name = "TOKEN",
        env = "INPUT_GITHUB_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,

    /// Document containing the activity region
    #[arg(short, long, value_name = "FILE")]
    pub readme: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .activityfeed.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of entries kept in the region (0 = unbounded)
    #[arg(long, value_name = "COUNT")]
    pub max_lines: Option<usize>,

    /// Where repository links point
    #[arg(long, value_name = "SOURCE")]
    pub url_source: Option<UrlSource>,

    /// Leave issue comments out of the feed
    #[arg(long)]
    pub no_comments: bool,

    /// GitHub REST API base URL
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// GitHub web base URL used for repository links
    #[arg(long, value_name = "URL", env = "GITHUB_SERVER_URL")]
    pub web_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the updated document instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .activityfeed.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for url in [&self.api_url, &self.web_url].into_iter().flatten() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("URL must start with 'http://' or 'https://': {}", url));
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref user) = self.user {
            if user.contains('/') {
                return Err(format!("Invalid GitHub login: {}", user));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The account to query: `--user`, else the owner of `$GITHUB_REPOSITORY`.
    pub fn username(&self) -> Option<String> {
        non_empty(self.user.clone()).or_else(|| {
            std::env::var("GITHUB_REPOSITORY")
                .ok()
                .and_then(|repository| repository_owner(&repository).map(String::from))
        })
    }

    /// The access token: `--token`, else `$GITHUB_TOKEN`.
    pub fn token(&self) -> Option<String> {
        non_empty(self.token.clone()).or_else(|| non_empty(std::env::var("GITHUB_TOKEN").ok()))
    }
}

/// Owner part of an `owner/repo` string.
pub fn repository_owner(repository: &str) -> Option<&str> {
    let (owner, repo) = repository.split_once('/')?;
    (!owner.is_empty() && !repo.is_empty()).then_some(owner)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
