//! GitHub API access.
//!
//! This module provides the event source used by the feed pipeline.

pub mod client;

pub use client::{EventSource, GitHubClient};
