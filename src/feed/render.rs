//! Rendering of events into display lines.

use crate::config::{Config, UrlSource};
use crate::error::FeedError;
use crate::feed::runs::group_runs;
use crate::models::{Activity, Entry, Event, Icon, RepoRef};
use tracing::{debug, warn};

/// Settings that shape the rendered text.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Base URL (or relative path) of the icon images.
    pub icon_base_url: String,
    /// Web base URL for constructed repository links.
    pub web_url: String,
    /// Where repository links point.
    pub url_source: UrlSource,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            icon_base_url: config.feed.icon_base_url.clone(),
            web_url: config.github.web_url.clone(),
            url_source: config.feed.url_source,
        }
    }
}

/// Render an ordered event list into display entries.
///
/// Events whose action has no icon are dropped before grouping, so they
/// never split a push run.
pub fn render_events(events: &[Event], options: &RenderOptions) -> Result<Vec<Entry>, FeedError> {
    let mut activities = Vec::with_capacity(events.len());

    for event in events {
        match Activity::from_event(event)? {
            Some(activity) if activity.icon().is_some() => activities.push(activity),
            Some(_) => debug!(
                "Skipping {} {} in {}: unsupported action",
                event.kind, event.id, event.repo.name
            ),
            None => debug!("Skipping unrecognized event type {}", event.kind),
        }
    }

    let groups = group_runs(activities);
    let entries: Vec<Entry> = groups
        .iter()
        .filter_map(|group| render_group(group, options))
        .collect();

    let collapsed: usize = groups
        .iter()
        .map(|group| match group {
            Activity::Push { pushes, .. } => pushes - 1,
            _ => 0,
        })
        .sum();
    debug!(
        "Rendered {} lines from {} events ({} pushes collapsed)",
        entries.len(),
        events.len(),
        collapsed
    );

    Ok(entries)
}

/// Render one group, or `None` when it has no icon or no description.
pub fn render_group(group: &Activity, options: &RenderOptions) -> Option<Entry> {
    let icon = group.icon()?;
    let description = describe(group, options);
    if description.is_empty() {
        return None;
    }

    let text = format!("- {} {}", icon_tag(icon, options), description);
    Some(match group.key() {
        Some(key) => Entry::new(text, key),
        None => Entry::from_text(text),
    })
}

fn describe(group: &Activity, options: &RenderOptions) -> String {
    let repo = group.repo();
    if repo.name.is_empty() {
        return String::new();
    }
    let repo_link = format!("**[{}]({})**", repo.name, repo_url(repo, options));

    match group {
        Activity::Push { commits, .. } => format!(
            "Pushed **{}** {} to {}",
            commits,
            commit_noun(*commits),
            repo_link
        ),
        Activity::PullRequest {
            action,
            number,
            url,
            ..
        } => format!(
            "**{}** Pull Request #[**{}**]({}) in {}",
            capitalize(action),
            number,
            url,
            repo_link
        ),
        Activity::Issue {
            action,
            number,
            url,
            ..
        } => format!(
            "**{}** Issue #[**{}**]({}) in {}",
            capitalize(action),
            number,
            url,
            repo_link
        ),
        Activity::IssueComment { number, url, .. } => format!(
            "Commented on Issue #[**{}**]({}) in {}",
            number, url, repo_link
        ),
    }
}

fn commit_noun(count: u64) -> &'static str {
    if count == 1 {
        "commit"
    } else {
        "commits"
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn icon_tag(icon: Icon, options: &RenderOptions) -> String {
    format!(
        r#"<img src="{}/{}.svg" alt="{}" width="16"/>"#,
        options.icon_base_url.trim_end_matches('/'),
        icon.name(),
        icon.name()
    )
}

fn repo_url(repo: &RepoRef, options: &RenderOptions) -> String {
    let constructed = || format!("{}/{}", options.web_url.trim_end_matches('/'), repo.name);

    match options.url_source {
        UrlSource::Constructed => constructed(),
        UrlSource::Payload if repo.url.is_empty() => {
            warn!(
                "Event for {} has no repository URL; using constructed link",
                repo.name
            );
            constructed()
        }
        UrlSource::Payload => repo.url.clone(),
    }
}
