//! Data models for the activity feed.
//!
//! This module contains the event records read from GitHub, the typed
//! activities they are classified into, and the entries persisted in the
//! profile document.

use crate::error::FeedError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Repository reference carried by every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// Full name, `owner/repo`.
    pub name: String,
    /// API URL of the repository as supplied on the event.
    #[serde(default)]
    pub url: String,
}

/// A single public event as returned by the events API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event id (a numeric string on GitHub).
    #[serde(default)]
    pub id: String,
    /// Event type name, e.g. `PushEvent`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Repository the event happened in.
    pub repo: RepoRef,
    /// Type-specific payload.
    #[serde(default)]
    pub payload: Value,
    /// When the event was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Event types the feed knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Push,
    PullRequest,
    Issues,
    IssueComment,
}

impl EventKind {
    /// Parse an API type name. Unknown types yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "PushEvent" => Some(EventKind::Push),
            "PullRequestEvent" => Some(EventKind::PullRequest),
            "IssuesEvent" => Some(EventKind::Issues),
            "IssueCommentEvent" => Some(EventKind::IssueComment),
            _ => None,
        }
    }

    /// The API type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Push => "PushEvent",
            EventKind::PullRequest => "PullRequestEvent",
            EventKind::Issues => "IssuesEvent",
            EventKind::IssueComment => "IssueCommentEvent",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Icon shown in front of a display line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Pushed,
    Merged,
    Opened,
    Closed,
    Reopened,
    Commented,
}

impl Icon {
    /// File stem of the icon image.
    pub fn name(&self) -> &'static str {
        match self {
            Icon::Pushed => "pushed",
            Icon::Merged => "merged",
            Icon::Opened => "opened",
            Icon::Closed => "closed",
            Icon::Reopened => "reopened",
            Icon::Commented => "commented",
        }
    }
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(default)]
    commits: Option<Vec<Value>>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    head: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    action: String,
    pull_request: PullRequestRef,
}

#[derive(Debug, Deserialize)]
struct PullRequestRef {
    number: u64,
    html_url: String,
    #[serde(default)]
    merged: bool,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    action: String,
    issue: IssueRef,
}

#[derive(Debug, Deserialize)]
struct IssueRef {
    number: u64,
    html_url: String,
}

/// An event decoded into the fields the feed renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    /// One push, or a run of adjacent pushes to the same repository.
    Push {
        repo: RepoRef,
        /// Total commits across the run.
        commits: u64,
        /// Number of push events in the run.
        pushes: usize,
        /// Head sha of the oldest push, or its event id when the payload has none.
        anchor: Option<String>,
    },
    PullRequest {
        repo: RepoRef,
        action: String,
        number: u64,
        url: String,
        merged: bool,
    },
    Issue {
        repo: RepoRef,
        action: String,
        number: u64,
        url: String,
    },
    IssueComment {
        repo: RepoRef,
        action: String,
        number: u64,
        url: String,
    },
}

impl Activity {
    /// Classify an event.
    ///
    /// Returns `Ok(None)` for event types outside the recognized set and
    /// `MalformedEvent` when a recognized type lacks a field it needs.
    pub fn from_event(event: &Event) -> Result<Option<Self>, FeedError> {
        let Some(kind) = EventKind::parse(&event.kind) else {
            return Ok(None);
        };
        let repo = event.repo.clone();

        let activity = match kind {
            EventKind::Push => {
                let payload: PushPayload = decode_payload(event)?;
                let commits = match (payload.commits, payload.size) {
                    (Some(commits), _) => commits.len() as u64,
                    (None, Some(size)) => size,
                    (None, None) => {
                        return Err(malformed(event, "missing field `commits`".to_string()))
                    }
                };
                let anchor = payload
                    .head
                    .filter(|sha| !sha.is_empty())
                    .or_else(|| (!event.id.is_empty()).then(|| event.id.clone()));
                Activity::Push {
                    repo,
                    commits,
                    pushes: 1,
                    anchor,
                }
            }
            EventKind::PullRequest => {
                let payload: PullRequestPayload = decode_payload(event)?;
                Activity::PullRequest {
                    repo,
                    action: payload.action,
                    number: payload.pull_request.number,
                    url: payload.pull_request.html_url,
                    merged: payload.pull_request.merged,
                }
            }
            EventKind::Issues => {
                let payload: IssuePayload = decode_payload(event)?;
                Activity::Issue {
                    repo,
                    action: payload.action,
                    number: payload.issue.number,
                    url: payload.issue.html_url,
                }
            }
            EventKind::IssueComment => {
                let payload: IssuePayload = decode_payload(event)?;
                Activity::IssueComment {
                    repo,
                    action: payload.action,
                    number: payload.issue.number,
                    url: payload.issue.html_url,
                }
            }
        };

        Ok(Some(activity))
    }

    /// Repository the activity belongs to.
    pub fn repo(&self) -> &RepoRef {
        match self {
            Activity::Push { repo, .. }
            | Activity::PullRequest { repo, .. }
            | Activity::Issue { repo, .. }
            | Activity::IssueComment { repo, .. } => repo,
        }
    }

    /// Icon for the activity, or `None` when its action is not one the feed shows.
    pub fn icon(&self) -> Option<Icon> {
        match self {
            Activity::Push { .. } => Some(Icon::Pushed),
            Activity::PullRequest { merged: true, .. } => Some(Icon::Merged),
            Activity::PullRequest { action, .. } => match action.as_str() {
                "opened" => Some(Icon::Opened),
                "closed" => Some(Icon::Closed),
                _ => None,
            },
            Activity::Issue { action, .. } => match action.as_str() {
                "opened" => Some(Icon::Opened),
                "closed" => Some(Icon::Closed),
                "reopened" => Some(Icon::Reopened),
                _ => None,
            },
            Activity::IssueComment { action, .. } => {
                (action == "created").then_some(Icon::Commented)
            }
        }
    }

    /// Structural dedupe key, independent of how the line is rendered.
    pub fn key(&self) -> Option<String> {
        match self {
            Activity::Push { repo, anchor, .. } => anchor
                .as_ref()
                .map(|anchor| format!("push:{}:{}", repo.name, anchor)),
            Activity::PullRequest {
                repo,
                action,
                number,
                merged,
                ..
            } => {
                let state = if *merged { "merged" } else { action.as_str() };
                Some(format!("pull_request:{}:{}:{}", repo.name, number, state))
            }
            Activity::Issue {
                repo,
                action,
                number,
                ..
            } => Some(format!("issues:{}:{}:{}", repo.name, number, action)),
            Activity::IssueComment {
                repo,
                action,
                number,
                ..
            } => Some(format!("issue_comment:{}:{}:{}", repo.name, number, action)),
        }
    }
}

fn decode_payload<T: DeserializeOwned>(event: &Event) -> Result<T, FeedError> {
    serde_json::from_value(event.payload.clone()).map_err(|e| malformed(event, e.to_string()))
}

fn malformed(event: &Event, reason: String) -> FeedError {
    FeedError::MalformedEvent {
        kind: event.kind.clone(),
        id: event.id.clone(),
        reason,
    }
}

/// One line of the activity region together with its dedupe key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Rendered display line.
    pub text: String,
    /// Structural key derived from the source event. Entries read from a
    /// region written without keys have none.
    pub key: Option<String>,
}

impl Entry {
    /// Creates an entry with a structural key.
    pub fn new(text: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            key: Some(key.into()),
        }
    }

    /// Creates an entry identified only by its text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(kind: &str, payload: Value) -> Event {
        Event {
            id: "1001".to_string(),
            kind: kind.to_string(),
            repo: RepoRef {
                name: "octo/widgets".to_string(),
                url: "https://api.github.com/repos/octo/widgets".to_string(),
            },
            payload,
            created_at: None,
        }
    }

    #[test]
    fn test_event_kind_parse() {
        assert_eq!(EventKind::parse("PushEvent"), Some(EventKind::Push));
        assert_eq!(
            EventKind::parse("IssueCommentEvent"),
            Some(EventKind::IssueComment)
        );
        assert_eq!(EventKind::parse("WatchEvent"), None);
        assert_eq!(EventKind::PullRequest.to_string(), "PullRequestEvent");
    }

    #[test]
    fn test_deserialize_api_event() {
        let raw = json!({
            "id": "22249084947",
            "type": "PushEvent",
            "actor": { "login": "octo" },
            "repo": { "id": 1, "name": "octo/widgets", "url": "https://api.github.com/repos/octo/widgets" },
            "payload": { "head": "abc123", "commits": [{}, {}] },
            "public": true,
            "created_at": "2024-05-01T12:00:00Z"
        });
        let event: Event = serde_json::from_value(raw).unwrap();
        assert_eq!(event.kind, "PushEvent");
        assert_eq!(event.repo.name, "octo/widgets");
        assert!(event.created_at.is_some());
    }

    #[test]
    fn test_push_counts_commits() {
        let activity = Activity::from_event(&event(
            "PushEvent",
            json!({ "head": "abc123", "commits": [{}, {}, {}] }),
        ))
        .unwrap()
        .unwrap();

        match activity {
            Activity::Push {
                commits, anchor, ..
            } => {
                assert_eq!(commits, 3);
                assert_eq!(anchor.as_deref(), Some("abc123"));
            }
            other => panic!("unexpected activity: {:?}", other),
        }
    }

    #[test]
    fn test_push_falls_back_to_size_and_event_id() {
        let activity = Activity::from_event(&event("PushEvent", json!({ "size": 4 })))
            .unwrap()
            .unwrap();
        assert_eq!(
            activity,
            Activity::Push {
                repo: RepoRef {
                    name: "octo/widgets".to_string(),
                    url: "https://api.github.com/repos/octo/widgets".to_string(),
                },
                commits: 4,
                pushes: 1,
                anchor: Some("1001".to_string()),
            }
        );
    }

    #[test]
    fn test_push_without_commits_is_malformed() {
        let err = Activity::from_event(&event("PushEvent", json!({}))).unwrap_err();
        assert!(matches!(err, FeedError::MalformedEvent { .. }));
    }

    #[test]
    fn test_issue_missing_number_is_malformed() {
        let err = Activity::from_event(&event(
            "IssuesEvent",
            json!({ "action": "opened", "issue": { "html_url": "x" } }),
        ))
        .unwrap_err();
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        let result = Activity::from_event(&event("WatchEvent", json!({ "action": "started" })));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_pull_request_icons() {
        let pr = |action: &str, merged: bool| {
            Activity::from_event(&event(
                "PullRequestEvent",
                json!({
                    "action": action,
                    "pull_request": { "number": 7, "html_url": "https://github.com/octo/widgets/pull/7", "merged": merged }
                }),
            ))
            .unwrap()
            .unwrap()
        };

        assert_eq!(pr("closed", true).icon(), Some(Icon::Merged));
        assert_eq!(pr("closed", false).icon(), Some(Icon::Closed));
        assert_eq!(pr("opened", false).icon(), Some(Icon::Opened));
        assert_eq!(pr("synchronize", false).icon(), None);
    }

    #[test]
    fn test_issue_and_comment_icons() {
        let issue = |action: &str| {
            Activity::from_event(&event(
                "IssuesEvent",
                json!({ "action": action, "issue": { "number": 3, "html_url": "u" } }),
            ))
            .unwrap()
            .unwrap()
        };
        assert_eq!(issue("reopened").icon(), Some(Icon::Reopened));
        assert_eq!(issue("assigned").icon(), None);

        let comment = |action: &str| {
            Activity::from_event(&event(
                "IssueCommentEvent",
                json!({ "action": action, "issue": { "number": 3, "html_url": "u" } }),
            ))
            .unwrap()
            .unwrap()
        };
        assert_eq!(comment("created").icon(), Some(Icon::Commented));
        assert_eq!(comment("edited").icon(), None);
    }
}
