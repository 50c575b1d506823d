//! Error taxonomy for the activity feed pipeline.
//!
//! Every failure aborts the run. The variants only exist so the final
//! message says which stage gave up.

use thiserror::Error;

/// Errors raised while fetching, rendering, or merging the feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The access token is missing, invalid, or expired.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The event source could not be reached or returned an unusable page.
    #[error("event source unavailable: {0}")]
    SourceUnavailable(String),

    /// The persisted document does not contain exactly one well-ordered region.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A recognized event type is missing a payload field needed to render it.
    #[error("malformed {kind} event {id}: {reason}")]
    MalformedEvent {
        kind: String,
        id: String,
        reason: String,
    },
}

impl FeedError {
    /// Short label for the error kind, used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            FeedError::Auth(_) => "AuthError",
            FeedError::SourceUnavailable(_) => "SourceUnavailable",
            FeedError::MalformedDocument(_) => "MalformedDocument",
            FeedError::MalformedEvent { .. } => "MalformedEvent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = FeedError::Auth("Bad credentials".to_string());
        assert_eq!(err.to_string(), "authentication failed: Bad credentials");

        let err = FeedError::MalformedEvent {
            kind: "PushEvent".to_string(),
            id: "42".to_string(),
            reason: "missing field `commits`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed PushEvent event 42: missing field `commits`"
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(FeedError::Auth(String::new()).label(), "AuthError");
        assert_eq!(
            FeedError::SourceUnavailable(String::new()).label(),
            "SourceUnavailable"
        );
        assert_eq!(
            FeedError::MalformedDocument(String::new()).label(),
            "MalformedDocument"
        );
    }
}
