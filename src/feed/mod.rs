//! Activity feed aggregation.
//!
//! Fetching and filtering events, grouping push runs, and rendering
//! display lines.

pub mod render;
pub mod runs;

pub use render::{render_events, RenderOptions};

use crate::error::FeedError;
use crate::github::EventSource;
use crate::models::{Event, EventKind};
use tracing::{debug, info};

/// Whether an event belongs to the recognized set.
///
/// Issue comments are only recognized when `include_comments` is set.
pub fn is_relevant(event: &Event, include_comments: bool) -> bool {
    match EventKind::parse(&event.kind) {
        Some(EventKind::IssueComment) => include_comments,
        Some(_) => true,
        None => false,
    }
}

/// Fetch every page of `username`'s public events and keep the recognized ones.
///
/// Order is preserved as delivered (newest first).
pub async fn fetch_relevant_events<S: EventSource>(
    source: &S,
    username: &str,
    include_comments: bool,
) -> Result<Vec<Event>, FeedError> {
    let events = source.list_public_events(username).await?;
    let total = events.len();

    let relevant: Vec<Event> = events
        .into_iter()
        .filter(|event| is_relevant(event, include_comments))
        .collect();

    if let (Some(newest), Some(oldest)) = (
        relevant.first().and_then(|e| e.created_at),
        relevant.last().and_then(|e| e.created_at),
    ) {
        debug!(
            "Relevant events span {} to {}",
            oldest.format("%Y-%m-%d %H:%M UTC"),
            newest.format("%Y-%m-%d %H:%M UTC")
        );
    }

    info!("Kept {} of {} events", relevant.len(), total);
    Ok(relevant)
}
