//! The persisted profile document.
//!
//! This module merges freshly rendered entries into the document's
//! activity region and writes the result back in one step.

pub mod merge;
pub mod region;

pub use merge::merge_entries;
pub use region::{assemble, parse_entries, split_region};

use crate::config::{Config, Separator};
use crate::error::FeedError;
use crate::models::Entry;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// How the region is located, merged, and written.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub start_marker: String,
    pub end_marker: String,
    pub separator: Separator,
    pub store_keys: bool,
    /// Maximum entries kept, `None` for unbounded.
    pub max_lines: Option<usize>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for DocumentOptions {
    fn from(config: &Config) -> Self {
        Self {
            start_marker: config.document.start_marker.clone(),
            end_marker: config.document.end_marker.clone(),
            separator: config.document.separator,
            store_keys: config.document.store_keys,
            max_lines: config.feed.cap(),
        }
    }
}

/// Merge `fresh` entries into the region of `document`.
///
/// Returns the full updated document. Text outside the markers is copied
/// through unchanged.
pub fn merge_into_document(
    fresh: &[Entry],
    document: &str,
    options: &DocumentOptions,
) -> Result<String, FeedError> {
    let region = split_region(document, &options.start_marker, &options.end_marker)?;
    let persisted = parse_entries(region.body);
    let persisted_count = persisted.len();

    let merged = merge_entries(fresh, persisted, options.max_lines);
    debug!(
        "Merged {} new and {} persisted entries into {}",
        fresh.len(),
        persisted_count,
        merged.len()
    );

    Ok(assemble(
        &region,
        &options.start_marker,
        &options.end_marker,
        &merged,
        options.separator,
        options.store_keys,
    ))
}

/// Replace the file at `path` with `contents`.
///
/// The text goes to a temporary file next to the target, which is then
/// renamed over it, so readers never see a partial document. An existing
/// file keeps its permissions.
pub fn write_document(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = match std::fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to inspect {}", path.display()))
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    temp.write_all(contents.as_bytes())
        .context("Failed to write temporary document")?;
    if let Some(permissions) = permissions {
        temp.as_file()
            .set_permissions(permissions)
            .with_context(|| format!("Failed to copy permissions of {}", path.display()))?;
    }
    temp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{render_events, RenderOptions};
    use crate::models::Event;

    const README: &str = include_str!("../../fixtures/README.md");

    fn plain(texts: &[&str]) -> Vec<Entry> {
        texts.iter().map(|t| Entry::from_text(*t)).collect()
    }

    fn doc(body: &str) -> String {
        format!(
            "# Hello\n\nIntro text.\n<!-- ACTIVITY_START -->{}<!-- ACTIVITY_END -->\n\nFooter *stays*.\n",
            body
        )
    }

    #[test]
    fn test_new_lines_first_in_document() {
        let merged = merge_into_document(
            &plain(&["Y", "Z"]),
            &doc("\nX\nY\n"),
            &DocumentOptions::default(),
        )
        .unwrap();
        assert_eq!(merged, doc("\nY\nZ\nX\n"));
    }

    #[test]
    fn test_idempotent_merge() {
        let lines = plain(&["A", "B"]);
        let original = doc("\nA\nB\n");
        let merged = merge_into_document(&lines, &original, &DocumentOptions::default()).unwrap();
        assert_eq!(merged, original);
    }

    #[test]
    fn test_idempotent_with_rendered_entries() {
        let events: Vec<Event> =
            serde_json::from_str(include_str!("../../fixtures/events.json")).unwrap();
        let relevant: Vec<Event> = events
            .into_iter()
            .filter(|e| crate::feed::is_relevant(e, true))
            .collect();
        let entries = render_events(&relevant, &RenderOptions::default()).unwrap();
        let options = DocumentOptions::default();

        let first = merge_into_document(&entries, README, &options).unwrap();
        let second = merge_into_document(&entries, &first, &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cap_enforced() {
        let options = DocumentOptions {
            max_lines: Some(2),
            ..DocumentOptions::default()
        };
        let merged =
            merge_into_document(&plain(&["A", "B"]), &doc("\nC\nD\n"), &options).unwrap();
        assert_eq!(merged, doc("\nA\nB\n"));
    }

    #[test]
    fn test_unbounded() {
        let options = DocumentOptions {
            max_lines: None,
            ..DocumentOptions::default()
        };
        let fresh: Vec<Entry> = (0..25).map(|i| Entry::from_text(format!("L{}", i))).collect();
        let merged = merge_into_document(&fresh, &doc("\nold\n"), &options).unwrap();
        let region = split_region(&merged, &options.start_marker, &options.end_marker).unwrap();
        assert_eq!(parse_entries(region.body).len(), 26);
    }

    #[test]
    fn test_outside_text_preserved() {
        let merged =
            merge_into_document(&plain(&["new"]), README, &DocumentOptions::default()).unwrap();

        let options = DocumentOptions::default();
        let before = split_region(README, &options.start_marker, &options.end_marker).unwrap();
        let after = split_region(&merged, &options.start_marker, &options.end_marker).unwrap();
        assert_eq!(before.before, after.before);
        assert_eq!(before.after, after.after);
        assert!(merged.starts_with(before.before));
        assert!(merged.ends_with(before.after));
    }

    #[test]
    fn test_legacy_blank_line_region_migrates() {
        let options = DocumentOptions::default();
        let merged =
            merge_into_document(&plain(&["Z"]), &doc("\n\nX\n\nY\n\n"), &options).unwrap();
        assert_eq!(merged, doc("\nZ\nX\nY\n"));
    }

    #[test]
    fn test_blank_line_separator() {
        let options = DocumentOptions {
            separator: Separator::BlankLine,
            ..DocumentOptions::default()
        };
        let merged = merge_into_document(&plain(&["A"]), &doc("\nB\n"), &options).unwrap();
        assert_eq!(merged, doc("\nA\n\nB\n"));
    }

    #[test]
    fn test_missing_end_marker_rejected() {
        let broken = "# Hello\n<!-- ACTIVITY_START -->\nA\n";
        let err = merge_into_document(&plain(&["B"]), broken, &DocumentOptions::default())
            .unwrap_err();
        assert!(matches!(err, FeedError::MalformedDocument(_)));
    }

    #[test]
    fn test_write_document_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");
        std::fs::write(&path, "old").unwrap();

        write_document(&path, "new contents\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new contents\n");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_document_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_document(&path, "new").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }
}
