//! Locating and rewriting the marked activity region.
//!
//! Text outside the markers is handed back untouched. Inside, each
//! non-blank line is one entry, optionally followed by a key comment:
//!
//! ```text
//! - <img .../> Pushed **2** commits to **[octo/a](...)** <!-- key: push:octo/a:abc123 -->
//! ```

use crate::config::Separator;
use crate::error::FeedError;
use crate::models::Entry;

const KEY_OPEN: &str = " <!-- key: ";
const KEY_CLOSE: &str = " -->";

/// A document split around its activity region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region<'a> {
    /// Everything before the start marker.
    pub before: &'a str,
    /// Text strictly between the markers.
    pub body: &'a str,
    /// Everything after the end marker.
    pub after: &'a str,
}

/// Split `document` on the start and end markers.
///
/// Each marker must occur exactly once, start before end.
pub fn split_region<'a>(
    document: &'a str,
    start_marker: &str,
    end_marker: &str,
) -> Result<Region<'a>, FeedError> {
    let start = find_once(document, start_marker)?;
    let end = find_once(document, end_marker)?;

    let body_start = start + start_marker.len();
    if end < body_start {
        return Err(FeedError::MalformedDocument(format!(
            "{} appears before {}",
            end_marker, start_marker
        )));
    }

    Ok(Region {
        before: &document[..start],
        body: &document[body_start..end],
        after: &document[end + end_marker.len()..],
    })
}

fn find_once(document: &str, marker: &str) -> Result<usize, FeedError> {
    let mut found = document.match_indices(marker).map(|(index, _)| index);
    match (found.next(), found.next()) {
        (Some(index), None) => Ok(index),
        (None, _) => Err(FeedError::MalformedDocument(format!(
            "marker {} not found",
            marker
        ))),
        (Some(_), Some(_)) => Err(FeedError::MalformedDocument(format!(
            "marker {} appears more than once",
            marker
        ))),
    }
}

/// Parse the region body into entries.
///
/// Blank lines are ignored, so bodies written with either separator parse
/// the same way.
pub fn parse_entries(body: &str) -> Vec<Entry> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_entry)
        .collect()
}

fn parse_entry(line: &str) -> Entry {
    let keyed = line
        .strip_suffix(KEY_CLOSE)
        .and_then(|rest| rest.rsplit_once(KEY_OPEN))
        .filter(|(text, key)| !text.is_empty() && !key.is_empty());

    match keyed {
        Some((text, key)) => Entry::new(text.trim_end(), key.trim()),
        None => Entry::from_text(line),
    }
}

/// Format an entry as a single region line.
pub fn format_entry(entry: &Entry, store_keys: bool) -> String {
    match &entry.key {
        Some(key) if store_keys => format!("{}{}{}{}", entry.text, KEY_OPEN, key, KEY_CLOSE),
        _ => entry.text.clone(),
    }
}

/// Reassemble a document around a new set of entries.
pub fn assemble(
    region: &Region<'_>,
    start_marker: &str,
    end_marker: &str,
    entries: &[Entry],
    separator: Separator,
    store_keys: bool,
) -> String {
    let lines: Vec<String> = entries
        .iter()
        .map(|entry| format_entry(entry, store_keys))
        .collect();

    let mut output = String::with_capacity(
        region.before.len() + region.after.len() + lines.iter().map(|l| l.len() + 2).sum::<usize>(),
    );
    output.push_str(region.before);
    output.push_str(start_marker);
    output.push('\n');
    if !lines.is_empty() {
        output.push_str(&lines.join(separator.as_str()));
        output.push('\n');
    }
    output.push_str(end_marker);
    output.push_str(region.after);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "<!-- ACTIVITY_START -->";
    const END: &str = "<!-- ACTIVITY_END -->";

    #[test]
    fn test_split_region() {
        let doc = format!("# Hi\n\n{}\nA\nB\n{}\nbye\n", START, END);
        let region = split_region(&doc, START, END).unwrap();
        assert_eq!(region.before, "# Hi\n\n");
        assert_eq!(region.body, "\nA\nB\n");
        assert_eq!(region.after, "\nbye\n");
    }

    #[test]
    fn test_missing_markers() {
        let doc = format!("{}\nA\n", START);
        assert!(matches!(
            split_region(&doc, START, END),
            Err(FeedError::MalformedDocument(_))
        ));

        let doc = format!("A\n{}\n", END);
        assert!(matches!(
            split_region(&doc, START, END),
            Err(FeedError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_markers_out_of_order() {
        let doc = format!("{}\nA\n{}\n", END, START);
        let err = split_region(&doc, START, END).unwrap_err();
        assert!(err.to_string().contains("appears before"));
    }

    #[test]
    fn test_duplicate_marker() {
        let doc = format!("{}\n{}\nA\n{}\n", START, START, END);
        let err = split_region(&doc, START, END).unwrap_err();
        assert!(err.to_string().contains("appears more than once"));

        let doc = format!("{}\nA\n{}\n{}\n", START, END, END);
        let err = split_region(&doc, START, END).unwrap_err();
        assert!(err.to_string().contains("appears more than once"));
    }

    #[test]
    fn test_parse_both_separators() {
        let single = parse_entries("\n- one\n- two <!-- key: push:o/r:1 -->\n");
        let blank = parse_entries("\n- one\n\n- two <!-- key: push:o/r:1 -->\n");
        assert_eq!(single, blank);
        assert_eq!(
            single,
            vec![Entry::from_text("- one"), Entry::new("- two", "push:o/r:1")]
        );
    }

    #[test]
    fn test_parse_windows_line_endings() {
        let entries = parse_entries("\r\n- one\r\n- two\r\n");
        assert_eq!(entries, vec![Entry::from_text("- one"), Entry::from_text("- two")]);
    }

    #[test]
    fn test_format_entry() {
        let entry = Entry::new("- two", "issues:o/r:3:opened");
        assert_eq!(
            format_entry(&entry, true),
            "- two <!-- key: issues:o/r:3:opened -->"
        );
        assert_eq!(format_entry(&entry, false), "- two");
        assert_eq!(parse_entry(&format_entry(&entry, true)), entry);
    }

    #[test]
    fn test_line_with_other_comment_is_plain_text() {
        let entry = parse_entry("- note <!-- hidden -->");
        assert_eq!(entry, Entry::from_text("- note <!-- hidden -->"));
    }

    #[test]
    fn test_assemble() {
        let doc = format!("top\n{}{}\nbottom", START, END);
        let region = split_region(&doc, START, END).unwrap();

        let entries = vec![Entry::from_text("A"), Entry::from_text("B")];
        assert_eq!(
            assemble(&region, START, END, &entries, Separator::Newline, true),
            format!("top\n{}\nA\nB\n{}\nbottom", START, END)
        );
        assert_eq!(
            assemble(&region, START, END, &entries, Separator::BlankLine, true),
            format!("top\n{}\nA\n\nB\n{}\nbottom", START, END)
        );
        assert_eq!(
            assemble(&region, START, END, &[], Separator::Newline, true),
            format!("top\n{}\n{}\nbottom", START, END)
        );
    }
}
