//! Merging fresh entries with the persisted ones.

use crate::models::Entry;
use std::collections::HashSet;

/// Merge `fresh` entries ahead of `persisted` ones.
///
/// The first occurrence wins. A later entry is a duplicate when it shares a
/// structural key or the exact display text with an earlier one. With a
/// `cap`, only the first `cap` entries are kept.
pub fn merge_entries(fresh: &[Entry], persisted: Vec<Entry>, cap: Option<usize>) -> Vec<Entry> {
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut seen_texts: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(fresh.len() + persisted.len());

    for entry in fresh.iter().cloned().chain(persisted) {
        let known_key = entry
            .key
            .as_ref()
            .is_some_and(|key| seen_keys.contains(key));
        if known_key || seen_texts.contains(&entry.text) {
            continue;
        }

        if let Some(ref key) = entry.key {
            seen_keys.insert(key.clone());
        }
        seen_texts.insert(entry.text.clone());
        merged.push(entry);
    }

    if let Some(cap) = cap {
        merged.truncate(cap);
    }

    merged
}
