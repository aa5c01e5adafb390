//! Duplicate-column removal
//!
//! After a join or a flatten two columns may end up with the same name.
//! The first occurrence wins; later duplicates are dropped.

use std::collections::HashSet;

/// Removes repeated column names, keeping the first occurrence
pub fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(names.len());
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
