//! Directory classification.

use std::collections::HashSet;

/// How the walker treats a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Excluded together with its whole subtree.
    Skip,
    /// Merge root: every descendant index aggregates into this directory's index.
    Unclassified,
    /// Own index, aggregated into the immediate parent.
    Normal,
}

/// Name-based directory classification, fixed for the duration of a run.
///
/// Both name sets are matched case-insensitively. A name present in both sets
/// is skipped.
#[derive(Debug, Clone, Default)]
pub struct ClassificationPolicy {
    skip: HashSet<String>,
    unclassified: HashSet<String>,
}

impl ClassificationPolicy {
    /// Create a policy from skip and unclassified directory names.
    pub fn new<S, U>(skip: S, unclassified: U) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        Self {
            skip: skip.into_iter().map(|s| normalize(s.as_ref())).collect(),
            unclassified: unclassified
                .into_iter()
                .map(|s| normalize(s.as_ref()))
                .collect(),
        }
    }

    /// Classify a directory by its name.
    pub fn classify(&self, name: &str) -> Classification {
        let name = normalize(name);
        if self.skip.contains(&name) {
            Classification::Skip
        } else if self.unclassified.contains(&name) {
            Classification::Unclassified
        } else {
            Classification::Normal
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
