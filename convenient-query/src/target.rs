//! Query targets and target sets
//!
//! A target is an opaque label identifying one buildable unit in the
//! dependency graph. All behavior lives behind the query environment; the
//! engine only compares, orders, and collects labels.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An opaque, globally unique target label (e.g. `//lib/codec:codec`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryTarget(String);

impl QueryTarget {
    /// Create a target from its label
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The target's label string
    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QueryTarget {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

impl From<String> for QueryTarget {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl From<&String> for QueryTarget {
    fn from(label: &String) -> Self {
        Self(label.clone())
    }
}

/// A deduplicated set of targets, the universal result type of evaluation.
///
/// Backed by a `BTreeSet` keyed on the label, so iteration order is the
/// label order and query output is deterministic without a separate sort
/// step. Set operations are pure: they build a new set and leave their
/// operands untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetSet(BTreeSet<QueryTarget>);

impl TargetSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Insert a target; returns false if it was already present
    pub fn insert(&mut self, target: QueryTarget) -> bool {
        self.0.insert(target)
    }

    /// Check membership
    pub fn contains(&self, target: &QueryTarget) -> bool {
        self.0.contains(target)
    }

    /// Number of targets in the set
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the set has no targets
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate targets in label order
    pub fn iter(&self) -> impl Iterator<Item = &QueryTarget> {
        self.0.iter()
    }

    /// All targets present in either set
    pub fn union(&self, other: &TargetSet) -> TargetSet {
        Self(self.0.union(&other.0).cloned().collect())
    }

    /// Targets present in both sets
    pub fn intersect(&self, other: &TargetSet) -> TargetSet {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    /// Targets in this set that are not in `other`
    pub fn except(&self, other: &TargetSet) -> TargetSet {
        Self(self.0.difference(&other.0).cloned().collect())
    }
}

impl Extend<QueryTarget> for TargetSet {
    fn extend<I: IntoIterator<Item = QueryTarget>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<QueryTarget> for TargetSet {
    fn from_iter<I: IntoIterator<Item = QueryTarget>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TargetSet {
    type Item = QueryTarget;
    type IntoIter = std::collections::btree_set::IntoIter<QueryTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = &'a QueryTarget;
    type IntoIter = std::collections::btree_set::Iter<'a, QueryTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for TargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for target in &self.0 {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{target}")?;
            first = false;
        }
        Ok(())
    }
}
