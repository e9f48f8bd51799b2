//! Query environment abstraction
//!
//! The engine never owns the target graph. Everything it knows about a
//! target (existence, edges, attributes, build-file ownership) arrives
//! through this trait, and the engine never mutates what it sees. Graph
//! construction and lazy loading happen beneath the implementation.

use crate::attr::AttrValue;
use crate::target::{QueryTarget, TargetSet};
use std::path::Path;
use thiserror::Error;

/// Errors surfaced by a query environment implementation
#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// Target string could not be interpreted by the provider
    #[error("malformed target '{0}'")]
    MalformedTarget(String),

    /// Target is not present in the graph
    #[error("unknown target '{0}'")]
    UnknownTarget(String),

    /// No build file corresponds to the given path
    #[error("no build file owns '{0}'")]
    MissingBuildFile(String),

    /// Any other provider-side failure, passed through verbatim
    #[error("{0}")]
    Provider(String),
}

/// Read-only view of the target graph consumed by the evaluator.
///
/// Implementations must be safe to share across sessions: all methods take
/// `&self` and the graph snapshot must not change underneath a running
/// session.
pub trait QueryEnvironment: Send + Sync {
    /// Whether the target exists in the graph snapshot
    fn exists(&self, target: &QueryTarget) -> bool;

    /// Resolve a target-pattern literal to the set of matching targets
    fn resolve_pattern(&self, pattern: &str) -> Result<TargetSet, EnvironmentError>;

    /// Direct (declared) dependencies of a target
    fn forward_deps(&self, target: &QueryTarget) -> Result<TargetSet, EnvironmentError>;

    /// Direct dependents of a target, restricted to `universe`
    fn reverse_deps(
        &self,
        target: &QueryTarget,
        universe: &TargetSet,
    ) -> Result<TargetSet, EnvironmentError>;

    /// The rule kind of a target (e.g. `cxx_library`), if it has one
    fn rule_kind(&self, target: &QueryTarget) -> Option<String>;

    /// The coerced value of a named attribute, keyed by the internal
    /// (camel-case) attribute name. `None` when the rule type does not
    /// declare the attribute.
    fn get_attribute(&self, target: &QueryTarget, attribute: &str) -> Option<AttrValue>;

    /// Every sub-value of the named attribute accepted by `predicate`.
    ///
    /// An absent attribute yields an empty bag, never an error: rule types
    /// vary and attribute-inspecting functions treat absence as "no match".
    fn filter_attribute_contents(
        &self,
        target: &QueryTarget,
        attribute: &str,
        predicate: &dyn Fn(&AttrValue) -> bool,
    ) -> Vec<AttrValue> {
        self.get_attribute(target, attribute)
            .map(|value| value.filter_contents(predicate))
            .unwrap_or_default()
    }

    /// Targets declared in the build file owning `path`
    fn targets_in_buildfile(&self, path: &Path) -> Result<TargetSet, EnvironmentError>;

    /// Tests declared for a target
    fn tests_of(&self, target: &QueryTarget) -> Result<TargetSet, EnvironmentError>;
}
