//! Query function registry and built-in functions
//!
//! Every operation in query text is a named function with declared arity
//! and argument types. The registry maps names to implementations and is
//! built once at startup; the evaluator dispatches through it and never
//! special-cases a function name, so new functions can be registered
//! without touching the evaluator.
//!
//! Built-ins:
//!
//! - `deps(expr[, depth])` - transitive dependencies, including the
//!   starting targets
//! - `rdeps(universe, expr[, depth])` - reverse dependencies within the
//!   transitive closure of `universe`
//! - `kind(pattern, expr)` - filter by rule kind (regex)
//! - `filter(pattern, expr)` - filter by target label (regex)
//! - `attrfilter(name, value, expr)` - keep targets whose attribute
//!   contains the value as a leaf
//! - `attrregexfilter(name, pattern, expr)` - regex variant of attrfilter
//! - `owner(path)` - targets of the build file owning a path
//! - `testsof(expr)` - tests declared for the given targets
//! - `union(a, b, ...)`, `intersect(a, b, ...)`, `except(a, b, ...)` -
//!   set algebra, also reachable as infix `+`, `^`, `-`
//! - `set(w ...)` - explicit target list
//! - `somepath(from, to)`, `allpaths(from, to)` - dependency paths

pub mod buildfile;
pub mod filter;
pub mod path;
pub mod set_ops;
pub mod traversal;

use crate::environment::QueryEnvironment;
use crate::error::{QueryError, QueryResult};
use crate::evaluator::QueryEvaluator;
use crate::expr::{Argument, ArgumentType};
use crate::target::TargetSet;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// A named, arity- and type-checked query operation.
///
/// Implementations must be pure functions of their arguments and the
/// environment's current graph snapshot; they hold no mutable state across
/// calls. Expression-typed arguments are evaluated on demand through the
/// passed evaluator, which memoizes per session.
pub trait QueryFunction: Send + Sync {
    /// Unique, case-sensitive name used in query text
    fn name(&self) -> &'static str;

    /// Minimum number of arguments
    fn min_args(&self) -> usize;

    /// Maximum number of arguments; `None` means unbounded
    fn max_args(&self) -> Option<usize>;

    /// Declared type per positional slot; the final slot's type repeats for
    /// variadic functions
    fn argument_types(&self) -> &[ArgumentType];

    /// Evaluate the function against the environment snapshot
    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet>;
}

/// Immutable name-to-function mapping, built once at startup
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<&'static str, Arc<dyn QueryFunction>>,
}

impl FunctionRegistry {
    /// An empty registry, for embedders composing their own function set
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding every built-in function
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(traversal::DepsFunction));
        registry.register(Arc::new(traversal::RdepsFunction));
        registry.register(Arc::new(filter::KindFunction));
        registry.register(Arc::new(filter::FilterFunction));
        registry.register(Arc::new(filter::AttrFilterFunction));
        registry.register(Arc::new(filter::AttrRegexFilterFunction));
        registry.register(Arc::new(buildfile::OwnerFunction));
        registry.register(Arc::new(buildfile::TestsOfFunction));
        registry.register(Arc::new(set_ops::UnionFunction));
        registry.register(Arc::new(set_ops::IntersectFunction));
        registry.register(Arc::new(set_ops::ExceptFunction));
        registry.register(Arc::new(set_ops::SetFunction));
        registry.register(Arc::new(path::SomePathFunction));
        registry.register(Arc::new(path::AllPathsFunction));
        registry
    }

    /// Register a function under its declared name. Names must be unique;
    /// a duplicate registration replaces the earlier one.
    pub fn register(&mut self, function: Arc<dyn QueryFunction>) {
        let _ = self.functions.insert(function.name(), function);
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&dyn QueryFunction> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    /// Registered function names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }
}

/// The process-wide registry of built-in functions, initialized on first
/// use and read-only thereafter
pub fn default_registry() -> &'static FunctionRegistry {
    static DEFAULT: OnceLock<FunctionRegistry> = OnceLock::new();
    DEFAULT.get_or_init(FunctionRegistry::with_builtins)
}

/// Check an argument list against a function's declared arity and types.
///
/// Runs before the function body, so a malformed call is rejected without
/// any environment access.
pub fn validate_arguments(function: &dyn QueryFunction, args: &[Argument]) -> QueryResult<()> {
    let min = function.min_args();
    let max = function.max_args();

    let in_range = args.len() >= min && max.is_none_or(|max| args.len() <= max);
    if !in_range {
        return Err(QueryError::Arity {
            function: function.name().to_string(),
            expected: arity_bounds(min, max),
            got: args.len(),
        });
    }

    let types = function.argument_types();
    for (position, arg) in args.iter().enumerate() {
        // The final declared type repeats for variadic functions
        let Some(expected) = types.get(position.min(types.len().saturating_sub(1))) else {
            continue;
        };
        if arg.kind() != *expected {
            return Err(QueryError::ArgumentType {
                function: function.name().to_string(),
                position,
                expected: *expected,
                got: arg.kind(),
                text: arg.to_string(),
            });
        }
    }

    Ok(())
}

fn arity_bounds(min: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == min => format!("exactly {min}"),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    }
}
