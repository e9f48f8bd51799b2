//! Target graph query engine for build dependency graphs
//!
//! Inspired by Bazel's query command, this crate provides a composable
//! query language for selecting sets of build targets from a dependency
//! graph. The graph itself stays behind the [`QueryEnvironment`] trait;
//! the engine owns only the language, its evaluation, and the set algebra
//! over results.
//!
//! # Query Functions
//!
//! - `deps(expr[, depth])` - transitive dependencies of targets
//! - `rdeps(universe, expr[, depth])` - reverse dependencies within a universe
//! - `kind(pattern, expr)` - filter by rule kind
//! - `filter(pattern, expr)` - filter by target label
//! - `attrfilter(name, value, expr)` - filter by attribute leaf value
//! - `attrregexfilter(name, pattern, expr)` - regex filter on attribute leaves
//! - `owner(path)` - targets of the build file owning a path
//! - `testsof(expr)` - tests of targets
//! - `somepath(from, to)` / `allpaths(from, to)` - dependency paths
//! - `set(w ...)`, `union`/`+`, `intersect`/`^`, `except`/`-` - set algebra
//!
//! # Example
//!
//! ```rust,ignore
//! use convenient_query::{QuerySession, evaluate};
//!
//! // One-shot evaluation with the built-in functions
//! let results = evaluate("attrfilter(visibility, PUBLIC, deps(//app:main))", &env)?;
//!
//! // Session with cancellation from another thread
//! let session = QuerySession::new(&env);
//! let token = session.cancellation_token();
//! let results = session.evaluate("rdeps(//..., //lib:zstd)")?;
//! ```

pub mod attr;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod functions;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod target;

pub use attr::{AttrValue, internal_attr_name};
pub use environment::{EnvironmentError, QueryEnvironment};
pub use error::{QueryError, QueryResult};
pub use evaluator::{CancellationToken, QueryEvaluator, QuerySession, evaluate};
pub use expr::{Argument, ArgumentType, QueryExpr};
pub use functions::{FunctionRegistry, QueryFunction, default_registry};
pub use output::{OutputFormat, QueryMetadata, QueryResultSet, format_results};
pub use parser::QueryParser;
pub use target::{QueryTarget, TargetSet};
