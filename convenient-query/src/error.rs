//! Query error taxonomy
//!
//! Evaluation is all-or-nothing per session: the first error aborts the
//! query and is surfaced with enough context (function name, argument
//! position, offending text) to render a diagnostic. The engine never logs
//! errors on its own.

use crate::environment::EnvironmentError;
use crate::expr::ArgumentType;
use thiserror::Error;

/// Result alias for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while parsing or evaluating a query
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed query text, reported before any environment access
    #[error("parse error at offset {offset}: {message}")]
    Parse {
        /// What was wrong with the text
        message: String,
        /// Byte offset of the offending token
        offset: usize,
    },

    /// Function name not present in the registry
    #[error("unknown query function '{0}'")]
    UnknownFunction(String),

    /// Function called with an argument count outside its declared bounds
    #[error("{function}() takes {expected} arguments, got {got}")]
    Arity {
        /// Function being called
        function: String,
        /// Human-readable arity bound (e.g. "1 to 2", "at least 2")
        expected: String,
        /// Number of arguments supplied
        got: usize,
    },

    /// Argument tag does not match the declared type at its position
    #[error("argument {position} of {function}() must be {expected}, got {got} '{text}'")]
    ArgumentType {
        /// Function being called
        function: String,
        /// Zero-based argument position
        position: usize,
        /// Declared type at that position
        expected: ArgumentType,
        /// Type actually supplied
        got: ArgumentType,
        /// Offending argument text
        text: String,
    },

    /// An accessor requested the wrong variant of an argument
    #[error("expected a {expected} argument, found {found}")]
    TypeMismatch {
        /// Variant requested by the caller
        expected: ArgumentType,
        /// Variant actually held
        found: ArgumentType,
    },

    /// Graph or attribute access failed underneath the environment
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// The session was aborted by caller request; not a bug
    #[error("query evaluation cancelled")]
    Cancelled,

    /// Query results could not be rendered in the requested output format
    #[error("failed to render query results: {0}")]
    Render(#[from] serde_json::Error),
}

impl QueryError {
    /// True for voluntary aborts, letting callers separate them from real
    /// failures
    pub fn is_cancelled(&self) -> bool {
        matches!(self, QueryError::Cancelled)
    }
}
