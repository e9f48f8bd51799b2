//! Query expression AST and typed arguments
//!
//! A parsed query is a tree of function applications over target-pattern
//! literals. Expressions are built once from the query text, are immutable,
//! and implement `Eq + Hash` so a sub-expression serves as its own
//! memoization key during evaluation.

use crate::error::{QueryError, QueryResult};
use std::fmt;

/// Declared type of a positional function argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentType {
    /// Bare or quoted word (target pattern, attribute name, regex, ...)
    Word,
    /// Unsigned integer literal (e.g. a traversal depth)
    Integer,
    /// Nested query expression
    Expression,
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentType::Word => write!(f, "word"),
            ArgumentType::Integer => write!(f, "integer"),
            ArgumentType::Expression => write!(f, "expression"),
        }
    }
}

/// A positional argument carried into a function call.
///
/// The tag is fixed at parse time from the function's declared signature;
/// there is no coercion between word and integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Argument {
    /// Word literal, quotes already stripped
    Word(String),
    /// Integer literal
    Integer(u64),
    /// Nested sub-expression, evaluated on demand by the function
    Expression(QueryExpr),
}

impl Argument {
    /// The tag this argument carries
    pub fn kind(&self) -> ArgumentType {
        match self {
            Argument::Word(_) => ArgumentType::Word,
            Argument::Integer(_) => ArgumentType::Integer,
            Argument::Expression(_) => ArgumentType::Expression,
        }
    }

    /// The word value, or `TypeMismatch` if this is not a word
    pub fn word(&self) -> QueryResult<&str> {
        match self {
            Argument::Word(w) => Ok(w),
            other => Err(QueryError::TypeMismatch {
                expected: ArgumentType::Word,
                found: other.kind(),
            }),
        }
    }

    /// The integer value, or `TypeMismatch` if this is not an integer
    pub fn integer(&self) -> QueryResult<u64> {
        match self {
            Argument::Integer(i) => Ok(*i),
            other => Err(QueryError::TypeMismatch {
                expected: ArgumentType::Integer,
                found: other.kind(),
            }),
        }
    }

    /// The sub-expression, or `TypeMismatch` if this is not an expression
    pub fn expression(&self) -> QueryResult<&QueryExpr> {
        match self {
            Argument::Expression(e) => Ok(e),
            other => Err(QueryError::TypeMismatch {
                expected: ArgumentType::Expression,
                found: other.kind(),
            }),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Word(w) => write!(f, "{w}"),
            Argument::Integer(i) => write!(f, "{i}"),
            Argument::Expression(e) => write!(f, "{e}"),
        }
    }
}

/// A query expression (AST node): a function application or a
/// target-pattern literal. Infix set operators desugar to function
/// applications at parse time, so the evaluator sees a single node shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryExpr {
    /// `name(arg, ...)`
    Function {
        /// Registered function name, case sensitive
        name: String,
        /// Ordered argument list
        args: Vec<Argument>,
    },
    /// Target pattern resolved through the environment (e.g. `//lib:zstd`,
    /// `//lib/...`)
    TargetPattern(String),
}

impl QueryExpr {
    /// Build a function application node
    pub fn function(name: impl Into<String>, args: Vec<Argument>) -> Self {
        QueryExpr::Function {
            name: name.into(),
            args,
        }
    }

    /// Build a target-pattern literal node
    pub fn pattern(pattern: impl Into<String>) -> Self {
        QueryExpr::TargetPattern(pattern.into())
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryExpr::TargetPattern(pattern) => write!(f, "{pattern}"),
            QueryExpr::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_accessors() {
        let word = Argument::Word("visibility".to_string());
        assert_eq!(word.word().unwrap(), "visibility");
        assert!(matches!(
            word.integer(),
            Err(QueryError::TypeMismatch {
                expected: ArgumentType::Integer,
                found: ArgumentType::Word,
            })
        ));

        let depth = Argument::Integer(3);
        assert_eq!(depth.integer().unwrap(), 3);
        assert!(depth.expression().is_err());
    }

    #[test]
    fn test_display_round_trip_shape() {
        let expr = QueryExpr::function(
            "attrfilter",
            vec![
                Argument::Word("visibility".to_string()),
                Argument::Word("PUBLIC".to_string()),
                Argument::Expression(QueryExpr::function(
                    "deps",
                    vec![
                        Argument::Expression(QueryExpr::pattern("//:a")),
                        Argument::Integer(2),
                    ],
                )),
            ],
        );
        assert_eq!(
            expr.to_string(),
            "attrfilter(visibility, PUBLIC, deps(//:a, 2))"
        );
    }

    #[test]
    fn test_identical_subexpressions_are_equal() {
        let a = QueryExpr::function(
            "deps",
            vec![Argument::Expression(QueryExpr::pattern("//:a"))],
        );
        let b = QueryExpr::function(
            "deps",
            vec![Argument::Expression(QueryExpr::pattern("//:a"))],
        );
        assert_eq!(a, b);
    }
}
