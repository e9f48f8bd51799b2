//! Query evaluator and sessions
//!
//! A session is one evaluation of a top-level query against one
//! environment snapshot. Within a session, sub-expression results are
//! memoized by syntactic identity so a shared sub-expression is computed
//! once; the memo table is discarded with the session. Sessions are
//! independent: several may run concurrently against the same environment.

use crate::environment::QueryEnvironment;
use crate::error::{QueryError, QueryResult};
use crate::expr::QueryExpr;
use crate::functions::{self, FunctionRegistry, default_registry};
use crate::parser::QueryParser;
use crate::target::TargetSet;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Shared cancellation flag for one session.
///
/// Clones observe the same flag, so a caller can keep one clone and cancel
/// a session running on another thread. Checked between function
/// invocations and inside traversal loops; a cancelled session aborts with
/// `QueryError::Cancelled` instead of a normal result.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; observed by every clone
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Walks a query AST, dispatching function applications through the
/// registry and resolving target-pattern literals through the environment
pub struct QueryEvaluator<'a> {
    env: &'a dyn QueryEnvironment,
    registry: &'a FunctionRegistry,
    cancel: CancellationToken,
    memo: Mutex<HashMap<QueryExpr, TargetSet>>,
}

impl<'a> QueryEvaluator<'a> {
    /// Create an evaluator with a fresh memoization scope
    pub fn new(env: &'a dyn QueryEnvironment, registry: &'a FunctionRegistry) -> Self {
        Self::with_cancellation(env, registry, CancellationToken::new())
    }

    /// Create an evaluator observing an existing cancellation token
    pub fn with_cancellation(
        env: &'a dyn QueryEnvironment,
        registry: &'a FunctionRegistry,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            env,
            registry,
            cancel,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// The environment this evaluator reads from
    pub fn environment(&self) -> &dyn QueryEnvironment {
        self.env
    }

    /// Fail with `Cancelled` if the session has been aborted. Functions
    /// call this at each iteration of traversal-heavy loops.
    pub fn check_cancelled(&self) -> QueryResult<()> {
        if self.cancel.is_cancelled() {
            Err(QueryError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Evaluate an expression to a target set.
    ///
    /// Function implementations recurse through this entry point for their
    /// expression-typed arguments, so every sub-expression passes through
    /// the memo table and the cancellation check.
    pub fn eval(&self, expr: &QueryExpr) -> QueryResult<TargetSet> {
        self.check_cancelled()?;

        if let Some(hit) = self.memo_get(expr) {
            return Ok(hit);
        }

        let result = match expr {
            QueryExpr::TargetPattern(pattern) => self.env.resolve_pattern(pattern)?,
            QueryExpr::Function { name, args } => {
                let function = self
                    .registry
                    .get(name.as_str())
                    .ok_or_else(|| QueryError::UnknownFunction(name.clone()))?;
                functions::validate_arguments(function, args)?;
                function.eval(self, self.env, args)?
            }
        };

        self.memo_insert(expr.clone(), result.clone());
        Ok(result)
    }

    fn memo_get(&self, expr: &QueryExpr) -> Option<TargetSet> {
        let memo = self.memo.lock().unwrap_or_else(|e| e.into_inner());
        memo.get(expr).cloned()
    }

    fn memo_insert(&self, expr: QueryExpr, result: TargetSet) {
        let mut memo = self.memo.lock().unwrap_or_else(|e| e.into_inner());
        let _ = memo.insert(expr, result);
    }
}

/// Entry point tying parsing and evaluation together for one environment
/// snapshot. Each `evaluate` call is its own session with a fresh
/// memoization scope; the cancellation token spans the session's lifetime.
pub struct QuerySession<'a> {
    env: &'a dyn QueryEnvironment,
    registry: &'a FunctionRegistry,
    cancel: CancellationToken,
}

impl<'a> QuerySession<'a> {
    /// A session over the built-in function registry
    pub fn new(env: &'a dyn QueryEnvironment) -> Self {
        Self::with_registry(env, default_registry())
    }

    /// A session over a caller-composed registry
    pub fn with_registry(env: &'a dyn QueryEnvironment, registry: &'a FunctionRegistry) -> Self {
        Self {
            env,
            registry,
            cancel: CancellationToken::new(),
        }
    }

    /// A clone of the session's cancellation token, for aborting from
    /// another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Parse and evaluate a query
    pub fn evaluate(&self, query: &str) -> QueryResult<TargetSet> {
        let expr = QueryParser::parse(query, self.registry)?;
        self.evaluate_expr(&expr)
    }

    /// Evaluate an already-parsed expression
    pub fn evaluate_expr(&self, expr: &QueryExpr) -> QueryResult<TargetSet> {
        debug!(query = %expr, "evaluating query");
        let evaluator =
            QueryEvaluator::with_cancellation(self.env, self.registry, self.cancel.clone());
        let result = evaluator.eval(expr)?;
        debug!(query = %expr, targets = result.len(), "query complete");
        Ok(result)
    }
}

/// Evaluate a query against an environment using the built-in functions.
///
/// Convenience wrapper over [`QuerySession`] for callers that need neither
/// cancellation nor a custom registry.
pub fn evaluate(query: &str, env: &dyn QueryEnvironment) -> QueryResult<TargetSet> {
    QuerySession::new(env).evaluate(query)
}
