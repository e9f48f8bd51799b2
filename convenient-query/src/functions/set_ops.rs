//! Set algebra functions: `union`, `intersect`, `except`, `set`
//!
//! The infix operators `+`, `^`, and `-` desugar to the first three at
//! parse time. All are variadic left folds over pure `TargetSet`
//! operations; operand evaluation order is left to right.

use super::QueryFunction;
use crate::environment::QueryEnvironment;
use crate::error::QueryResult;
use crate::evaluator::QueryEvaluator;
use crate::expr::{Argument, ArgumentType};
use crate::target::TargetSet;

const EXPR_TYPES: [ArgumentType; 1] = [ArgumentType::Expression];
const WORD_TYPES: [ArgumentType; 1] = [ArgumentType::Word];

/// `union(a, b, ...)` / `a + b`
pub struct UnionFunction;

impl QueryFunction for UnionFunction {
    fn name(&self) -> &'static str {
        "union"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        None
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &EXPR_TYPES
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        _env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let mut result = TargetSet::new();
        for arg in args {
            result = result.union(&evaluator.eval(arg.expression()?)?);
        }
        Ok(result)
    }
}

/// `intersect(a, b, ...)` / `a ^ b`
pub struct IntersectFunction;

impl QueryFunction for IntersectFunction {
    fn name(&self) -> &'static str {
        "intersect"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        None
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &EXPR_TYPES
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        _env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let mut result = evaluator.eval(args[0].expression()?)?;
        for arg in &args[1..] {
            result = result.intersect(&evaluator.eval(arg.expression()?)?);
        }
        Ok(result)
    }
}

/// `except(a, b, ...)` / `a - b` - everything in `a` not in any later operand
pub struct ExceptFunction;

impl QueryFunction for ExceptFunction {
    fn name(&self) -> &'static str {
        "except"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        None
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &EXPR_TYPES
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        _env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let mut result = evaluator.eval(args[0].expression()?)?;
        for arg in &args[1..] {
            result = result.except(&evaluator.eval(arg.expression()?)?);
        }
        Ok(result)
    }
}

/// `set(w ...)` - the union of zero or more target patterns, resolved
/// through the environment
pub struct SetFunction;

impl QueryFunction for SetFunction {
    fn name(&self) -> &'static str {
        "set"
    }

    fn min_args(&self) -> usize {
        0
    }

    fn max_args(&self) -> Option<usize> {
        None
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &WORD_TYPES
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let mut result = TargetSet::new();
        for arg in args {
            evaluator.check_cancelled()?;
            result = result.union(&env.resolve_pattern(arg.word()?)?);
        }
        Ok(result)
    }
}
