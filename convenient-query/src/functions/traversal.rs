//! Graph traversal functions: `deps` and `rdeps`
//!
//! The target graph is a general directed graph and may contain cycles, so
//! both traversals are breadth-first with a visited set; termination never
//! relies on recursion depth. The starting targets are part of the result
//! (self-inclusion), matching the convention that a target trivially
//! depends on itself.

use super::QueryFunction;
use crate::environment::QueryEnvironment;
use crate::error::QueryResult;
use crate::evaluator::QueryEvaluator;
use crate::expr::{Argument, ArgumentType};
use crate::target::TargetSet;
use std::collections::VecDeque;
use tracing::trace;

/// `deps(expr[, depth])` - forward transitive closure
pub struct DepsFunction;

impl QueryFunction for DepsFunction {
    fn name(&self) -> &'static str {
        "deps"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &[ArgumentType::Expression, ArgumentType::Integer]
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let seeds = evaluator.eval(args[0].expression()?)?;
        let max_depth = match args.get(1) {
            Some(arg) => Some(arg.integer()? as usize),
            None => None,
        };
        forward_closure(evaluator, env, &seeds, max_depth)
    }
}

/// `rdeps(universe, expr[, depth])` - reverse transitive closure within the
/// forward closure of `universe`
pub struct RdepsFunction;

impl QueryFunction for RdepsFunction {
    fn name(&self) -> &'static str {
        "rdeps"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &[
            ArgumentType::Expression,
            ArgumentType::Expression,
            ArgumentType::Integer,
        ]
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let universe_seeds = evaluator.eval(args[0].expression()?)?;
        let seeds = evaluator.eval(args[1].expression()?)?;
        let max_depth = match args.get(2) {
            Some(arg) => Some(arg.integer()? as usize),
            None => None,
        };

        // The universe is the forward closure of its seeds; dependents
        // outside it are invisible to this query.
        let universe = forward_closure(evaluator, env, &universe_seeds, None)?;

        let mut result: TargetSet = seeds
            .iter()
            .filter(|t| universe.contains(t))
            .cloned()
            .collect();
        let mut queue: VecDeque<_> = result.iter().cloned().map(|t| (t, 0usize)).collect();

        while let Some((target, depth)) = queue.pop_front() {
            evaluator.check_cancelled()?;
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            for dependent in env.reverse_deps(&target, &universe)? {
                if result.insert(dependent.clone()) {
                    trace!(node = %dependent, depth = depth + 1, "rdeps visit");
                    queue.push_back((dependent, depth + 1));
                }
            }
        }

        Ok(result)
    }
}

/// Breadth-first forward closure over `forward_deps`, seeds included.
/// Visited tracking makes this terminate on cyclic graphs.
pub(crate) fn forward_closure(
    evaluator: &QueryEvaluator<'_>,
    env: &dyn QueryEnvironment,
    seeds: &TargetSet,
    max_depth: Option<usize>,
) -> QueryResult<TargetSet> {
    let mut result = seeds.clone();
    let mut queue: VecDeque<_> = seeds.iter().cloned().map(|t| (t, 0usize)).collect();

    while let Some((target, depth)) = queue.pop_front() {
        evaluator.check_cancelled()?;
        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        for dep in env.forward_deps(&target)? {
            if result.insert(dep.clone()) {
                trace!(node = %dep, depth = depth + 1, "deps visit");
                queue.push_back((dep, depth + 1));
            }
        }
    }

    Ok(result)
}
