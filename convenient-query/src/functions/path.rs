//! Dependency path functions: `somepath` and `allpaths`
//!
//! `somepath(from, to)` returns the nodes on one forward dependency path
//! from any `from` target to any `to` target, or the empty set when no
//! path exists. `allpaths(from, to)` returns the union of nodes lying on
//! any such path.

use super::QueryFunction;
use super::traversal::forward_closure;
use crate::environment::QueryEnvironment;
use crate::error::QueryResult;
use crate::evaluator::QueryEvaluator;
use crate::expr::{Argument, ArgumentType};
use crate::target::{QueryTarget, TargetSet};
use std::collections::{HashMap, VecDeque};

const PATH_TYPES: [ArgumentType; 2] = [ArgumentType::Expression, ArgumentType::Expression];

/// `somepath(from, to)` - one dependency path, as a set of nodes
pub struct SomePathFunction;

impl QueryFunction for SomePathFunction {
    fn name(&self) -> &'static str {
        "somepath"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &PATH_TYPES
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let from = evaluator.eval(args[0].expression()?)?;
        let to = evaluator.eval(args[1].expression()?)?;

        // BFS from each source; the parent map reconstructs the path once
        // any destination is reached.
        for start in &from {
            let mut queue = VecDeque::new();
            let mut visited = TargetSet::new();
            let mut parent: HashMap<QueryTarget, QueryTarget> = HashMap::new();

            queue.push_back(start.clone());
            let _ = visited.insert(start.clone());

            while let Some(current) = queue.pop_front() {
                evaluator.check_cancelled()?;

                if to.contains(&current) {
                    let mut path = TargetSet::new();
                    let mut node = current;
                    loop {
                        let _ = path.insert(node.clone());
                        match parent.get(&node) {
                            Some(p) => node = p.clone(),
                            None => break,
                        }
                    }
                    return Ok(path);
                }

                for dep in env.forward_deps(&current)? {
                    if visited.insert(dep.clone()) {
                        let _ = parent.insert(dep.clone(), current.clone());
                        queue.push_back(dep);
                    }
                }
            }
        }

        Ok(TargetSet::new())
    }
}

/// `allpaths(from, to)` - union of nodes on every dependency path.
///
/// A node lies on a path iff it is reachable from a source and a
/// destination is reachable from it, so the result is the reverse closure
/// of the destinations computed within the forward closure of the sources.
pub struct AllPathsFunction;

impl QueryFunction for AllPathsFunction {
    fn name(&self) -> &'static str {
        "allpaths"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &PATH_TYPES
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let from = evaluator.eval(args[0].expression()?)?;
        let to = evaluator.eval(args[1].expression()?)?;

        let downstream = forward_closure(evaluator, env, &from, None)?;

        let mut result: TargetSet = to.intersect(&downstream);
        let mut queue: VecDeque<QueryTarget> = result.iter().cloned().collect();

        while let Some(target) = queue.pop_front() {
            evaluator.check_cancelled()?;
            for dependent in env.reverse_deps(&target, &downstream)? {
                if result.insert(dependent.clone()) {
                    queue.push_back(dependent);
                }
            }
        }

        Ok(result)
    }
}
