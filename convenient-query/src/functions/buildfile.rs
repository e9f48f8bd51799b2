//! Build-file and test-ownership functions: `owner`, `testsof`

use super::QueryFunction;
use crate::environment::QueryEnvironment;
use crate::error::QueryResult;
use crate::evaluator::QueryEvaluator;
use crate::expr::{Argument, ArgumentType};
use crate::target::TargetSet;
use std::path::Path;

const WORD_TYPES: [ArgumentType; 1] = [ArgumentType::Word];
const EXPR_TYPES: [ArgumentType; 1] = [ArgumentType::Expression];

/// `owner(path)` - the targets declared in the build file owning `path`.
///
/// The path may name the build file itself or a source file beneath it; the
/// environment maps it to its owning build file.
pub struct OwnerFunction;

impl QueryFunction for OwnerFunction {
    fn name(&self) -> &'static str {
        "owner"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &WORD_TYPES
    }

    fn eval(
        &self,
        _evaluator: &QueryEvaluator<'_>,
        env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let path = Path::new(args[0].word()?);
        Ok(env.targets_in_buildfile(path)?)
    }
}

/// `testsof(expr)` - the tests declared for each target in `expr`
pub struct TestsOfFunction;

impl QueryFunction for TestsOfFunction {
    fn name(&self) -> &'static str {
        "testsof"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &EXPR_TYPES
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let targets = evaluator.eval(args[0].expression()?)?;

        let mut result = TargetSet::new();
        for target in targets {
            evaluator.check_cancelled()?;
            result.extend(env.tests_of(&target)?);
        }
        Ok(result)
    }
}
