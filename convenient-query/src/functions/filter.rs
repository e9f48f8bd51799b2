//! Filtering functions: `kind`, `filter`, `attrfilter`, `attrregexfilter`
//!
//! All four evaluate their expression argument first and keep a subset of
//! it; they never introduce targets of their own. Attribute values are
//! traversed depth first, and collection sub-values are only containers to
//! recurse into, never leaf values to compare against.

use super::QueryFunction;
use crate::attr::{AttrValue, internal_attr_name};
use crate::environment::QueryEnvironment;
use crate::error::{QueryError, QueryResult};
use crate::evaluator::QueryEvaluator;
use crate::expr::{Argument, ArgumentType};
use crate::target::TargetSet;
use regex::Regex;

const FILTER_TYPES: [ArgumentType; 2] = [ArgumentType::Word, ArgumentType::Expression];
const ATTR_TYPES: [ArgumentType; 3] = [
    ArgumentType::Word,
    ArgumentType::Word,
    ArgumentType::Expression,
];

/// `kind(pattern, expr)` - targets whose rule kind matches the regex
pub struct KindFunction;

impl QueryFunction for KindFunction {
    fn name(&self) -> &'static str {
        "kind"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &FILTER_TYPES
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let pattern = compile_pattern(self.name(), args[0].word()?)?;
        let candidates = evaluator.eval(args[1].expression()?)?;

        let mut result = TargetSet::new();
        for target in candidates {
            evaluator.check_cancelled()?;
            if env
                .rule_kind(&target)
                .is_some_and(|kind| pattern.is_match(&kind))
            {
                let _ = result.insert(target);
            }
        }
        Ok(result)
    }
}

/// `filter(pattern, expr)` - targets whose label matches the regex
pub struct FilterFunction;

impl QueryFunction for FilterFunction {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &FILTER_TYPES
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        _env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let pattern = compile_pattern(self.name(), args[0].word()?)?;
        let candidates = evaluator.eval(args[1].expression()?)?;

        let mut result = TargetSet::new();
        for target in candidates {
            evaluator.check_cancelled()?;
            if pattern.is_match(target.label()) {
                let _ = result.insert(target);
            }
        }
        Ok(result)
    }
}

/// `attrfilter(name, value, expr)` - targets whose named attribute contains
/// `value` as a leaf, anywhere in its nesting.
///
/// The attribute name arrives in external (hyphen/underscore) form and is
/// converted to the internal camel-case key before lookup. An absent
/// attribute is "no match", not an error.
pub struct AttrFilterFunction;

impl QueryFunction for AttrFilterFunction {
    fn name(&self) -> &'static str {
        "attrfilter"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &ATTR_TYPES
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let attribute = internal_attr_name(args[0].word()?);
        let value = args[1].word()?.to_string();
        let candidates = evaluator.eval(args[2].expression()?)?;

        // Collections are containers to recurse into, not leaves to
        // string-compare, so the predicate rejects them outright.
        let predicate =
            move |v: &AttrValue| !v.is_container() && v.as_text().is_some_and(|t| t == value);

        let mut result = TargetSet::new();
        for target in candidates {
            evaluator.check_cancelled()?;
            let matches = env.filter_attribute_contents(&target, &attribute, &predicate);
            if !matches.is_empty() {
                let _ = result.insert(target);
            }
        }
        Ok(result)
    }
}

/// `attrregexfilter(name, pattern, expr)` - like `attrfilter`, with a regex
/// match over leaf textual representations
pub struct AttrRegexFilterFunction;

impl QueryFunction for AttrRegexFilterFunction {
    fn name(&self) -> &'static str {
        "attrregexfilter"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn argument_types(&self) -> &[ArgumentType] {
        &ATTR_TYPES
    }

    fn eval(
        &self,
        evaluator: &QueryEvaluator<'_>,
        env: &dyn QueryEnvironment,
        args: &[Argument],
    ) -> QueryResult<TargetSet> {
        let attribute = internal_attr_name(args[0].word()?);
        let pattern = compile_pattern(self.name(), args[1].word()?)?;
        let candidates = evaluator.eval(args[2].expression()?)?;

        let predicate = move |v: &AttrValue| {
            !v.is_container() && v.as_text().is_some_and(|t| pattern.is_match(&t))
        };

        let mut result = TargetSet::new();
        for target in candidates {
            evaluator.check_cancelled()?;
            let matches = env.filter_attribute_contents(&target, &attribute, &predicate);
            if !matches.is_empty() {
                let _ = result.insert(target);
            }
        }
        Ok(result)
    }
}

/// Compile a user-supplied regex, reporting failures against the calling
/// function before any environment access happens
fn compile_pattern(function: &str, pattern: &str) -> QueryResult<Regex> {
    Regex::new(pattern).map_err(|e| QueryError::Parse {
        message: format!("invalid regex '{pattern}' in {function}(): {e}"),
        offset: 0,
    })
}
