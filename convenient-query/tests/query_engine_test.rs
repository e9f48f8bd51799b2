//! Integration tests for the query engine over an in-memory environment

use convenient_query::{
    AttrValue, EnvironmentError, QueryEnvironment, QueryError, QuerySession, QueryTarget,
    TargetSet, evaluate,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_test::traced_test;

#[derive(Default)]
struct TargetInfo {
    kind: String,
    deps: Vec<String>,
    attrs: BTreeMap<String, AttrValue>,
    buildfile: String,
    tests: Vec<String>,
}

/// In-memory target graph with attribute-access counting
#[derive(Default)]
struct TestEnvironment {
    targets: BTreeMap<String, TargetInfo>,
    attribute_accesses: AtomicUsize,
}

impl TestEnvironment {
    fn add(&mut self, label: &str, kind: &str, deps: &[&str]) -> &mut TargetInfo {
        let info = TargetInfo {
            kind: kind.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            ..TargetInfo::default()
        };
        self.targets.entry(label.to_string()).or_insert(info);
        self.targets.get_mut(label).unwrap()
    }

    fn attribute_access_count(&self) -> usize {
        self.attribute_accesses.load(Ordering::Relaxed)
    }

    fn info(&self, target: &QueryTarget) -> Result<&TargetInfo, EnvironmentError> {
        self.targets
            .get(target.label())
            .ok_or_else(|| EnvironmentError::UnknownTarget(target.label().to_string()))
    }
}

impl QueryEnvironment for TestEnvironment {
    fn exists(&self, target: &QueryTarget) -> bool {
        self.targets.contains_key(target.label())
    }

    fn resolve_pattern(&self, pattern: &str) -> Result<TargetSet, EnvironmentError> {
        if pattern == "//..." {
            return Ok(self.targets.keys().map(QueryTarget::from).collect());
        }
        if let Some(package) = pattern.strip_suffix("/...") {
            return Ok(self
                .targets
                .keys()
                .filter(|label| {
                    label.starts_with(&format!("{package}:"))
                        || label.starts_with(&format!("{package}/"))
                })
                .map(QueryTarget::from)
                .collect());
        }
        if self.targets.contains_key(pattern) {
            let mut set = TargetSet::new();
            set.insert(QueryTarget::from(pattern));
            return Ok(set);
        }
        Err(EnvironmentError::UnknownTarget(pattern.to_string()))
    }

    fn forward_deps(&self, target: &QueryTarget) -> Result<TargetSet, EnvironmentError> {
        Ok(self.info(target)?.deps.iter().map(QueryTarget::from).collect())
    }

    fn reverse_deps(
        &self,
        target: &QueryTarget,
        universe: &TargetSet,
    ) -> Result<TargetSet, EnvironmentError> {
        Ok(universe
            .iter()
            .filter(|candidate| {
                self.targets
                    .get(candidate.label())
                    .is_some_and(|info| info.deps.iter().any(|d| d == target.label()))
            })
            .cloned()
            .collect())
    }

    fn rule_kind(&self, target: &QueryTarget) -> Option<String> {
        self.targets.get(target.label()).map(|info| info.kind.clone())
    }

    fn get_attribute(&self, target: &QueryTarget, attribute: &str) -> Option<AttrValue> {
        let _ = self.attribute_accesses.fetch_add(1, Ordering::Relaxed);
        self.targets
            .get(target.label())
            .and_then(|info| info.attrs.get(attribute).cloned())
    }

    fn targets_in_buildfile(&self, path: &Path) -> Result<TargetSet, EnvironmentError> {
        let path = path.to_string_lossy();
        let matching: TargetSet = self
            .targets
            .iter()
            .filter(|(_, info)| info.buildfile == path)
            .map(|(label, _)| QueryTarget::from(label.as_str()))
            .collect();
        if matching.is_empty() {
            return Err(EnvironmentError::MissingBuildFile(path.into_owned()));
        }
        Ok(matching)
    }

    fn tests_of(&self, target: &QueryTarget) -> Result<TargetSet, EnvironmentError> {
        Ok(self.info(target)?.tests.iter().map(QueryTarget::from).collect())
    }
}

/// Fixture:
///
/// ```text
/// //app:main ─┬─> //lib:codec ──> //third-party:zstd
///             └─> //lib:util
/// //app:main_test ──> //app:main
/// //cycle:x <──> //cycle:y          (disconnected cycle)
/// ```
fn build_env() -> TestEnvironment {
    let mut env = TestEnvironment::default();

    {
        let main = env.add("//app:main", "cxx_binary", &["//lib:codec", "//lib:util"]);
        main.buildfile = "app/BUCK".to_string();
        main.tests = vec!["//app:main_test".to_string()];
        main.attrs.insert(
            "visibility".to_string(),
            AttrValue::List(vec![AttrValue::from("PUBLIC")]),
        );
    }
    {
        let test = env.add("//app:main_test", "cxx_test", &["//app:main"]);
        test.buildfile = "app/BUCK".to_string();
    }
    {
        let codec = env.add("//lib:codec", "cxx_library", &["//third-party:zstd"]);
        codec.buildfile = "lib/BUCK".to_string();
        codec.attrs.insert(
            "compilerFlags".to_string(),
            AttrValue::List(vec![AttrValue::from("-O2"), AttrValue::from("-noassert")]),
        );
        codec.attrs.insert(
            "visibility".to_string(),
            AttrValue::List(vec![AttrValue::from("PUBLIC")]),
        );
    }
    {
        let util = env.add("//lib:util", "cxx_library", &[]);
        util.buildfile = "lib/BUCK".to_string();
        util.attrs
            .insert("compilerFlags".to_string(), AttrValue::List(vec![]));
    }
    {
        let zstd = env.add("//third-party:zstd", "prebuilt_cxx_library", &[]);
        zstd.buildfile = "third-party/BUCK".to_string();
    }

    env.add("//cycle:x", "cxx_library", &["//cycle:y"]);
    env.add("//cycle:y", "cxx_library", &["//cycle:x"]);

    env
}

fn labels(set: &TargetSet) -> Vec<&str> {
    set.iter().map(|t| t.label()).collect()
}

#[test]
#[traced_test]
fn test_deps_includes_starting_targets() {
    let env = build_env();
    let result = evaluate("deps(//app:main)", &env).unwrap();
    assert_eq!(
        labels(&result),
        vec![
            "//app:main",
            "//lib:codec",
            "//lib:util",
            "//third-party:zstd",
        ]
    );
}

#[test]
fn test_deps_of_leaf_is_itself() {
    let env = build_env();
    let result = evaluate("deps(//third-party:zstd)", &env).unwrap();
    assert_eq!(labels(&result), vec!["//third-party:zstd"]);
}

#[test]
fn test_deps_depth_limited() {
    let env = build_env();
    let result = evaluate("deps(//app:main, 1)", &env).unwrap();
    assert_eq!(
        labels(&result),
        vec!["//app:main", "//lib:codec", "//lib:util"]
    );
}

#[test]
fn test_deps_terminates_on_cycle() {
    let env = build_env();
    let result = evaluate("deps(//cycle:x)", &env).unwrap();
    assert_eq!(labels(&result), vec!["//cycle:x", "//cycle:y"]);
}

#[test]
fn test_rdeps_finds_transitive_dependents() {
    let env = build_env();
    let result = evaluate("rdeps(//..., //third-party:zstd)", &env).unwrap();
    assert_eq!(
        labels(&result),
        vec![
            "//app:main",
            "//app:main_test",
            "//lib:codec",
            "//third-party:zstd",
        ]
    );
}

#[test]
fn test_rdeps_depth_limited() {
    let env = build_env();
    let result = evaluate("rdeps(//..., //third-party:zstd, 1)", &env).unwrap();
    assert_eq!(labels(&result), vec!["//lib:codec", "//third-party:zstd"]);
}

#[test]
fn test_rdeps_restricted_universe() {
    let env = build_env();
    // The universe closure of //lib:codec does not contain //app:main
    let result = evaluate("rdeps(//lib:codec, //third-party:zstd)", &env).unwrap();
    assert_eq!(labels(&result), vec!["//lib:codec", "//third-party:zstd"]);
}

#[test]
fn test_rdeps_terminates_on_cycle() {
    let env = build_env();
    let result = evaluate("rdeps(//..., //cycle:y)", &env).unwrap();
    assert_eq!(labels(&result), vec!["//cycle:x", "//cycle:y"]);
}

#[test]
fn test_kind_filters_by_rule_kind() {
    let env = build_env();
    let result = evaluate("kind('^cxx_library$', deps(//app:main))", &env).unwrap();
    assert_eq!(labels(&result), vec!["//lib:codec", "//lib:util"]);

    let result = evaluate("kind('library', //...)", &env).unwrap();
    assert_eq!(result.len(), 5, "regex is unanchored");
}

#[test]
fn test_filter_matches_labels() {
    let env = build_env();
    let result = evaluate("filter('//lib:.*', //...)", &env).unwrap();
    assert_eq!(labels(&result), vec!["//lib:codec", "//lib:util"]);
}

#[test]
fn test_attrfilter_visibility_scenario() {
    let env = build_env();
    // deps() includes //app:main itself, and both it and //lib:codec are
    // declared PUBLIC
    let result = evaluate("attrfilter(visibility, PUBLIC, deps(//app:main))", &env).unwrap();
    assert_eq!(labels(&result), vec!["//app:main", "//lib:codec"]);
}

#[test]
fn test_attrfilter_is_monotone() {
    let env = build_env();
    let input = evaluate("deps(//app:main)", &env).unwrap();
    let filtered = evaluate("attrfilter(visibility, PUBLIC, deps(//app:main))", &env).unwrap();
    assert!(filtered.iter().all(|t| input.contains(t)));
}

#[test]
fn test_attrfilter_external_name_form() {
    let env = build_env();
    // compiler_flags is looked up under the internal key compilerFlags
    let result = evaluate(
        "attrfilter(compiler_flags, '-noassert', deps(//app:main))",
        &env,
    )
    .unwrap();
    assert_eq!(labels(&result), vec!["//lib:codec"]);
}

#[test]
fn test_attrfilter_empty_sequence_never_matches() {
    let env = build_env();
    let result = evaluate(
        "attrfilter('compiler_flags', '-noassert', set(//lib:util))",
        &env,
    )
    .unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_attrfilter_absent_attribute_is_no_match() {
    let env = build_env();
    let result = evaluate("attrfilter(visibility, PUBLIC, set(//lib:util))", &env).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_attrfilter_recurses_into_mappings() {
    let mut env = build_env();
    {
        let bundle = env.add("//gen:bundle", "genrule", &[]);
        let mut platforms = BTreeMap::new();
        platforms.insert(
            "linux".to_string(),
            AttrValue::List(vec![AttrValue::from("//lib:util")]),
        );
        platforms.insert(
            "macos".to_string(),
            AttrValue::List(vec![AttrValue::from("//lib:codec")]),
        );
        bundle
            .attrs
            .insert("platformDeps".to_string(), AttrValue::Map(platforms));
    }

    let result = evaluate(
        "attrfilter(platform_deps, //lib:util, set(//gen:bundle))",
        &env,
    )
    .unwrap();
    assert_eq!(labels(&result), vec!["//gen:bundle"]);
}

#[test]
fn test_attrregexfilter() {
    let env = build_env();
    let result = evaluate(
        "attrregexfilter(compiler_flags, '^-no.*', deps(//app:main))",
        &env,
    )
    .unwrap();
    assert_eq!(labels(&result), vec!["//lib:codec"]);
}

#[test]
fn test_set_algebra_laws() {
    let env = build_env();

    let ab = evaluate("deps(//app:main) + deps(//app:main_test)", &env).unwrap();
    let ba = evaluate("deps(//app:main_test) + deps(//app:main)", &env).unwrap();
    assert_eq!(ab, ba, "union commutes");

    let a = evaluate("deps(//app:main)", &env).unwrap();
    let b = evaluate("//lib/...", &env).unwrap();
    let i = evaluate("deps(//app:main) ^ //lib/...", &env).unwrap();
    assert!(i.iter().all(|t| a.contains(t) && b.contains(t)));

    let d = evaluate("deps(//app:main) - //lib/...", &env).unwrap();
    assert!(d.intersect(&b).is_empty());
    assert_eq!(a, i.union(&d), "intersect and except partition the input");
}

#[test]
fn test_infix_and_named_set_ops_agree() {
    let env = build_env();
    assert_eq!(
        evaluate("//app:main + //lib:util", &env).unwrap(),
        evaluate("union(//app:main, //lib:util)", &env).unwrap()
    );
}

#[test]
fn test_set_function() {
    let env = build_env();
    let result = evaluate("set(//app:main //lib:util)", &env).unwrap();
    assert_eq!(labels(&result), vec!["//app:main", "//lib:util"]);

    let result = evaluate("set()", &env).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_owner() {
    let env = build_env();
    let result = evaluate("owner(lib/BUCK)", &env).unwrap();
    assert_eq!(labels(&result), vec!["//lib:codec", "//lib:util"]);
}

#[test]
fn test_owner_missing_buildfile_is_environment_error() {
    let env = build_env();
    let err = evaluate("owner(nowhere/BUCK)", &env).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Environment(EnvironmentError::MissingBuildFile(_))
    ));
}

#[test]
fn test_testsof() {
    let env = build_env();
    let result = evaluate("testsof(deps(//app:main))", &env).unwrap();
    assert_eq!(labels(&result), vec!["//app:main_test"]);
}

#[test]
fn test_somepath_on_diamond() {
    let env = build_env();
    let result = evaluate("somepath(//app:main, //third-party:zstd)", &env).unwrap();
    // Exactly one chain exists: main -> codec -> zstd
    assert_eq!(
        labels(&result),
        vec!["//app:main", "//lib:codec", "//third-party:zstd"]
    );
}

#[test]
fn test_somepath_no_path_is_empty() {
    let env = build_env();
    let result = evaluate("somepath(//lib:util, //third-party:zstd)", &env).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_allpaths() {
    let env = build_env();
    let result = evaluate("allpaths(//app:main_test, //third-party:zstd)", &env).unwrap();
    assert_eq!(
        labels(&result),
        vec![
            "//app:main",
            "//app:main_test",
            "//lib:codec",
            "//third-party:zstd",
        ]
    );
    // //lib:util reaches no destination and is on no path
    assert!(!result.contains(&QueryTarget::from("//lib:util")));
}

#[test]
fn test_idempotent_evaluation() {
    let env = build_env();
    let query = "attrfilter(visibility, PUBLIC, deps(//app:main)) + testsof(//app:main)";
    let first = evaluate(query, &env).unwrap();
    let second = evaluate(query, &env).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_memoization_of_shared_subexpressions() {
    let query_once = "attrfilter(visibility, PUBLIC, deps(//app:main))";
    let query_twice = "attrfilter(visibility, PUBLIC, deps(//app:main)) \
                       + attrfilter(visibility, PUBLIC, deps(//app:main))";

    let env = build_env();
    let once = evaluate(query_once, &env).unwrap();
    let single_count = env.attribute_access_count();

    let env = build_env();
    let twice = evaluate(query_twice, &env).unwrap();
    let double_count = env.attribute_access_count();

    // The shared sub-expression is evaluated once per session: the union
    // yields the same set and no additional attribute accesses.
    assert_eq!(once, twice);
    assert_eq!(single_count, double_count);
}

#[test]
fn test_arity_error() {
    let env = build_env();
    let err = evaluate("attrfilter(x, y)", &env).unwrap_err();
    match err {
        QueryError::Arity {
            function,
            expected,
            got,
        } => {
            assert_eq!(function, "attrfilter");
            assert_eq!(expected, "exactly 3");
            assert_eq!(got, 2);
        }
        other => panic!("expected Arity error, got {other:?}"),
    }
}

#[test]
fn test_unknown_function_error() {
    let env = build_env();
    let err = evaluate("frobnicate(//:a)", &env).unwrap_err();
    assert!(matches!(err, QueryError::UnknownFunction(_)));
}

#[test]
fn test_unknown_target_is_environment_error() {
    let env = build_env();
    let err = evaluate("deps(//missing:target)", &env).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Environment(EnvironmentError::UnknownTarget(_))
    ));
}

#[test]
fn test_cancellation_is_distinct_outcome() {
    let env = build_env();
    let session = QuerySession::new(&env);
    session.cancellation_token().cancel();

    let err = session.evaluate("deps(//app:main)").unwrap_err();
    assert!(err.is_cancelled());
    assert!(matches!(err, QueryError::Cancelled));
}

#[test]
fn test_sessions_are_independent() {
    let env = build_env();

    let cancelled = QuerySession::new(&env);
    cancelled.cancellation_token().cancel();
    assert!(cancelled.evaluate("deps(//app:main)").is_err());

    // A fresh session against the same environment is unaffected
    let session = QuerySession::new(&env);
    assert!(session.evaluate("deps(//app:main)").is_ok());
}
