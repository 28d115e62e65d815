//! Building the call graph from a directory of test sources

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;

use crate::parser::JavaParser;
use crate::syntax::SyntaxTree;

use super::extract::{invoked_methods, is_test_method};
use super::{CallGraph, GraphError};

/// `FooTest.java`, `testUtils.java`; never `NotATest.java`
pub fn is_test_source(file_name: &str) -> bool {
    file_name.ends_with(".java")
        && (file_name.contains("Test") || file_name.contains("test"))
        && !file_name.starts_with("NotA")
}

fn enumerate_test_files(dir: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(dir)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .build();

    let mut files: Vec<PathBuf> = walker
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| {
            entry
                .path()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_test_source)
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Test methods of one parsed file with the methods each invokes.
///
/// Test names are `package.ClassName.method`, where `ClassName` is
/// `class_name` (the file name) and the package comes from the tree.
pub fn tests_in_tree<S: AsRef<str>>(
    tree: &SyntaxTree,
    class_name: &str,
    markers: &[S],
) -> Vec<(String, BTreeSet<String>)> {
    let class = match tree.package() {
        Some(pkg) if !pkg.is_empty() => format!("{pkg}.{class_name}"),
        _ => class_name.to_string(),
    };

    tree.methods()
        .filter(|(_, m)| is_test_method(tree, m, markers))
        .map(|(_, m)| {
            let calls = invoked_methods(tree, &tree.body_statements(m.body));
            (format!("{class}.{}", m.name), calls)
        })
        .collect()
}

fn graph_for_file<S: AsRef<str> + Sync>(path: &Path, parser: &JavaParser, markers: &[S]) -> CallGraph {
    let mut graph = CallGraph::new();
    let tree = match parser.parse_file(path) {
        Ok(tree) => tree,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "Failed to parse test file, skipping");
            return graph;
        }
    };
    let class_name = crate::impact::file_stem(path);
    for (test, calls) in tests_in_tree(&tree, &class_name, markers) {
        graph.insert_test(&test, calls);
    }
    graph
}

/// Walk `dir` for test sources and build the call graph.
///
/// Files are parsed in parallel and their partial graphs merged in a reduce
/// step. Unparseable files are logged and skipped; only a missing directory
/// is an error.
pub fn build_from_dir<S: AsRef<str> + Sync>(
    dir: &Path,
    parser: &JavaParser,
    markers: &[S],
) -> Result<CallGraph, GraphError> {
    let _span = tracing::info_span!("build_call_graph", dir = %dir.display()).entered();

    if !dir.is_dir() {
        return Err(GraphError::MissingTestDir(dir.display().to_string()));
    }

    let files = enumerate_test_files(dir);
    tracing::debug!(files = files.len(), "Found test sources");

    let graph = files
        .par_iter()
        .map(|path| graph_for_file(path, parser, markers))
        .reduce(CallGraph::new, CallGraph::merge);

    tracing::info!(
        tests = graph.test_count(),
        methods = graph.method_count(),
        "Call graph built"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_source_names() {
        assert!(is_test_source("CalculatorTest.java"));
        assert!(is_test_source("testHelpers.java"));
        assert!(is_test_source("IntegrationTests.java"));
        assert!(!is_test_source("NotATest.java"));
        assert!(!is_test_source("Calculator.java"));
        assert!(!is_test_source("CalculatorTest.kt"));
        assert!(!is_test_source("CalculatorTEST.java"));
    }

    #[test]
    fn test_names_are_package_qualified() {
        let tree = JavaParser::new()
            .parse_source(
                "package com.acme;\nclass CalcTest {\n  @Test void adds() { Calculator.add(1, 2); }\n  void setup() {}\n}\n",
            )
            .unwrap();
        let tests = tests_in_tree(&tree, "CalcTest", &["Test"]);
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].0, "com.acme.CalcTest.adds");
        assert!(tests[0].1.contains("Calculator.add"));
    }

    #[test]
    fn test_default_package_has_no_prefix() {
        let tree = JavaParser::new()
            .parse_source("class PlainTest { void testIt() { run(); } }")
            .unwrap();
        let tests = tests_in_tree(&tree, "PlainTest", &["Test"]);
        assert_eq!(tests[0].0, "PlainTest.testIt");
    }

    #[test]
    fn test_missing_dir_is_error() {
        let err = build_from_dir(
            Path::new("/nonexistent/test/java"),
            &JavaParser::new(),
            &["Test"],
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::MissingTestDir(_)));
    }
}
