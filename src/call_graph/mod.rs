//! Test-to-method call graph
//!
//! Maps every test method under a test tree to the methods it invokes, and
//! keeps the inverse map alongside so changed methods can be looked up
//! directly. Names are textual (`qualifier.member`); no type resolution is
//! attempted.

mod build;
mod extract;
mod persist;

pub use build::{build_from_dir, is_test_source, tests_in_tree};
pub use extract::{invoked_methods, is_test_method, DEFAULT_TEST_ANNOTATIONS};

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Test directory not found: {0}")]
    MissingTestDir(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bidirectional test/method index.
///
/// `method_to_tests` is always exactly the inverse of `test_to_methods`:
/// both are only ever updated together through [`CallGraph::insert_test`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallGraph {
    test_to_methods: BTreeMap<String, BTreeSet<String>>,
    method_to_tests: BTreeMap<String, BTreeSet<String>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `test` invokes `methods`, adding to anything already
    /// recorded for it
    pub fn insert_test<I, S>(&mut self, test: &str, methods: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.test_to_methods.entry(test.to_string()).or_default();
        for method in methods {
            let method = method.into();
            self.method_to_tests
                .entry(method.clone())
                .or_default()
                .insert(test.to_string());
            entry.insert(method);
        }
    }

    /// Fold another graph into this one
    pub fn merge(mut self, other: CallGraph) -> CallGraph {
        for (test, methods) in other.test_to_methods {
            self.insert_test(&test, methods);
        }
        self
    }

    /// Methods invoked by `test`; empty for an unknown test
    pub fn coverage(&self, test: &str) -> Vec<&str> {
        self.test_to_methods
            .get(test)
            .map(|m| m.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Tests invoking `method`, sorted; empty for an unknown method
    pub fn tests_for(&self, method: &str) -> Vec<&str> {
        self.method_to_tests
            .get(method)
            .map(|t| t.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn test_to_methods(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.test_to_methods
    }

    pub fn method_to_tests(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.method_to_tests
    }

    pub fn test_count(&self) -> usize {
        self.test_to_methods.len()
    }

    pub fn method_count(&self) -> usize {
        self.method_to_tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.test_to_methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_inverse() {
        let mut graph = CallGraph::new();
        graph.insert_test("a.FooTest.testOne", ["Foo.run", "Foo.stop"]);
        graph.insert_test("a.FooTest.testTwo", ["Foo.run"]);

        assert_eq!(graph.tests_for("Foo.run"), vec!["a.FooTest.testOne", "a.FooTest.testTwo"]);
        assert_eq!(graph.tests_for("Foo.stop"), vec!["a.FooTest.testOne"]);
        assert_eq!(graph.coverage("a.FooTest.testOne"), vec!["Foo.run", "Foo.stop"]);
        assert_eq!(graph.test_count(), 2);
        assert_eq!(graph.method_count(), 2);
    }

    #[test]
    fn test_unknown_lookups_are_empty() {
        let graph = CallGraph::new();
        assert!(graph.coverage("nope").is_empty());
        assert!(graph.tests_for("nope").is_empty());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_test_without_calls_is_kept() {
        let mut graph = CallGraph::new();
        graph.insert_test("T.testNothing", Vec::<String>::new());
        assert_eq!(graph.test_count(), 1);
        assert_eq!(graph.method_count(), 0);
    }

    #[test]
    fn test_merge_unions_sets() {
        let mut left = CallGraph::new();
        left.insert_test("T.testA", ["x"]);
        let mut right = CallGraph::new();
        right.insert_test("T.testA", ["y"]);
        right.insert_test("T.testB", ["x"]);

        let merged = left.merge(right);
        assert_eq!(merged.coverage("T.testA"), vec!["x", "y"]);
        assert_eq!(merged.tests_for("x"), vec!["T.testA", "T.testB"]);
    }
}
