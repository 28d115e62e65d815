//! Joining changed methods against the call graph

use std::collections::BTreeSet;

use crate::call_graph::CallGraph;

/// Tests reaching one changed method
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MethodImpact {
    pub method: String,
    /// Sorted; empty when no test invokes the method
    pub tests: Vec<String>,
}

/// Look up every changed method in `graph`.
///
/// The result has one entry per distinct input, in input order. A method
/// the graph does not know about gets an empty test list.
pub fn resolve<S: AsRef<str>>(graph: &CallGraph, changed: &[S]) -> Vec<MethodImpact> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    changed
        .iter()
        .map(|m| m.as_ref())
        .filter(|m| seen.insert(*m))
        .map(|method| MethodImpact {
            method: method.to_string(),
            tests: graph.tests_for(method).into_iter().map(String::from).collect(),
        })
        .collect()
}

/// Distinct tests across all results, sorted
pub fn all_tests(impacts: &[MethodImpact]) -> Vec<String> {
    impacts
        .iter()
        .flat_map(|i| i.tests.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> CallGraph {
        let mut graph = CallGraph::new();
        graph.insert_test("p.CalcTest.testAdd", ["Calc.add"]);
        graph.insert_test("p.CalcTest.testBoth", ["Calc.add", "Calc.sub"]);
        graph
    }

    #[test]
    fn test_resolve_preserves_input_order() {
        let impacts = resolve(&graph(), &["Calc.sub", "Calc.add"]);
        assert_eq!(impacts[0].method, "Calc.sub");
        assert_eq!(impacts[0].tests, vec!["p.CalcTest.testBoth"]);
        assert_eq!(impacts[1].method, "Calc.add");
        assert_eq!(impacts[1].tests, vec!["p.CalcTest.testAdd", "p.CalcTest.testBoth"]);
    }

    #[test]
    fn test_unknown_method_yields_empty_list() {
        let impacts = resolve(&graph(), &["Nope.none"]);
        assert_eq!(
            impacts,
            vec![MethodImpact {
                method: "Nope.none".into(),
                tests: vec![],
            }]
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        let impacts = resolve(&graph(), &["Calc.add", "Calc.add"]);
        assert_eq!(impacts.len(), 1);
    }

    #[test]
    fn test_all_tests_dedups() {
        let impacts = resolve(&graph(), &["Calc.add", "Calc.sub"]);
        assert_eq!(all_tests(&impacts), vec!["p.CalcTest.testAdd", "p.CalcTest.testBoth"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve::<String>(&graph(), &[]).is_empty());
    }
}
