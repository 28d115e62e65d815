//! Test method classification and invoked-method extraction

use std::collections::BTreeSet;

use crate::syntax::{MethodDecl, NodeId, NodeKind, SyntaxTree};

/// JUnit 4/5 markers recognized when no configuration overrides them
pub const DEFAULT_TEST_ANNOTATIONS: &[&str] = &[
    "Test",
    "ParameterizedTest",
    "RepeatedTest",
    "TestFactory",
    "TestTemplate",
];

/// A method is a test if it carries one of `markers` (compared on the last
/// segment, so `org.junit.Test` matches `Test`) or its name starts with
/// `test`.
pub fn is_test_method<S: AsRef<str>>(tree: &SyntaxTree, method: &MethodDecl, markers: &[S]) -> bool {
    let annotated = method.annotations.iter().any(|&ann| {
        tree.annotation_name(ann).is_some_and(|name| {
            let simple = name.rsplit('.').next().unwrap_or(name);
            markers.iter().any(|m| m.as_ref() == simple)
        })
    });
    annotated || method.name.starts_with("test")
}

/// Every method invoked from `nodes`: `qualifier.member` for qualified
/// calls, bare `member` otherwise, and `Type.Type` for `new Type(..)`
pub fn invoked_methods(tree: &SyntaxTree, nodes: &[NodeId]) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for &id in nodes {
        collect(tree, id, &mut found);
    }
    found
}

fn collect_all(tree: &SyntaxTree, ids: &[NodeId], found: &mut BTreeSet<String>) {
    for &id in ids {
        collect(tree, id, found);
    }
}

fn collect(tree: &SyntaxTree, id: NodeId, found: &mut BTreeSet<String>) {
    match tree.kind(id) {
        NodeKind::MethodInvocation {
            qualifier,
            member,
            receiver,
            arguments,
        } => {
            found.insert(match qualifier {
                Some(q) => format!("{q}.{member}"),
                None => member.clone(),
            });
            if let Some(r) = receiver {
                collect(tree, *r, found);
            }
            collect_all(tree, arguments, found);
        }
        NodeKind::ObjectCreation {
            type_name,
            arguments,
            body,
        } => {
            if !type_name.is_empty() {
                found.insert(format!("{type_name}.{type_name}"));
            }
            collect_all(tree, arguments, found);
            collect_all(tree, body, found);
        }
        NodeKind::Block { statements } => collect_all(tree, statements, found),
        NodeKind::Assignment { target, value } => {
            collect(tree, *target, found);
            collect(tree, *value, found);
        }
        NodeKind::BinaryOperation { left, right } => {
            collect(tree, *left, found);
            collect(tree, *right, found);
        }
        NodeKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            collect(tree, *condition, found);
            collect(tree, *then_branch, found);
            if let Some(e) = else_branch {
                collect(tree, *e, found);
            }
        }
        NodeKind::Loop { header, body } => {
            collect_all(tree, header, found);
            collect(tree, *body, found);
        }
        NodeKind::Try {
            resources,
            block,
            catches,
            finally,
        } => {
            collect_all(tree, resources, found);
            collect(tree, *block, found);
            collect_all(tree, catches, found);
            if let Some(f) = finally {
                collect(tree, *f, found);
            }
        }
        NodeKind::Unmodeled { children } => collect_all(tree, children, found),
        NodeKind::MemberReference { .. }
        | NodeKind::CompilationUnit { .. }
        | NodeKind::Class(_)
        | NodeKind::Method(_)
        | NodeKind::Field(_)
        | NodeKind::Annotation { .. }
        | NodeKind::Initializer { .. } => {}
    }
}
