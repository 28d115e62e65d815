//! Does a method body touch a given field?

use crate::syntax::{NodeId, NodeKind, SyntaxTree};

/// True when `qualifier` is the field itself or starts with it
/// (`items`, `this.items`, `items.inner`)
fn qualifier_names_field(qualifier: &str, field: &str) -> bool {
    let qualifier = qualifier.strip_prefix("this.").unwrap_or(qualifier);
    qualifier.split('.').next() == Some(field)
}

/// Depth-first search of `nodes` for a read or write of `field`.
///
/// Matches a bare or qualified name reference (`field`, `this.field`,
/// `field.size`) and a call on the field (`field.add(x)`), anywhere inside
/// assignments, arguments, operands, branches, loops, try blocks and
/// unmodeled containers.
pub fn references_field(tree: &SyntaxTree, field: &str, nodes: &[NodeId]) -> bool {
    nodes.iter().any(|&id| node_references(tree, field, id))
}

fn node_references(tree: &SyntaxTree, field: &str, id: NodeId) -> bool {
    match tree.kind(id) {
        NodeKind::MemberReference { qualifier, member } => {
            member == field
                || qualifier
                    .as_deref()
                    .is_some_and(|q| q != "this" && qualifier_names_field(q, field))
        }
        NodeKind::MethodInvocation {
            qualifier,
            receiver,
            arguments,
            ..
        } => {
            qualifier
                .as_deref()
                .is_some_and(|q| qualifier_names_field(q, field))
                || receiver.is_some_and(|r| node_references(tree, field, r))
                || references_field(tree, field, arguments)
        }
        NodeKind::Assignment { target, value } => {
            node_references(tree, field, *target) || node_references(tree, field, *value)
        }
        NodeKind::BinaryOperation { left, right } => {
            node_references(tree, field, *left) || node_references(tree, field, *right)
        }
        NodeKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            node_references(tree, field, *condition)
                || node_references(tree, field, *then_branch)
                || else_branch.is_some_and(|e| node_references(tree, field, e))
        }
        NodeKind::Loop { header, body } => {
            references_field(tree, field, header) || node_references(tree, field, *body)
        }
        NodeKind::Try {
            resources,
            block,
            catches,
            finally,
        } => {
            references_field(tree, field, resources)
                || node_references(tree, field, *block)
                || references_field(tree, field, catches)
                || finally.is_some_and(|f| node_references(tree, field, f))
        }
        NodeKind::ObjectCreation {
            arguments, body, ..
        } => references_field(tree, field, arguments) || references_field(tree, field, body),
        NodeKind::Block { statements } => references_field(tree, field, statements),
        NodeKind::Unmodeled { children } => references_field(tree, field, children),
        // Declarations nested in a body (local classes) are not part of it
        NodeKind::CompilationUnit { .. }
        | NodeKind::Class(_)
        | NodeKind::Method(_)
        | NodeKind::Field(_)
        | NodeKind::Annotation { .. }
        | NodeKind::Initializer { .. } => false,
    }
}
