//! Lowering from the tree-sitter-java concrete tree into the syntax arena

use tree_sitter::Node;

use crate::syntax::{ClassDecl, FieldDecl, MethodDecl, NodeId, NodeKind, Span, SyntaxTree, TypeKind};

/// Expression nesting beyond this depth is dropped instead of recursed into
const MAX_DEPTH: usize = 400;

/// Children stored under these field names declare names or types; they are
/// never value references.
const SKIPPED_FIELDS: &[&str] = &[
    "name",
    "type",
    "dimensions",
    "type_parameters",
    "type_arguments",
    "parameters",
];

/// Node kinds whose subtrees carry no calls or value references
const SKIPPED_KINDS: &[&str] = &[
    "modifiers",
    "formal_parameters",
    "marker_annotation",
    "annotation",
    "catch_formal_parameter",
    "label",
    "break_statement",
    "continue_statement",
    "line_comment",
    "block_comment",
    "this",
    "super",
];

fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration"
    )
}

fn line_of(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

fn span_of(node: Node) -> Option<Span> {
    Some(Span::new(line_of(node), node.end_position().row as u32 + 1))
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Named children paired with the grammar field they sit in
fn fielded_children<'t>(node: Node<'t>) -> Vec<(Option<&'static str>, Node<'t>)> {
    let mut cursor = node.walk();
    let mut out = Vec::new();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() {
                out.push((cursor.field_name(), child));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

/// Line of the first `ERROR` or `MISSING` node under `node`
pub(super) fn first_error_line(node: Node) -> Option<u32> {
    if node.is_error() || node.is_missing() {
        return Some(line_of(node));
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error() || c.is_missing())
        .find_map(first_error_line)
}

/// `Foo<T>` -> `Foo`, `java.util.List` -> `List`
fn simple_type_name(text: &str) -> String {
    let base = text.split('<').next().unwrap_or(text).trim();
    base.rsplit('.').next().unwrap_or(base).to_string()
}

/// A receiver that can be written as a dotted qualifier
fn is_plain_name(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.')
}

pub(super) struct Lowerer<'s> {
    source: &'s str,
    tree: SyntaxTree,
    depth: usize,
}

impl<'s> Lowerer<'s> {
    pub(super) fn new(source: &'s str) -> Self {
        Self {
            source,
            tree: SyntaxTree::new(),
            depth: 0,
        }
    }

    fn text(&self, node: Node) -> &'s str {
        &self.source[node.byte_range()]
    }

    fn field_text(&self, node: Node, field: &str) -> Option<&'s str> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    pub(super) fn lower_program(mut self, root: Node) -> SyntaxTree {
        let mut package = None;
        let mut types = Vec::new();

        for child in named_children(root) {
            match child.kind() {
                "package_declaration" => {
                    package = named_children(child)
                        .into_iter()
                        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
                        .map(|c| self.text(c).to_string());
                }
                kind if is_type_declaration(kind) => types.push(self.lower_type(child)),
                _ => {}
            }
        }

        let id = self
            .tree
            .push(NodeKind::CompilationUnit { package, types }, span_of(root));
        self.tree.set_root(id);
        self.tree
    }

    /// Keyword modifiers and annotation nodes of a declaration
    fn lower_modifiers(&mut self, decl: Node) -> (Vec<String>, Vec<NodeId>) {
        let mut keywords = Vec::new();
        let mut annotations = Vec::new();

        let Some(modifiers) = named_children(decl)
            .into_iter()
            .find(|c| c.kind() == "modifiers")
        else {
            return (keywords, annotations);
        };

        let mut cursor = modifiers.walk();
        let children: Vec<Node> = modifiers.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "marker_annotation" | "annotation" => annotations.push(self.lower_annotation(child)),
                _ if !child.is_named() => keywords.push(child.kind().to_string()),
                _ => {}
            }
        }
        (keywords, annotations)
    }

    fn lower_annotation(&mut self, node: Node) -> NodeId {
        let name = self
            .field_text(node, "name")
            .unwrap_or_else(|| self.text(node).trim_start_matches('@'))
            .to_string();
        self.tree
            .push(NodeKind::Annotation { name }, Some(Span::line(line_of(node))))
    }

    /// Texts of the types listed under a `superclass`, `super_interfaces`
    /// or `extends_interfaces` clause
    fn clause_types(&self, clause: Node) -> Vec<String> {
        let mut types = Vec::new();
        for child in named_children(clause) {
            if child.kind() == "type_list" {
                types.extend(named_children(child).into_iter().map(|t| self.text(t).to_string()));
            } else {
                types.push(self.text(child).to_string());
            }
        }
        types
    }

    fn lower_type(&mut self, node: Node) -> NodeId {
        let kind = match node.kind() {
            "interface_declaration" => TypeKind::Interface,
            "enum_declaration" => TypeKind::Enum,
            "record_declaration" => TypeKind::Record,
            "annotation_type_declaration" => TypeKind::Annotation,
            _ => TypeKind::Class,
        };
        let name_node = node.child_by_field_name("name");
        let name = name_node.map(|n| self.text(n).to_string()).unwrap_or_default();
        let (modifiers, annotations) = self.lower_modifiers(node);

        let mut extends = Vec::new();
        let mut implements = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "superclass" | "extends_interfaces" => extends.extend(self.clause_types(child)),
                "super_interfaces" => implements.extend(self.clause_types(child)),
                _ => {}
            }
        }

        let mut members = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            for child in named_children(body) {
                if child.kind() == "enum_body_declarations" {
                    for inner in named_children(child) {
                        members.extend(self.lower_member(inner));
                    }
                } else {
                    members.extend(self.lower_member(child));
                }
            }
        }

        // The header line is the one holding the type name, not a leading annotation.
        let start = name_node.map(line_of).unwrap_or_else(|| line_of(node));
        let span = Span::new(start, node.end_position().row as u32 + 1);

        self.tree.push(
            NodeKind::Class(ClassDecl {
                name,
                kind,
                modifiers,
                annotations,
                extends,
                implements,
                members,
            }),
            Some(span),
        )
    }

    fn lower_member(&mut self, node: Node) -> Option<NodeId> {
        match node.kind() {
            "field_declaration" | "constant_declaration" => Some(self.lower_field(node)),
            "method_declaration" => Some(self.lower_method(node, false)),
            "constructor_declaration" | "compact_constructor_declaration" => {
                Some(self.lower_method(node, true))
            }
            "static_initializer" => {
                let block = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() == "block")?;
                let block = self.lower_block(block);
                Some(self.tree.push(
                    NodeKind::Initializer {
                        is_static: true,
                        block,
                    },
                    span_of(node),
                ))
            }
            "block" => {
                let block = self.lower_block(node);
                Some(self.tree.push(
                    NodeKind::Initializer {
                        is_static: false,
                        block,
                    },
                    span_of(node),
                ))
            }
            kind if is_type_declaration(kind) => Some(self.lower_type(node)),
            _ => None,
        }
    }

    fn lower_field(&mut self, node: Node) -> NodeId {
        let (modifiers, annotations) = self.lower_modifiers(node);
        let mut names = Vec::new();
        let mut initializers = Vec::new();

        let mut cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        for declarator in declarators {
            if let Some(name) = self.field_text(declarator, "name") {
                names.push(name.to_string());
            }
            if let Some(value) = declarator.child_by_field_name("value") {
                initializers.extend(self.lower(value));
            }
        }

        let start = node
            .child_by_field_name("type")
            .map(line_of)
            .unwrap_or_else(|| line_of(node));
        let span = Span::new(start, node.end_position().row as u32 + 1);

        self.tree.push(
            NodeKind::Field(FieldDecl {
                names,
                modifiers,
                annotations,
                initializers,
            }),
            Some(span),
        )
    }

    fn lower_method(&mut self, node: Node, is_constructor: bool) -> NodeId {
        let name_node = node.child_by_field_name("name");
        let name = name_node.map(|n| self.text(n).to_string()).unwrap_or_default();
        let (modifiers, annotations) = self.lower_modifiers(node);

        let throws = named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "throws")
            .flat_map(named_children)
            .map(|t| self.text(t).to_string())
            .collect();

        let body = node
            .child_by_field_name("body")
            .map(|b| self.lower_block(b));

        // The signature line is the line holding the method name.
        let start = name_node.map(line_of).unwrap_or_else(|| line_of(node));
        let span = Span::new(start, node.end_position().row as u32 + 1);

        self.tree.push(
            NodeKind::Method(MethodDecl {
                name,
                is_constructor,
                modifiers,
                annotations,
                throws,
                body,
            }),
            Some(span),
        )
    }

    fn lower_block(&mut self, node: Node) -> NodeId {
        let statements = self.lower_all(named_children(node));
        self.tree
            .push(NodeKind::Block { statements }, span_of(node))
    }

    fn lower_all(&mut self, nodes: Vec<Node>) -> Vec<NodeId> {
        nodes.into_iter().filter_map(|n| self.lower(n)).collect()
    }

    /// Lower `node`, substituting an empty placeholder when it holds nothing
    /// of interest (literals, types)
    fn lower_or_empty(&mut self, node: Node) -> NodeId {
        match self.lower(node) {
            Some(id) => id,
            None => self
                .tree
                .push(NodeKind::Unmodeled { children: Vec::new() }, span_of(node)),
        }
    }

    fn lower(&mut self, node: Node) -> Option<NodeId> {
        if self.depth >= MAX_DEPTH {
            tracing::debug!(line = line_of(node), "Expression nesting too deep, truncating");
            return None;
        }
        self.depth += 1;
        let id = self.lower_inner(node);
        self.depth -= 1;
        id
    }

    fn lower_inner(&mut self, node: Node) -> Option<NodeId> {
        let span = span_of(node);
        let kind = node.kind();

        if SKIPPED_KINDS.contains(&kind) {
            return None;
        }

        let lowered = match kind {
            "block" | "constructor_body" => return Some(self.lower_block(node)),
            "expression_statement" | "parenthesized_expression" => {
                let inner = named_children(node).into_iter().next()?;
                return self.lower(inner);
            }
            "identifier" => NodeKind::MemberReference {
                qualifier: None,
                member: self.text(node).to_string(),
            },
            "field_access" => return self.lower_field_access(node),
            "assignment_expression" => {
                let target = self.lower_or_empty(node.child_by_field_name("left")?);
                let value = self.lower_or_empty(node.child_by_field_name("right")?);
                NodeKind::Assignment { target, value }
            }
            "binary_expression" => {
                let left = self.lower_or_empty(node.child_by_field_name("left")?);
                let right = self.lower_or_empty(node.child_by_field_name("right")?);
                NodeKind::BinaryOperation { left, right }
            }
            "if_statement" | "ternary_expression" => {
                let condition = self.lower_or_empty(node.child_by_field_name("condition")?);
                let then_branch = self.lower_or_empty(node.child_by_field_name("consequence")?);
                let else_branch = node
                    .child_by_field_name("alternative")
                    .map(|n| self.lower_or_empty(n));
                NodeKind::If {
                    condition,
                    then_branch,
                    else_branch,
                }
            }
            "for_statement" | "enhanced_for_statement" | "while_statement" | "do_statement" => {
                let mut header = Vec::new();
                let mut body = None;
                for (field, child) in fielded_children(node) {
                    match field {
                        Some("body") => body = Some(self.lower_or_empty(child)),
                        Some(f) if SKIPPED_FIELDS.contains(&f) => {}
                        _ => header.extend(self.lower(child)),
                    }
                }
                NodeKind::Loop {
                    header,
                    body: body?,
                }
            }
            "try_statement" | "try_with_resources_statement" => {
                let mut resources = Vec::new();
                let mut catches = Vec::new();
                let mut finally = None;
                for child in named_children(node) {
                    match child.kind() {
                        "resource_specification" => {
                            resources.extend(self.lower_generic(child));
                        }
                        "catch_clause" => {
                            if let Some(body) = child.child_by_field_name("body") {
                                catches.push(self.lower_block(body));
                            }
                        }
                        "finally_clause" => {
                            if let Some(block) =
                                named_children(child).into_iter().find(|c| c.kind() == "block")
                            {
                                finally = Some(self.lower_block(block));
                            }
                        }
                        _ => {}
                    }
                }
                let block = self.lower_block(node.child_by_field_name("body")?);
                NodeKind::Try {
                    resources,
                    block,
                    catches,
                    finally,
                }
            }
            "method_invocation" => self.lower_invocation(node)?,
            "object_creation_expression" => {
                let type_name = self
                    .field_text(node, "type")
                    .map(simple_type_name)
                    .unwrap_or_default();
                let arguments = match node.child_by_field_name("arguments") {
                    Some(args) => self.lower_all(named_children(args)),
                    None => Vec::new(),
                };
                let mut body = Vec::new();
                if let Some(class_body) = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() == "class_body")
                {
                    for member in named_children(class_body) {
                        if let Some(method_body) = member.child_by_field_name("body") {
                            body.push(self.lower_block(method_body));
                        }
                    }
                }
                NodeKind::ObjectCreation {
                    type_name,
                    arguments,
                    body,
                }
            }
            "lambda_expression" => {
                let body = node.child_by_field_name("body")?;
                return self.lower(body);
            }
            kind if is_type_declaration(kind) => return Some(self.lower_type(node)),
            _ => return self.lower_generic(node),
        };

        Some(self.tree.push(lowered, span))
    }

    fn lower_field_access(&mut self, node: Node) -> Option<NodeId> {
        let object = node.child_by_field_name("object")?;
        let member = self.field_text(node, "field")?.to_string();
        let object_text = self.text(object);

        let reference = NodeKind::MemberReference {
            qualifier: Some(object_text.to_string()),
            member,
        };

        if is_plain_name(object_text) || matches!(object.kind(), "this" | "super") {
            return Some(self.tree.push(reference, span_of(node)));
        }

        // `call().field`: keep the receiver expression reachable.
        let receiver = self.lower(object);
        let reference = self.tree.push(reference, span_of(node));
        let children = receiver.into_iter().chain(std::iter::once(reference)).collect();
        Some(
            self.tree
                .push(NodeKind::Unmodeled { children }, span_of(node)),
        )
    }

    fn lower_invocation(&mut self, node: Node) -> Option<NodeKind> {
        let member = self.field_text(node, "name")?.to_string();

        let (qualifier, receiver) = match node.child_by_field_name("object") {
            None => (None, None),
            Some(object) => {
                let text = self.text(object);
                match object.kind() {
                    "this" | "super" => (None, None),
                    _ if is_plain_name(text) => {
                        let text = text.strip_prefix("this.").unwrap_or(text);
                        (Some(text.to_string()), None)
                    }
                    _ => (None, self.lower(object)),
                }
            }
        };

        let arguments = match node.child_by_field_name("arguments") {
            Some(args) => self.lower_all(named_children(args)),
            None => Vec::new(),
        };

        Some(NodeKind::MethodInvocation {
            qualifier,
            member,
            receiver,
            arguments,
        })
    }

    /// Any shape without a dedicated variant: keep whatever children lower
    /// to something, drop the node entirely if none do
    fn lower_generic(&mut self, node: Node) -> Option<NodeId> {
        let mut children = Vec::new();
        for (field, child) in fielded_children(node) {
            if field.is_some_and(|f| SKIPPED_FIELDS.contains(&f)) {
                continue;
            }
            children.extend(self.lower(child));
        }
        if children.is_empty() {
            return None;
        }
        Some(
            self.tree
                .push(NodeKind::Unmodeled { children }, span_of(node)),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::JavaParser;
    use crate::syntax::{NodeKind, SyntaxTree, TypeKind};

    fn parse(src: &str) -> SyntaxTree {
        JavaParser::new().parse_source(src).unwrap()
    }

    const SAMPLE: &str = "\
package com.example;

import java.util.List;

@Deprecated
public class Widget extends Base implements Runnable, Cloneable {
    private int a, b = 2;
    static { init(); }
    { count++; }

    public Widget() {
        this.a = 1;
    }

    @Override
    public void run() throws java.io.IOException, IllegalStateException {
        if (a > b) {
            helper.go(a);
        } else {
            Util.log(\"x\");
        }
    }
}
";

    #[test]
    fn test_package_and_class_header() {
        let tree = parse(SAMPLE);
        assert_eq!(tree.package(), Some("com.example"));
        let (id, class) = tree.classes().next().unwrap();
        assert_eq!(class.name, "Widget");
        assert_eq!(class.kind, TypeKind::Class);
        assert_eq!(class.extends, vec!["Base"]);
        assert_eq!(class.implements, vec!["Runnable", "Cloneable"]);
        assert_eq!(class.modifiers, vec!["public"]);
        assert_eq!(tree.annotation_name(class.annotations[0]), Some("Deprecated"));
        // Declaration line is the line with the class name, not the annotation.
        assert_eq!(tree.span(id).unwrap().start, 6);
    }

    #[test]
    fn test_fields_list_all_declarators() {
        let tree = parse(SAMPLE);
        let (id, field) = tree.fields().next().unwrap();
        assert_eq!(field.names, vec!["a", "b"]);
        assert_eq!(tree.span(id).unwrap().start, 7);
        assert_eq!(field.initializers.len(), 0, "literal initializers lower to nothing");
    }

    #[test]
    fn test_initializers_are_tagged() {
        let tree = parse(SAMPLE);
        let inits: Vec<(bool, u32)> = tree
            .iter()
            .filter_map(|(_, n)| match n.kind {
                NodeKind::Initializer { is_static, .. } => Some((is_static, n.line().unwrap())),
                _ => None,
            })
            .collect();
        assert_eq!(inits, vec![(true, 8), (false, 9)]);
    }

    #[test]
    fn test_methods_and_constructors() {
        let tree = parse(SAMPLE);
        let methods: Vec<_> = tree.methods().map(|(id, m)| (id, m.clone())).collect();
        assert_eq!(methods.len(), 2);

        let (ctor_id, ctor) = &methods[0];
        assert!(ctor.is_constructor);
        assert_eq!(ctor.name, "Widget");
        assert_eq!(tree.span(*ctor_id).unwrap().start, 11);

        let (run_id, run) = &methods[1];
        assert!(!run.is_constructor);
        assert_eq!(run.throws, vec!["java.io.IOException", "IllegalStateException"]);
        assert_eq!(tree.annotation_name(run.annotations[0]), Some("Override"));
        assert_eq!(tree.span(*run_id).unwrap(), crate::syntax::Span::new(16, 22));
    }

    #[test]
    fn test_invocation_qualifiers() {
        let tree = parse(
            "class T { void t() { a.b.c(); this.d(); e(); f().g(); this.h.i(); new K().m(); } }",
        );
        let calls: Vec<(Option<String>, String)> = tree
            .iter()
            .filter_map(|(_, n)| match &n.kind {
                NodeKind::MethodInvocation {
                    qualifier, member, ..
                } => Some((qualifier.clone(), member.clone())),
                _ => None,
            })
            .collect();
        assert!(calls.contains(&(Some("a.b".into()), "c".into())));
        assert!(calls.contains(&(None, "d".into())));
        assert!(calls.contains(&(None, "e".into())));
        assert!(calls.contains(&(None, "g".into())));
        assert!(calls.contains(&(None, "f".into())));
        assert!(calls.contains(&(Some("h".into()), "i".into())));
        assert!(calls.contains(&(None, "m".into())));
    }

    #[test]
    fn test_object_creation_uses_simple_name() {
        let tree = parse("class T { void t() { new java.util.ArrayList<String>(); } }");
        let created: Vec<String> = tree
            .iter()
            .filter_map(|(_, n)| match &n.kind {
                NodeKind::ObjectCreation { type_name, .. } => Some(type_name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(created, vec!["ArrayList"]);
    }

    #[test]
    fn test_declaration_names_are_not_references() {
        let tree = parse("class T { void t(int p) { int local = 1; for (String s : xs) {} } }");
        let refs: Vec<String> = tree
            .iter()
            .filter_map(|(_, n)| match &n.kind {
                NodeKind::MemberReference { member, .. } => Some(member.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(refs, vec!["xs"]);
    }

    #[test]
    fn test_interface_extends_and_abstract_method() {
        let tree = parse("interface Shape extends Comparable<Shape> { double area(); }");
        let (_, class) = tree.classes().next().unwrap();
        assert_eq!(class.kind, TypeKind::Interface);
        assert_eq!(class.extends, vec!["Comparable<Shape>"]);
        let (_, method) = tree.methods().next().unwrap();
        assert!(method.body.is_none());
    }
}
