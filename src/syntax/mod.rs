//! Arena-backed Java syntax tree
//!
//! Nodes are stored in a flat `Vec` and reference their children by
//! [`NodeId`]. Analyses only ever borrow the tree, so one parsed file can be
//! walked by several passes without copying subtrees.
//!
//! Trees normally come from [`crate::parser::JavaParser`], but they can be
//! assembled by hand with [`SyntaxTree::push`], which is also the only way
//! to produce nodes without position information.

mod node;

pub use node::{ClassDecl, FieldDecl, MethodDecl, NodeKind, Span, SyntaxNode, TypeKind};

/// Index of a node inside its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A parsed compilation unit
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    root: Option<NodeId>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id. Children must be pushed first.
    pub fn push(&mut self, kind: NodeKind, span: Option<Span>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SyntaxNode { kind, span });
        id
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn span(&self, id: NodeId) -> Option<Span> {
        self.node(id).span
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in push order (children before their parents)
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SyntaxNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Declared package, if the root is a compilation unit with one
    pub fn package(&self) -> Option<&str> {
        match self.root.map(|r| self.kind(r)) {
            Some(NodeKind::CompilationUnit { package, .. }) => package.as_deref(),
            _ => None,
        }
    }

    /// Every type declaration in the file, nested ones included
    pub fn classes(&self) -> impl Iterator<Item = (NodeId, &ClassDecl)> {
        self.iter().filter_map(|(id, n)| match &n.kind {
            NodeKind::Class(c) => Some((id, c)),
            _ => None,
        })
    }

    /// Every method and constructor declaration in the file
    pub fn methods(&self) -> impl Iterator<Item = (NodeId, &MethodDecl)> {
        self.iter().filter_map(|(id, n)| match &n.kind {
            NodeKind::Method(m) => Some((id, m)),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = (NodeId, &FieldDecl)> {
        self.iter().filter_map(|(id, n)| match &n.kind {
            NodeKind::Field(f) => Some((id, f)),
            _ => None,
        })
    }

    /// Name of an annotation node, `None` if `id` is not an annotation
    pub fn annotation_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Annotation { name } => Some(name),
            _ => None,
        }
    }

    /// Statements of a method body, or the body itself when it is not a block
    pub fn body_statements(&self, body: Option<NodeId>) -> Vec<NodeId> {
        match body {
            Some(id) => match self.kind(id) {
                NodeKind::Block { statements } => statements.clone(),
                _ => vec![id],
            },
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SyntaxTree {
        let mut tree = SyntaxTree::new();
        let ann = tree.push(
            NodeKind::Annotation {
                name: "Test".into(),
            },
            Some(Span::line(3)),
        );
        let call = tree.push(
            NodeKind::MethodInvocation {
                qualifier: Some("svc".into()),
                member: "run".into(),
                receiver: None,
                arguments: vec![],
            },
            Some(Span::line(5)),
        );
        let body = tree.push(
            NodeKind::Block {
                statements: vec![call],
            },
            Some(Span::new(4, 6)),
        );
        let method = tree.push(
            NodeKind::Method(MethodDecl {
                name: "testRun".into(),
                annotations: vec![ann],
                body: Some(body),
                ..Default::default()
            }),
            Some(Span::new(4, 6)),
        );
        let class = tree.push(
            NodeKind::Class(ClassDecl {
                name: "RunTest".into(),
                members: vec![method],
                ..Default::default()
            }),
            Some(Span::new(2, 7)),
        );
        let root = tree.push(
            NodeKind::CompilationUnit {
                package: Some("com.example".into()),
                types: vec![class],
            },
            None,
        );
        tree.set_root(root);
        tree
    }

    #[test]
    fn test_filters_find_declarations() {
        let tree = sample();
        assert_eq!(tree.package(), Some("com.example"));
        assert_eq!(tree.classes().count(), 1);
        let (_, method) = tree.methods().next().unwrap();
        assert_eq!(method.name, "testRun");
        assert_eq!(tree.annotation_name(method.annotations[0]), Some("Test"));
        assert_eq!(tree.body_statements(method.body).len(), 1);
    }

    #[test]
    fn test_children_follow_source_order() {
        let tree = sample();
        let (class_id, _) = tree.classes().next().unwrap();
        let (method_id, _) = tree.methods().next().unwrap();
        assert_eq!(tree.kind(class_id).children(), vec![method_id]);
    }

    #[test]
    fn test_span_clamps_inverted_range() {
        let span = Span::new(10, 4);
        assert_eq!(span.end, 10);
        assert!(span.contains(10));
        assert!(!span.contains(9));
    }

    #[test]
    fn test_tree_without_root_has_no_package() {
        let mut tree = SyntaxTree::new();
        tree.push(NodeKind::Unmodeled { children: vec![] }, None);
        assert_eq!(tree.package(), None);
        assert_eq!(tree.len(), 1);
    }
}
