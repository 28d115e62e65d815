//! Node shapes stored in the syntax arena

use super::NodeId;

/// Inclusive, 1-based line range of a node in the new revision of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// A span covering a single line
    pub fn line(line: u32) -> Self {
        Self::new(line, line)
    }

    /// `start <= line <= end`
    pub fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }
}

/// Which keyword introduced a type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

/// A class, interface, enum, record or annotation-type declaration
#[derive(Debug, Clone, Default)]
pub struct ClassDecl {
    pub name: String,
    pub kind: TypeKind,
    /// Keyword modifiers (`public`, `abstract`, ...), annotations excluded
    pub modifiers: Vec<String>,
    pub annotations: Vec<NodeId>,
    /// Superclass for classes, super-interfaces for interfaces
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    /// Fields, methods, initializers and nested types in declaration order
    pub members: Vec<NodeId>,
}

/// A method or constructor declaration
#[derive(Debug, Clone, Default)]
pub struct MethodDecl {
    pub name: String,
    /// Set when the front-end saw an explicit constructor declaration
    pub is_constructor: bool,
    pub modifiers: Vec<String>,
    pub annotations: Vec<NodeId>,
    /// Exception type names from the `throws` clause, in source order
    pub throws: Vec<String>,
    /// `None` for abstract and interface methods
    pub body: Option<NodeId>,
}

/// A field declaration; `int a, b = 1;` declares two names
#[derive(Debug, Clone, Default)]
pub struct FieldDecl {
    pub names: Vec<String>,
    pub modifiers: Vec<String>,
    pub annotations: Vec<NodeId>,
    pub initializers: Vec<NodeId>,
}

/// Every shape the engine distinguishes.
///
/// Statement and expression shapes that the analyses do not care about are
/// lowered to [`NodeKind::Unmodeled`], which keeps their children reachable.
#[derive(Debug, Clone)]
pub enum NodeKind {
    CompilationUnit {
        package: Option<String>,
        types: Vec<NodeId>,
    },
    Class(ClassDecl),
    Method(MethodDecl),
    Field(FieldDecl),
    Annotation {
        name: String,
    },
    /// `static { ... }` or a bare `{ ... }` directly inside a class body
    Initializer {
        is_static: bool,
        block: NodeId,
    },
    Block {
        statements: Vec<NodeId>,
    },
    Assignment {
        target: NodeId,
        value: NodeId,
    },
    /// A name used as a value: `count`, `this.count`, `other.count`
    MemberReference {
        qualifier: Option<String>,
        member: String,
    },
    /// `qualifier.member(arguments)`.
    ///
    /// `qualifier` holds the receiver text when it is a plain (dotted) name;
    /// any other receiver expression is kept in `receiver` instead.
    MethodInvocation {
        qualifier: Option<String>,
        member: String,
        receiver: Option<NodeId>,
        arguments: Vec<NodeId>,
    },
    /// `new Type(arguments) { body }`
    ObjectCreation {
        type_name: String,
        arguments: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    BinaryOperation {
        left: NodeId,
        right: NodeId,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    /// `for`, enhanced `for`, `while` and `do`; the header holds the
    /// init/condition/update expressions
    Loop {
        header: Vec<NodeId>,
        body: NodeId,
    },
    Try {
        resources: Vec<NodeId>,
        block: NodeId,
        catches: Vec<NodeId>,
        finally: Option<NodeId>,
    },
    Unmodeled {
        children: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Direct children in source order
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::CompilationUnit { types, .. } => types.clone(),
            NodeKind::Class(class) => class
                .annotations
                .iter()
                .chain(&class.members)
                .copied()
                .collect(),
            NodeKind::Method(method) => method
                .annotations
                .iter()
                .copied()
                .chain(method.body)
                .collect(),
            NodeKind::Field(field) => field
                .annotations
                .iter()
                .chain(&field.initializers)
                .copied()
                .collect(),
            NodeKind::Annotation { .. } | NodeKind::MemberReference { .. } => Vec::new(),
            NodeKind::Initializer { block, .. } => vec![*block],
            NodeKind::Block { statements } => statements.clone(),
            NodeKind::Assignment { target, value } => vec![*target, *value],
            NodeKind::MethodInvocation {
                receiver,
                arguments,
                ..
            } => receiver.iter().chain(arguments).copied().collect(),
            NodeKind::ObjectCreation {
                arguments, body, ..
            } => arguments.iter().chain(body).copied().collect(),
            NodeKind::BinaryOperation { left, right } => vec![*left, *right],
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => [*condition, *then_branch]
                .into_iter()
                .chain(*else_branch)
                .collect(),
            NodeKind::Loop { header, body } => {
                header.iter().copied().chain(std::iter::once(*body)).collect()
            }
            NodeKind::Try {
                resources,
                block,
                catches,
                finally,
            } => resources
                .iter()
                .copied()
                .chain(std::iter::once(*block))
                .chain(catches.iter().copied())
                .chain(*finally)
                .collect(),
            NodeKind::Unmodeled { children } => children.clone(),
        }
    }
}

/// A node plus its optional source position
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Option<Span>,
}

impl SyntaxNode {
    /// First line of the node, if the producer recorded one
    pub fn line(&self) -> Option<u32> {
        self.span.map(|s| s.start)
    }
}
