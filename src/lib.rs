//! # jade - Java change impact analysis
//!
//! Finds which existing tests are affected by a change to a Java codebase,
//! so only those need to run.
//!
//! ## Pipeline
//!
//! - **Diff lines**: new-revision lines touched by a zero-context diff ([`diff_parse`])
//! - **Impact records**: methods, constructors, fields, classes, annotations,
//!   initializers and exceptions touched in each file ([`impact`])
//! - **Call graph**: test methods mapped to the methods they invoke, and back ([`call_graph`])
//! - **Resolution**: changed `Class.method` names joined against the graph ([`mod@resolve`])
//!
//! Matching is textual: calls are recorded as written (`qualifier.member`),
//! not resolved against types.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use jade::{analyze_files, build_from_dir, resolve, ChangeAnalysis, JavaParser};
//!
//! # fn main() -> anyhow::Result<()> {
//! let root = Path::new(".");
//! let diff = jade::git::diff(root, "HEAD~1", "HEAD")?;
//! let files = jade::git::affected_files(root, "HEAD~1", "HEAD")?;
//!
//! let parser = JavaParser::new();
//! let analysis = analyze_files(&diff, root, &files, &parser);
//!
//! if let ChangeAnalysis::Changes { methods } = ChangeAnalysis::from_analysis(&analysis) {
//!     let graph = build_from_dir(&root.join("src/test/java"), &parser, &["Test"])?;
//!     for impact in resolve(&graph, &methods) {
//!         println!("{}: {:?}", impact.method, impact.tests);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod call_graph;
pub mod config;
pub mod diff_parse;
pub mod git;
pub mod impact;
pub mod parser;
pub mod resolve;
pub mod runner;
pub mod syntax;

pub use call_graph::{build_from_dir, CallGraph, GraphError};
pub use impact::{analyze_files, ChangeAnalysis, FileAnalysis, ImpactRecord};
pub use parser::{JavaParser, ParserError};
pub use resolve::{resolve, MethodImpact};
pub use syntax::SyntaxTree;
