//! Plain-text mapping file.
//!
//! ```text
//! com.acme.CalcTest.adds:
//!   - Calculator.add
//!   - assertEquals
//! com.acme.CalcTest.testEmpty:
//! ```
//!
//! Only the forward map is written; loading rebuilds the inverse.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::{CallGraph, GraphError};

impl CallGraph {
    /// Write the forward map, tests and methods in sorted order
    pub fn save<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        for (test, methods) in &self.test_to_methods {
            writeln!(out, "{test}:")?;
            for method in methods {
                writeln!(out, "  - {method}")?;
            }
        }
        out.flush()
    }

    /// Read a mapping written by [`CallGraph::save`].
    ///
    /// The result holds only what the input says; blank lines are skipped,
    /// and method lines before any test or unrecognized lines are logged
    /// and ignored.
    pub fn load<R: BufRead>(input: R) -> std::io::Result<CallGraph> {
        let mut graph = CallGraph::new();
        let mut current: Option<String> = None;

        for (idx, line) in input.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(method) = trimmed.strip_prefix("- ") {
                match &current {
                    Some(test) => graph.insert_test(test, [method.trim()]),
                    None => {
                        tracing::warn!(line = idx + 1, "Method entry before any test, ignoring")
                    }
                }
            } else if let Some(test) = trimmed.strip_suffix(':') {
                let test = test.trim().to_string();
                graph.insert_test(&test, Vec::<String>::new());
                current = Some(test);
            } else {
                tracing::warn!(line = idx + 1, content = trimmed, "Unrecognized mapping line, ignoring");
            }
        }

        Ok(graph)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), GraphError> {
        let file = File::create(path)?;
        self.save(BufWriter::new(file))?;
        tracing::info!(path = %path.display(), tests = self.test_count(), "Saved call graph");
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<CallGraph, GraphError> {
        let file = File::open(path)?;
        let graph = CallGraph::load(BufReader::new(file))?;
        tracing::info!(path = %path.display(), tests = graph.test_count(), "Loaded call graph");
        Ok(graph)
    }
}
