//! Change impact analysis
//!
//! Turns a diff plus the list of files it touches into one [`ImpactRecord`]
//! per Java file, then into the `Class.method` names the call graph is
//! queried with.

mod correlate;
mod fields;
mod types;

pub use correlate::correlate;
pub use fields::references_field;
pub use types::{ChangeKind, ClassImpact, FieldImpact, ImpactRecord};

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::diff_parse::extract_impacted_lines;
use crate::parser::{JavaParser, ParserError};

/// Records for every analyzed file, plus the files that could not be
/// analyzed and why
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FileAnalysis {
    pub records: BTreeMap<PathBuf, ImpactRecord>,
    pub failures: Vec<(PathBuf, String)>,
}

impl FileAnalysis {
    fn merge(mut self, other: FileAnalysis) -> FileAnalysis {
        self.records.extend(other.records);
        self.failures.extend(other.failures);
        self
    }
}

/// Outcome of change detection.
///
/// Zero impact and a failed analysis are different answers and stay
/// distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChangeAnalysis {
    NoChangesDetected,
    AnalysisFailed { reason: String },
    Changes { methods: Vec<String> },
}

impl ChangeAnalysis {
    /// Summarize a [`FileAnalysis`].
    ///
    /// Failed files only turn the outcome into `AnalysisFailed` when no
    /// changed method was found elsewhere; otherwise they are already
    /// logged and the found changes are reported.
    pub fn from_analysis(analysis: &FileAnalysis) -> Self {
        let methods = changed_method_names(analysis);
        if !methods.is_empty() {
            return ChangeAnalysis::Changes { methods };
        }
        if analysis.failures.is_empty() {
            return ChangeAnalysis::NoChangesDetected;
        }
        let reason = analysis
            .failures
            .iter()
            .map(|(path, err)| format!("{}: {}", path.display(), err))
            .collect::<Vec<_>>()
            .join("; ");
        ChangeAnalysis::AnalysisFailed { reason }
    }
}

fn is_java(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "java")
}

/// File name without extension, used as the class name of the file
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Analyze a single file.
///
/// `file` is looked up in the diff as given and read from `root.join(file)`.
/// A file the diff does not mention yields an empty record without being
/// parsed.
pub fn analyze_file(
    diff: &str,
    root: &Path,
    file: &Path,
    parser: &JavaParser,
) -> Result<ImpactRecord, ParserError> {
    let lookup = file.to_string_lossy().replace('\\', "/");
    let lines: BTreeSet<u32> = extract_impacted_lines(diff, &lookup).into_iter().collect();
    if lines.is_empty() {
        return Ok(ImpactRecord::default());
    }
    let tree = parser.parse_file(&root.join(file))?;
    Ok(correlate(&tree, &lines, &file_stem(file)))
}

/// Analyze every Java file in `files` in parallel.
///
/// Non-Java paths are ignored. A file that fails to read or parse is logged
/// and listed in [`FileAnalysis::failures`]; the others are unaffected.
pub fn analyze_files(diff: &str, root: &Path, files: &[PathBuf], parser: &JavaParser) -> FileAnalysis {
    let _span = tracing::info_span!("analyze_files", file_count = files.len()).entered();

    let java: Vec<&PathBuf> = files.iter().filter(|f| is_java(f)).collect();
    if java.len() < files.len() {
        tracing::debug!(skipped = files.len() - java.len(), "Ignoring non-Java files");
    }

    let analysis = java
        .par_iter()
        .map(|file| {
            let mut single = FileAnalysis::default();
            match analyze_file(diff, root, file, parser) {
                Ok(record) => {
                    single.records.insert((*file).clone(), record);
                }
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "Failed to analyze file");
                    single.failures.push(((*file).clone(), e.to_string()));
                }
            }
            single
        })
        .reduce(FileAnalysis::default, FileAnalysis::merge);

    tracing::info!(
        analyzed = analysis.records.len(),
        failed = analysis.failures.len(),
        "Impact analysis complete"
    );
    analysis
}

/// `Class.member` for every impacted method and constructor, in file
/// order, without duplicates
pub fn changed_method_names(analysis: &FileAnalysis) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    for (path, record) in &analysis.records {
        let class = file_stem(path);
        for member in record.member_names() {
            let name = format!("{class}.{member}");
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }
    names
}
