//! Unified diff parser
//!
//! Maps `git diff --unified=0` output onto line numbers of the new revision.
//! Only the shape git produces with `--no-color` is understood; anything
//! else in a hunk body is ignored.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Compiled once, reused across every file looked up in a diff
static HUNK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hardcoded hunk regex")
});

/// One line of a hunk body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

/// A single hunk, one changed region of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    pub old_start: u32,
    pub old_len: u32,
    /// First line of the hunk in the new revision (1-based, 0 for an emptied file)
    pub new_start: u32,
    pub new_len: u32,
    pub lines: Vec<DiffLine>,
}

/// Every hunk of one file's section
#[derive(Debug, Clone, Default)]
pub struct FileDiff {
    /// Path in the new revision, as written in the diff
    pub path: String,
    pub old_path: String,
    pub deleted: bool,
    pub hunks: Vec<DiffHunk>,
}

fn normalize_path(path: &str) -> String {
    let path = path.trim().trim_matches('"').replace('\\', "/");
    let mut rest = path.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// `diff --git a/X b/Y` -> (X, Y)
fn split_git_header(rest: &str) -> Option<(String, String)> {
    let rest = rest.trim();
    let idx = rest.rfind(" b/").or_else(|| rest.rfind(" \"b/"))?;
    let (old, new) = rest.split_at(idx);
    let old = old.trim().trim_matches('"');
    let new = new.trim().trim_matches('"');
    let old = old.strip_prefix("a/").unwrap_or(old);
    let new = new.strip_prefix("b/").unwrap_or(new);
    Some((normalize_path(old), normalize_path(new)))
}

fn parse_hunk_header(line: &str) -> Option<DiffHunk> {
    let caps = HUNK_RE.captures(line)?;
    let num = |i: usize, default: u32| -> Option<u32> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(default),
        }
    };
    Some(DiffHunk {
        old_start: num(1, 0)?,
        old_len: num(2, 1)?,
        new_start: num(3, 0)?,
        new_len: num(4, 1)?,
        lines: Vec::new(),
    })
}

/// Parse unified diff output into per-file sections.
///
/// - Sections start at `diff --git` lines; the `+++` header refines the new
///   path and marks deletions (`+++ /dev/null`)
/// - A malformed `@@` header is skipped with a warning together with the
///   lines that follow it
/// - Lines starting with `\` (`\ No newline at end of file`) are dropped
pub fn parse_unified_diff(input: &str) -> Vec<FileDiff> {
    if input.is_empty() {
        return Vec::new();
    }

    let input = if input.contains('\r') {
        Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(input)
    };

    let mut files: Vec<FileDiff> = Vec::new();
    // Some(true) while inside a well-formed hunk, Some(false) after a
    // malformed header, None before the first hunk of a section
    let mut in_hunk: Option<bool> = None;

    for line in input.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            in_hunk = None;
            match split_git_header(rest) {
                Some((old_path, path)) => files.push(FileDiff {
                    path,
                    old_path,
                    ..Default::default()
                }),
                None => {
                    tracing::warn!(line, "Unrecognized diff header, skipping section");
                    files.push(FileDiff::default());
                }
            }
            continue;
        }

        let Some(file) = files.last_mut() else {
            continue;
        };

        if line.starts_with("@@") {
            match parse_hunk_header(line) {
                Some(hunk) => {
                    file.hunks.push(hunk);
                    in_hunk = Some(true);
                }
                None => {
                    tracing::warn!(line, file = file.path.as_str(), "Malformed hunk header, skipping hunk");
                    in_hunk = Some(false);
                }
            }
            continue;
        }

        match in_hunk {
            None => {
                if let Some(path) = line.strip_prefix("+++ ") {
                    if path.trim() == "/dev/null" {
                        file.deleted = true;
                    } else {
                        let path = path.trim();
                        file.path = normalize_path(path.strip_prefix("b/").unwrap_or(path));
                    }
                } else if line.starts_with("deleted file mode") {
                    file.deleted = true;
                }
            }
            Some(false) => {}
            Some(true) => {
                let Some(hunk) = file.hunks.last_mut() else {
                    continue;
                };
                let tagged = if let Some(text) = line.strip_prefix('+') {
                    DiffLine::Added(text.to_string())
                } else if let Some(text) = line.strip_prefix('-') {
                    DiffLine::Removed(text.to_string())
                } else if let Some(text) = line.strip_prefix(' ') {
                    DiffLine::Context(text.to_string())
                } else if line.is_empty() {
                    // Some tools strip the leading space from blank context lines
                    DiffLine::Context(String::new())
                } else {
                    continue;
                };
                hunk.lines.push(tagged);
            }
        }
    }

    files
}

/// Does the section path `candidate` name the requested `target` file?
fn exact_match(target: &str, candidate: &str) -> bool {
    target == candidate
        || target.ends_with(&format!("/{candidate}"))
        || candidate.ends_with(&format!("/{target}"))
}

/// Hunks of the section for `path`, `None` when the diff has no such section.
///
/// `path` may be the diff-relative path, a path with extra leading
/// directories, or just the file name. Exact and suffix matches win over a
/// bare file-name match.
pub fn parse_file_diff(diff: &str, path: &str) -> Option<Vec<DiffHunk>> {
    let target = normalize_path(path);
    let files = parse_unified_diff(diff);

    let by_path = files
        .iter()
        .position(|f| !f.path.is_empty() && exact_match(&target, &f.path));
    let idx = by_path.or_else(|| {
        let name = basename(&target);
        files
            .iter()
            .position(|f| !f.path.is_empty() && basename(&f.path) == name)
    })?;

    files.into_iter().nth(idx).map(|f| f.hunks)
}

/// New-revision lines added or modified by `hunks`, sorted and unique.
///
/// Added lines contribute the cursor and advance it, context lines only
/// advance it, removed lines do neither. A hunk that leaves no lines in the
/// new revision still marks its `new_start`.
pub fn impacted_lines(hunks: &[DiffHunk]) -> Vec<u32> {
    let mut lines = BTreeSet::new();
    for hunk in hunks {
        if hunk.new_len == 0 {
            if hunk.new_start > 0 {
                lines.insert(hunk.new_start);
            }
            continue;
        }
        let mut cursor = hunk.new_start;
        for line in &hunk.lines {
            match line {
                DiffLine::Added(_) => {
                    if cursor > 0 {
                        lines.insert(cursor);
                    }
                    cursor = cursor.saturating_add(1);
                }
                DiffLine::Context(_) => cursor = cursor.saturating_add(1),
                DiffLine::Removed(_) => {}
            }
        }
    }
    lines.into_iter().collect()
}

/// Impacted new-revision lines of `path` in `diff`; empty when the diff has
/// no section for it
pub fn extract_impacted_lines(diff: &str, path: &str) -> Vec<u32> {
    match parse_file_diff(diff, path) {
        Some(hunks) => impacted_lines(&hunks),
        None => {
            tracing::debug!(path, "No diff section for file");
            Vec::new()
        }
    }
}

/// New-revision paths of every file the diff touches, deletions excluded,
/// in diff order
pub fn changed_files(diff: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    parse_unified_diff(diff)
        .into_iter()
        .filter(|f| !f.deleted && !f.path.is_empty())
        .filter_map(|f| seen.insert(f.path.clone()).then_some(f.path))
        .collect()
}
