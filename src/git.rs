//! Git plumbing: revision lookup, diff text and changed-file lists

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

/// A revision named on the command line, before it is resolved to a hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    Head,
    /// `HEAD~n`
    HeadMinus(usize),
    Branch(String),
    Commit(String),
}

/// Pick the `(base, target)` pair from the comparison flags.
///
/// Precedence: commits back, two branches, branch plus commit, one branch,
/// two commits, one commit, then `HEAD~1..HEAD`.
pub fn comparison_revisions(
    commits_back: Option<usize>,
    branches: &[String],
    commits: &[String],
) -> (Revision, Revision) {
    if let Some(n) = commits_back.filter(|&n| n > 0) {
        return (Revision::HeadMinus(n), Revision::Head);
    }
    match (branches, commits) {
        ([base, target, ..], _) => (
            Revision::Branch(base.clone()),
            Revision::Branch(target.clone()),
        ),
        ([branch], [commit, ..]) => (
            Revision::Commit(commit.clone()),
            Revision::Branch(branch.clone()),
        ),
        ([branch], []) => (Revision::Branch(branch.clone()), Revision::Head),
        ([], [base, target, ..]) => (
            Revision::Commit(base.clone()),
            Revision::Commit(target.clone()),
        ),
        ([], [commit]) => (Revision::Commit(commit.clone()), Revision::Head),
        ([], []) => (Revision::HeadMinus(1), Revision::Head),
    }
}

fn check_revision(rev: &str) -> Result<()> {
    if rev.is_empty() {
        anyhow::bail!("Empty revision");
    }
    if rev.starts_with('-') {
        anyhow::bail!("Invalid revision '{}': must not start with '-'", rev);
    }
    Ok(())
}

fn run_git(root: &Path, args: &[&str]) -> Result<String> {
    let _span = tracing::debug_span!("run_git", args = ?args).entered();

    let output = Command::new("git")
        .arg("--no-pager")
        .args(args)
        .current_dir(root)
        .output()
        .context("Failed to run 'git'. Is git installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.contains("not a git repository") {
            anyhow::bail!("Not a git repository: {}", root.display());
        }
        anyhow::bail!("git {} failed: {}", args.first().unwrap_or(&""), stderr);
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Hash of `HEAD~n`
pub fn previous_commit(root: &Path, n: usize) -> Result<String> {
    let rev = format!("HEAD~{n}");
    let out = run_git(root, &["rev-parse", "--verify", &rev])
        .with_context(|| format!("Cannot resolve {rev}: history too short?"))?;
    Ok(out.trim().to_string())
}

/// Hash the branch currently points at
pub fn branch_head(root: &Path, branch: &str) -> Result<String> {
    check_revision(branch)?;
    let out = run_git(root, &["rev-parse", "--verify", branch])
        .with_context(|| format!("Unknown branch '{branch}'"))?;
    Ok(out.trim().to_string())
}

/// Turn a [`Revision`] into something `git diff` accepts
pub fn resolve_revision(root: &Path, rev: &Revision) -> Result<String> {
    match rev {
        Revision::Head => Ok("HEAD".to_string()),
        Revision::HeadMinus(n) => previous_commit(root, *n),
        Revision::Branch(b) => branch_head(root, b),
        Revision::Commit(c) => {
            check_revision(c)?;
            Ok(c.clone())
        }
    }
}

/// Zero-context, whitespace-insensitive diff of the Java sources between
/// two revisions.
///
/// Limited to `root` and with paths relative to it, so a project nested in
/// a larger repository lines up with [`affected_files`].
pub fn diff(root: &Path, base: &str, target: &str) -> Result<String> {
    check_revision(base)?;
    check_revision(target)?;
    run_git(
        root,
        &[
            "diff",
            "--relative",
            "--unified=0",
            "--ignore-all-space",
            "--diff-algorithm=histogram",
            "--no-color",
            base,
            target,
            "--",
            "*.java",
        ],
    )
}

/// Java files under `root` that differ between two revisions, relative to
/// `root` rather than the repository top level
pub fn affected_files(root: &Path, base: &str, target: &str) -> Result<Vec<PathBuf>> {
    check_revision(base)?;
    check_revision(target)?;
    let out = run_git(
        root,
        &[
            "diff",
            "--relative",
            "--name-only",
            "--no-color",
            base,
            target,
            "--",
            "*.java",
        ],
    )?;
    Ok(out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn test_default_is_previous_commit() {
        assert_eq!(
            comparison_revisions(None, &[], &[]),
            (Revision::HeadMinus(1), Revision::Head)
        );
    }

    #[test]
    fn test_commits_back_wins() {
        assert_eq!(
            comparison_revisions(Some(3), &s(&["main"]), &s(&["abc"])),
            (Revision::HeadMinus(3), Revision::Head)
        );
    }

    #[test]
    fn test_branch_pairs() {
        assert_eq!(
            comparison_revisions(None, &s(&["main", "feature"]), &[]),
            (Revision::Branch("main".into()), Revision::Branch("feature".into()))
        );
        assert_eq!(
            comparison_revisions(None, &s(&["main"]), &[]),
            (Revision::Branch("main".into()), Revision::Head)
        );
    }

    #[test]
    fn test_branch_and_commit() {
        assert_eq!(
            comparison_revisions(None, &s(&["feature"]), &s(&["abc123"])),
            (Revision::Commit("abc123".into()), Revision::Branch("feature".into()))
        );
    }

    #[test]
    fn test_commit_pairs() {
        assert_eq!(
            comparison_revisions(None, &[], &s(&["a1", "b2"])),
            (Revision::Commit("a1".into()), Revision::Commit("b2".into()))
        );
        assert_eq!(
            comparison_revisions(None, &[], &s(&["a1"])),
            (Revision::Commit("a1".into()), Revision::Head)
        );
    }

    #[test]
    fn test_dash_revisions_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = diff(dir.path(), "--output=/tmp/x", "HEAD").unwrap_err();
        assert!(err.to_string().contains("must not start with '-'"));
        assert!(resolve_revision(dir.path(), &Revision::Commit("-x".into())).is_err());
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(["-c", "user.name=jade", "-c", "user.email=jade@example.com", "-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    #[test]
    fn test_paths_relative_to_nested_project() {
        let repo = tempfile::tempdir().unwrap();
        let project = repo.path().join("svc");
        let src = project.join("src/main/java");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(repo.path().join("Root.java"), "class Root {}\n").unwrap();
        std::fs::write(src.join("A.java"), "class A {\n  int f() { return 1; }\n}\n").unwrap();
        git(repo.path(), &["init", "-q"]);
        git(repo.path(), &["add", "."]);
        git(repo.path(), &["commit", "-q", "-m", "one"]);

        std::fs::write(repo.path().join("Root.java"), "class Root { }\n").unwrap();
        std::fs::write(src.join("A.java"), "class A {\n  int f() { return 2; }\n}\n").unwrap();
        git(repo.path(), &["commit", "-q", "-am", "two"]);

        let files = affected_files(&project, "HEAD~1", "HEAD").unwrap();
        assert_eq!(files, vec![PathBuf::from("src/main/java/A.java")]);

        let text = diff(&project, "HEAD~1", "HEAD").unwrap();
        assert!(text.contains("+++ b/src/main/java/A.java"));
        assert!(!text.contains("Root.java"));
    }

    #[test]
    fn test_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(affected_files(dir.path(), "HEAD~1", "HEAD").is_err());
    }
}
