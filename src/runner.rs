//! Running impacted tests through Maven or Gradle

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Unknown build tool '{0}' (expected maven or gradle)")]
    UnknownTool(String),
    /// Compiling and launching tests with plain `javac`/`java` needs a
    /// classpath only the build tool knows
    #[error("Running tests with plain '{0}' is not supported; use maven or gradle")]
    DirectJava(String),
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build tool used to execute tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTool {
    #[default]
    Maven,
    Gradle,
}

impl FromStr for BuildTool {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maven" | "mvn" => Ok(BuildTool::Maven),
            "gradle" => Ok(BuildTool::Gradle),
            "java" | "javac" => Err(RunnerError::DirectJava(s.to_string())),
            other => Err(RunnerError::UnknownTool(other.to_string())),
        }
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildTool::Maven => write!(f, "maven"),
            BuildTool::Gradle => write!(f, "gradle"),
        }
    }
}

impl BuildTool {
    /// The project's wrapper script if it has one, else the tool on `PATH`
    pub fn program(&self, project_dir: &Path) -> PathBuf {
        let (wrapper, global) = match self {
            BuildTool::Maven => ("mvnw", "mvn"),
            BuildTool::Gradle => ("gradlew", "gradle"),
        };
        let local = project_dir.join(wrapper);
        if local.is_file() {
            local
        } else {
            PathBuf::from(global)
        }
    }

    /// Arguments selecting `methods` of `class`
    pub fn test_args(&self, class: &str, methods: &[String]) -> Vec<String> {
        match self {
            BuildTool::Maven => {
                let selector = methods
                    .iter()
                    .map(|m| format!("{class}#{m}"))
                    .collect::<Vec<_>>()
                    .join(",");
                vec!["test".into(), format!("-Dtest={selector}")]
            }
            BuildTool::Gradle => {
                let mut args = vec!["test".to_string()];
                for m in methods {
                    args.push("--tests".into());
                    args.push(format!("{class}.{m}"));
                }
                args
            }
        }
    }
}

/// `pkg.Class.method` names grouped as `pkg.Class` -> methods.
///
/// Names without a dot cannot be split and are dropped with a warning.
pub fn group_tests_by_class<S: AsRef<str>>(tests: &[S]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for test in tests {
        let test = test.as_ref();
        match test.rsplit_once('.') {
            Some((class, method)) if !class.is_empty() && !method.is_empty() => {
                let methods = groups.entry(class.to_string()).or_default();
                if !methods.iter().any(|m| m == method) {
                    methods.push(method.to_string());
                }
            }
            _ => tracing::warn!(test, "Test name has no class part, skipping"),
        }
    }
    groups
}

/// Source file of a test class: `pkg/Class.java` under the test root, or
/// any `Class.java` below it
pub fn find_test_file(test_dir: &Path, class: &str) -> Option<PathBuf> {
    let relative = format!("{}.java", class.replace('.', "/"));
    let direct = test_dir.join(&relative);
    if direct.is_file() {
        return Some(direct);
    }
    let simple = format!("{}.java", class.rsplit('.').next().unwrap_or(class));
    ignore::WalkBuilder::new(test_dir)
        .build()
        .flatten()
        .find(|e| e.file_name().to_str() == Some(simple.as_str()))
        .map(|e| e.into_path())
}

/// Executes tests class by class
#[derive(Debug, Clone)]
pub struct TestRunner {
    project_dir: PathBuf,
    test_dir: PathBuf,
    tool: BuildTool,
}

impl TestRunner {
    pub fn new(project_dir: impl Into<PathBuf>, test_dir: impl Into<PathBuf>, tool: BuildTool) -> Self {
        Self {
            project_dir: project_dir.into(),
            test_dir: test_dir.into(),
            tool,
        }
    }

    /// Run `tests` and report pass/fail per test name.
    ///
    /// Every method of a class shares the outcome of that class's single
    /// build-tool run. Classes whose source cannot be found, or whose run
    /// could not be started, count as failed.
    pub fn run<S: AsRef<str>>(&self, tests: &[S]) -> BTreeMap<String, bool> {
        let _span = tracing::info_span!("run_tests", tool = %self.tool, count = tests.len()).entered();
        let mut results = BTreeMap::new();

        for (class, methods) in group_tests_by_class(tests) {
            let passed = if find_test_file(&self.test_dir, &class).is_none() {
                tracing::warn!(class = class.as_str(), "Test source not found, marking failed");
                false
            } else {
                match self.run_class(&class, &methods) {
                    Ok(passed) => passed,
                    Err(e) => {
                        tracing::error!(class = class.as_str(), error = %e, "Test run failed to start");
                        false
                    }
                }
            };
            for method in methods {
                results.insert(format!("{class}.{method}"), passed);
            }
        }
        results
    }

    /// One build-tool invocation for `methods` of `class`; `Ok(true)` when
    /// it exits successfully
    pub fn run_class(&self, class: &str, methods: &[String]) -> Result<bool, RunnerError> {
        let program = self.tool.program(&self.project_dir);
        let args = self.tool.test_args(class, methods);
        tracing::info!(class, program = %program.display(), "Running test class");

        let output = Command::new(&program)
            .args(&args)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RunnerError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let tail: Vec<&str> = stdout.lines().rev().take(20).collect();
            tracing::debug!(class, output = %tail.into_iter().rev().collect::<Vec<_>>().join("\n"), "Test class failed");
        }
        Ok(output.status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_class() {
        let groups = group_tests_by_class(&[
            "com.acme.ATest.one",
            "com.acme.ATest.two",
            "com.acme.BTest.one",
            "Plain.test",
            "nodot",
            "com.acme.ATest.one",
        ]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups["com.acme.ATest"], vec!["one", "two"]);
        assert_eq!(groups["Plain"], vec!["test"]);
    }

    #[test]
    fn test_maven_args() {
        let args = BuildTool::Maven.test_args("a.ATest", &["x".into(), "y".into()]);
        assert_eq!(args, vec!["test", "-Dtest=a.ATest#x,a.ATest#y"]);
    }

    #[test]
    fn test_gradle_args() {
        let args = BuildTool::Gradle.test_args("a.ATest", &["x".into(), "y".into()]);
        assert_eq!(args, vec!["test", "--tests", "a.ATest.x", "--tests", "a.ATest.y"]);
    }

    #[test]
    fn test_wrapper_preferred() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(BuildTool::Gradle.program(dir.path()), PathBuf::from("gradle"));
        std::fs::write(dir.path().join("gradlew"), "#!/bin/sh\n").unwrap();
        assert_eq!(BuildTool::Gradle.program(dir.path()), dir.path().join("gradlew"));
    }

    #[test]
    fn test_parse_build_tool() {
        assert_eq!("Maven".parse::<BuildTool>().unwrap(), BuildTool::Maven);
        assert_eq!("gradle".parse::<BuildTool>().unwrap(), BuildTool::Gradle);
        assert!(matches!(
            "ant".parse::<BuildTool>(),
            Err(RunnerError::UnknownTool(_))
        ));
    }

    #[test]
    fn test_direct_java_points_to_build_tools() {
        let err = "java".parse::<BuildTool>().unwrap_err();
        assert!(matches!(err, RunnerError::DirectJava(_)));
        assert!(err.to_string().contains("use maven or gradle"));
    }

    #[test]
    fn test_find_test_file_by_package_or_name() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("com/acme");
        std::fs::create_dir_all(&pkg).unwrap();
        std::fs::write(pkg.join("ATest.java"), "class ATest {}").unwrap();
        let other = dir.path().join("misc");
        std::fs::create_dir_all(&other).unwrap();
        std::fs::write(other.join("BTest.java"), "class BTest {}").unwrap();

        assert!(find_test_file(dir.path(), "com.acme.ATest").is_some());
        assert!(find_test_file(dir.path(), "wrong.pkg.BTest").is_some());
        assert!(find_test_file(dir.path(), "com.acme.Missing").is_none());
    }

    #[test]
    fn test_missing_sources_fail_without_running() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TestRunner::new(dir.path(), dir.path().join("src/test/java"), BuildTool::Maven);
        let results = runner.run(&["com.acme.GoneTest.testIt"]);
        assert_eq!(results.get("com.acme.GoneTest.testIt"), Some(&false));
    }
}
