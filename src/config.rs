//! Configuration file support for jade
//!
//! Config files are loaded in order (later overrides earlier):
//! 1. `~/.config/jade/config.toml` (user defaults)
//! 2. `.jade.toml` in the project root (project overrides)
//!
//! CLI flags override all config file values.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::call_graph::DEFAULT_TEST_ANNOTATIONS;
use crate::runner::BuildTool;

/// Configuration options loaded from config files
///
/// # Example
///
/// ```toml
/// # ~/.config/jade/config.toml or .jade.toml
/// test_dir = "module/src/test/java"   # Relative to the project directory
/// build_tool = "gradle"               # maven or gradle
/// test_annotations = ["Test", "Property"]
/// quiet = false
/// verbose = false
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Test source root (overridden by --test-dir)
    pub test_dir: Option<PathBuf>,
    /// Build tool for --run-tests (overridden by --build-tool)
    pub build_tool: Option<BuildTool>,
    /// Annotation names that mark a test method
    pub test_annotations: Option<Vec<String>>,
    /// Enable quiet mode by default
    pub quiet: Option<bool>,
    /// Enable verbose mode by default
    pub verbose: Option<bool>,
}

impl Config {
    /// Load configuration from user and project config files
    pub fn load(project_root: &Path) -> Self {
        let user_config = dirs::config_dir()
            .map(|d| d.join("jade/config.toml"))
            .and_then(|p| Self::load_file(&p))
            .unwrap_or_default();

        let project_config = Self::load_file(&project_root.join(".jade.toml")).unwrap_or_default();

        // Project overrides user
        let merged = user_config.override_with(project_config);
        tracing::debug!(
            test_dir = ?merged.test_dir,
            build_tool = ?merged.build_tool,
            test_annotations = ?merged.test_annotations,
            quiet = ?merged.quiet,
            verbose = ?merged.verbose,
            "Effective config after merge"
        );
        merged
    }

    /// Load configuration from a specific file
    pub fn load_file(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                return None;
            }
        };

        match toml::from_str::<Self>(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Layer another config on top (other overrides self where present)
    pub fn override_with(self, other: Self) -> Self {
        Config {
            test_dir: other.test_dir.or(self.test_dir),
            build_tool: other.build_tool.or(self.build_tool),
            test_annotations: other.test_annotations.or(self.test_annotations),
            quiet: other.quiet.or(self.quiet),
            verbose: other.verbose.or(self.verbose),
        }
    }

    // ===== Accessors with defaults =====

    /// Default test source root, relative to the project directory
    pub const DEFAULT_TEST_DIR: &'static str = "src/test/java";

    /// Test directory resolved against `project_dir`
    pub fn test_dir_or_default(&self, project_dir: &Path) -> PathBuf {
        let dir = self
            .test_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_TEST_DIR));
        if dir.is_absolute() {
            dir
        } else {
            project_dir.join(dir)
        }
    }

    pub fn build_tool_or_default(&self) -> BuildTool {
        self.build_tool.unwrap_or_default()
    }

    /// Test-marker annotations with default fallback (JUnit 4/5 markers)
    pub fn test_annotations_or_default(&self) -> Vec<String> {
        match &self.test_annotations {
            Some(list) if !list.is_empty() => list.clone(),
            _ => DEFAULT_TEST_ANNOTATIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Get quiet mode with default fallback (false)
    pub fn quiet_or_default(&self) -> bool {
        self.quiet.unwrap_or(false)
    }

    /// Get verbose mode with default fallback (false)
    pub fn verbose_or_default(&self) -> bool {
        self.verbose.unwrap_or(false)
    }
}
