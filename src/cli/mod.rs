//! CLI implementation for jade

mod config;
mod display;

pub(crate) use config::apply_config_defaults;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;

use jade::call_graph::{build_from_dir, CallGraph, GraphError};
use jade::config::Config;
use jade::impact::{analyze_files, ChangeAnalysis, FileAnalysis};
use jade::parser::JavaParser;
use jade::resolve::{all_tests, resolve, MethodImpact};
use jade::runner::{BuildTool, TestRunner};
use jade::{diff_parse, git};

/// Nothing to analyze: no Java files changed, or no test directory
pub const EXIT_NOTHING_TO_ANALYZE: u8 = 2;
/// Some of the tests run with --run-tests failed
pub const EXIT_TESTS_FAILED: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "jade")]
#[command(about = "Find the Java tests affected by a change")]
#[command(version)]
pub struct Cli {
    /// Compare HEAD to the Nth previous commit
    #[arg(short = 'c', long, value_name = "N")]
    commits_back: Option<usize>,

    /// Branch to compare (give twice to compare two branches)
    #[arg(long, value_name = "BRANCH")]
    branch: Vec<String>,

    /// Commit to compare (give twice to compare two commits)
    #[arg(long, value_name = "COMMIT")]
    commit: Vec<String>,

    /// Read a unified diff from a file ('-' for stdin) instead of running git
    #[arg(long, value_name = "PATH", conflicts_with_all = ["commits_back", "branch", "commit"])]
    diff_file: Option<PathBuf>,

    /// Java project directory
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Test source root (default: src/test/java under the project)
    #[arg(long)]
    test_dir: Option<PathBuf>,

    /// Build tool used by --run-tests: maven or gradle
    #[arg(long)]
    build_tool: Option<BuildTool>,

    /// Reuse a saved test-to-method mapping instead of parsing the tests
    #[arg(long, value_name = "FILE")]
    load_mapping: Option<PathBuf>,

    /// Save the test-to-method mapping
    #[arg(long, value_name = "FILE")]
    save_mapping: Option<PathBuf>,

    /// Only list impacted tests
    #[arg(long)]
    tests_only: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Run the impacted tests
    #[arg(long)]
    run_tests: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Diff text plus the files it covers, relative to the project directory
struct DiffInput {
    diff: String,
    files: Vec<PathBuf>,
}

fn read_diff_file(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read diff from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn collect_diff(cli: &Cli) -> Result<DiffInput> {
    let _span = tracing::info_span!("collect_diff").entered();

    if let Some(path) = &cli.diff_file {
        let diff = read_diff_file(path)?;
        let files = diff_parse::changed_files(&diff)
            .into_iter()
            .map(PathBuf::from)
            .collect();
        return Ok(DiffInput { diff, files });
    }

    if cli.branch.len() > 2 {
        bail!("--branch can be given at most twice");
    }
    if cli.commit.len() > 2 {
        bail!("--commit can be given at most twice");
    }

    let root = &cli.project_dir;
    let (base, target) = git::comparison_revisions(cli.commits_back, &cli.branch, &cli.commit);
    let base = git::resolve_revision(root, &base)?;
    let target = git::resolve_revision(root, &target)?;
    tracing::info!(base = base.as_str(), target = target.as_str(), "Comparing revisions");

    let diff = git::diff(root, &base, &target)?;
    let files = git::affected_files(root, &base, &target)?;
    Ok(DiffInput { diff, files })
}

fn load_graph(cli: &Cli, test_dir: &Path, markers: &[String], parser: &JavaParser) -> Result<Option<CallGraph>> {
    if let Some(path) = &cli.load_mapping {
        let graph = CallGraph::load_from_file(path)
            .with_context(|| format!("Failed to load mapping {}", path.display()))?;
        return Ok(Some(graph));
    }
    match build_from_dir(test_dir, parser, markers) {
        Ok(graph) => Ok(Some(graph)),
        Err(GraphError::MissingTestDir(dir)) => {
            tracing::warn!(dir = dir.as_str(), "Test directory not found");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn emit(
    cli: &Cli,
    change: &ChangeAnalysis,
    analysis: Option<&FileAnalysis>,
    impacts: &[MethodImpact],
) {
    if cli.json {
        // --run-tests prints the full report once results are in
        if !cli.run_tests {
            let json = if cli.tests_only {
                serde_json::json!({ "tests": all_tests(impacts) })
            } else {
                display::report_to_json(change, analysis, impacts, None)
            };
            println!("{}", json);
        }
    } else if cli.tests_only {
        display::display_tests_only(impacts);
    } else {
        display::display_impacts(impacts);
    }
}

/// Run the analysis pipeline with already-parsed and config-merged options
pub fn run_with(cli: Cli, config: &Config) -> Result<ExitCode> {
    let input = collect_diff(&cli)?;

    let java_files: Vec<PathBuf> = input
        .files
        .into_iter()
        .filter(|f| f.extension().is_some_and(|e| e == "java"))
        .collect();
    if java_files.is_empty() {
        tracing::warn!("No Java files changed");
        if cli.json {
            println!("{}", display::report_to_json(&ChangeAnalysis::NoChangesDetected, None, &[], None));
        } else {
            eprintln!("Nothing to analyze: no Java files changed.");
        }
        return Ok(ExitCode::from(EXIT_NOTHING_TO_ANALYZE));
    }

    let parser = JavaParser::new();
    let analysis = analyze_files(&input.diff, &cli.project_dir, &java_files, &parser);
    let change = ChangeAnalysis::from_analysis(&analysis);

    let methods: Vec<String> = match &change {
        ChangeAnalysis::AnalysisFailed { reason } => {
            if cli.json {
                println!("{}", display::report_to_json(&change, Some(&analysis), &[], None));
            } else {
                display::display_change_status(&change);
            }
            bail!("Change analysis failed: {}", reason);
        }
        ChangeAnalysis::NoChangesDetected => Vec::new(),
        ChangeAnalysis::Changes { methods } => methods.clone(),
    };

    if methods.is_empty() && cli.save_mapping.is_none() {
        if cli.json {
            println!("{}", display::report_to_json(&change, Some(&analysis), &[], None));
        } else {
            display::display_change_status(&change);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let test_dir = cli
        .test_dir
        .clone()
        .unwrap_or_else(|| config.test_dir_or_default(&cli.project_dir));
    let markers = config.test_annotations_or_default();
    let Some(graph) = load_graph(&cli, &test_dir, &markers, &parser)? else {
        eprintln!("Nothing to analyze: test directory {} not found.", test_dir.display());
        return Ok(ExitCode::from(EXIT_NOTHING_TO_ANALYZE));
    };

    if let Some(path) = &cli.save_mapping {
        graph
            .save_to_file(path)
            .with_context(|| format!("Failed to save mapping {}", path.display()))?;
    }

    let impacts = resolve(&graph, &methods);
    emit(&cli, &change, Some(&analysis), &impacts);

    if !cli.run_tests {
        return Ok(ExitCode::SUCCESS);
    }

    let tests = all_tests(&impacts);
    if tests.is_empty() {
        tracing::warn!("No tests to run");
        if cli.json {
            println!("{}", display::report_to_json(&change, Some(&analysis), &impacts, None));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let tool = cli.build_tool.unwrap_or_else(|| config.build_tool_or_default());
    let runner = TestRunner::new(&cli.project_dir, &test_dir, tool);
    let results = runner.run(&tests);

    if cli.json {
        println!(
            "{}",
            display::report_to_json(&change, Some(&analysis), &impacts, Some(&results))
        );
    } else {
        display::display_test_results(&results);
    }

    if results.values().all(|passed| *passed) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_TESTS_FAILED))
    }
}
