//! Output and display functions for CLI results

use std::collections::BTreeMap;

use colored::Colorize;

use jade::impact::{ChangeAnalysis, FileAnalysis};
use jade::resolve::{all_tests, MethodImpact};

/// Print changed methods with the tests reaching each
pub fn display_impacts(impacts: &[MethodImpact]) {
    if impacts.is_empty() {
        println!("{}", "No changed methods.".dimmed());
        return;
    }

    println!("{}", "Changed methods and impacted tests:".bold());
    for impact in impacts {
        println!();
        if impact.tests.is_empty() {
            println!("{} {}", impact.method.cyan(), "(no tests)".dimmed());
            continue;
        }
        println!("{}", impact.method.cyan());
        for test in &impact.tests {
            println!("  {}", test);
        }
    }

    let tests = all_tests(impacts);
    println!();
    println!(
        "{} changed, {} impacted tests",
        impacts.len(),
        tests.len().to_string().bold()
    );
}

/// Print only the distinct impacted tests, one per line
pub fn display_tests_only(impacts: &[MethodImpact]) {
    let tests = all_tests(impacts);
    if tests.is_empty() {
        eprintln!("{}", "No impacted tests.".dimmed());
        return;
    }
    for test in tests {
        println!("{}", test);
    }
}

/// Print pass/fail per executed test and a summary line
pub fn display_test_results(results: &BTreeMap<String, bool>) {
    println!();
    println!("{}", "Test results:".bold());
    for (test, passed) in results {
        let status = if *passed {
            "PASSED".green()
        } else {
            "FAILED".red()
        };
        println!("  {}: {}", test, status);
    }
    let passed = results.values().filter(|p| **p).count();
    let failed = results.len() - passed;
    let summary = format!("{} passed, {} failed", passed, failed);
    if failed > 0 {
        println!("\n{}", summary.red());
    } else {
        println!("\n{}", summary.green());
    }
}

/// Explain a change analysis that produced no method list
pub fn display_change_status(change: &ChangeAnalysis) {
    match change {
        ChangeAnalysis::NoChangesDetected => {
            println!("{}", "No changed methods detected.".dimmed());
        }
        ChangeAnalysis::AnalysisFailed { reason } => {
            eprintln!("{} {}", "Analysis failed:".red(), reason);
        }
        ChangeAnalysis::Changes { methods } => {
            println!("{} changed methods", methods.len());
        }
    }
}

/// Full JSON report
pub fn report_to_json(
    change: &ChangeAnalysis,
    analysis: Option<&FileAnalysis>,
    impacts: &[MethodImpact],
    results: Option<&BTreeMap<String, bool>>,
) -> serde_json::Value {
    let mut report = serde_json::json!({
        "change": change,
        "impacts": impacts,
        "tests": all_tests(impacts),
    });
    if let Some(analysis) = analysis {
        let records: serde_json::Map<String, serde_json::Value> = analysis
            .records
            .iter()
            .filter(|(_, r)| !r.is_empty())
            .map(|(path, r)| {
                (
                    path.to_string_lossy().replace('\\', "/"),
                    serde_json::to_value(r).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();
        report["files"] = serde_json::Value::Object(records);
        let failures: Vec<serde_json::Value> = analysis
            .failures
            .iter()
            .map(|(path, err)| serde_json::json!({ "file": path.to_string_lossy(), "error": err }))
            .collect();
        report["failures"] = serde_json::Value::Array(failures);
    }
    if let Some(results) = results {
        report["results"] = serde_json::json!(results);
    }
    report
}
