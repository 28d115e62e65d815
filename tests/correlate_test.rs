//! End-to-end impact analysis over the Java fixtures

use std::path::{Path, PathBuf};

use jade::impact::{analyze_file, analyze_files, changed_method_names, FieldImpact};
use jade::{ChangeAnalysis, JavaParser};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/java/changes")
}

/// One-line replacement at `line` of `file`
fn edit(file: &str, line: u32) -> String {
    edit_lines(file, &[line])
}

/// A single file section with one one-line hunk per entry of `lines`
fn edit_lines(file: &str, lines: &[u32]) -> String {
    let mut diff = format!(
        "diff --git a/{file} b/{file}\n\
         index 1111111..2222222 100644\n\
         --- a/{file}\n\
         +++ b/{file}\n"
    );
    for line in lines {
        diff.push_str(&format!("@@ -{line} +{line} @@\n-old\n+new\n"));
    }
    diff
}

#[test]
fn test_changed_field_pulls_in_referencing_method() {
    let diff = edit("FieldImpact.java", 2);
    let record = analyze_file(&diff, &fixtures(), Path::new("FieldImpact.java"), &JavaParser::new()).unwrap();

    assert_eq!(record.impacted_fields.len(), 1);
    assert_eq!(record.impacted_fields["field1"], FieldImpact::High);
    assert_eq!(record.impacted_methods, vec!["method3"]);
    assert!(record.impacted_constructors.is_empty());

    let class = record.impacted_classes["FieldImpact"];
    assert!(!class.inheritance_changed);
    assert!(!class.modifiers_changed);
}

#[test]
fn test_constructor_body_change() {
    let diff = edit("Constructor.java", 5);
    let record = analyze_file(&diff, &fixtures(), Path::new("Constructor.java"), &JavaParser::new()).unwrap();

    assert_eq!(record.impacted_constructors, vec!["Constructor"]);
    assert!(record.impacted_methods.is_empty());
    assert!(record.impacted_fields.is_empty());
}

#[test]
fn test_class_header_change() {
    let diff = edit("ChildClass.java", 1);
    let record = analyze_file(&diff, &fixtures(), Path::new("ChildClass.java"), &JavaParser::new()).unwrap();

    let class = record.impacted_classes["ChildClass"];
    assert!(class.inheritance_changed);
    assert!(!class.modifiers_changed);
    assert!(record.impacted_methods.is_empty());
}

#[test]
fn test_signature_change_lists_exceptions() {
    let diff = edit("RiskyService.java", 5);
    let record = analyze_file(&diff, &fixtures(), Path::new("RiskyService.java"), &JavaParser::new()).unwrap();

    assert_eq!(record.impacted_methods, vec!["riskyMethod"]);
    assert_eq!(record.impacted_exceptions, vec!["IOException", "TimeoutException"]);
}

#[test]
fn test_unmentioned_file_is_not_parsed() {
    let diff = edit("Alpha.java", 9);
    // Not on disk; an empty record proves it was never read
    let record = analyze_file(&diff, &fixtures(), Path::new("Missing.java"), &JavaParser::new()).unwrap();
    assert!(record.is_empty());
}

#[test]
fn test_multiple_files_are_independent() {
    let diff = format!("{}{}", edit("Alpha.java", 9), edit_lines("Beta.java", &[5, 8]));
    let files = vec![PathBuf::from("Alpha.java"), PathBuf::from("Beta.java")];
    let analysis = analyze_files(&diff, &fixtures(), &files, &JavaParser::new());

    assert!(analysis.failures.is_empty());
    let alpha = &analysis.records[Path::new("Alpha.java")];
    assert_eq!(alpha.impacted_methods, vec!["second"]);
    assert!(alpha.impacted_static_blocks.is_empty());

    let beta = &analysis.records[Path::new("Beta.java")];
    assert!(beta.impacted_methods.is_empty());
    assert_eq!(beta.impacted_static_blocks, vec!["static_block_4"]);
    assert_eq!(beta.impacted_annotations, vec!["Deprecated"]);

    assert_eq!(changed_method_names(&analysis), vec!["Alpha.second"]);
}

#[test]
fn test_broken_file_does_not_hide_other_changes() {
    let diff = format!("{}{}", edit("Broken.java", 2), edit("Alpha.java", 5));
    let files = vec![PathBuf::from("Broken.java"), PathBuf::from("Alpha.java")];
    let analysis = analyze_files(&diff, &fixtures(), &files, &JavaParser::new());

    assert_eq!(analysis.failures.len(), 1);
    assert_eq!(analysis.failures[0].0, PathBuf::from("Broken.java"));
    assert_eq!(
        ChangeAnalysis::from_analysis(&analysis),
        ChangeAnalysis::Changes {
            methods: vec!["Alpha.first".to_string()]
        }
    );
}

#[test]
fn test_only_broken_file_is_a_failure() {
    let diff = edit("Broken.java", 2);
    let files = vec![PathBuf::from("Broken.java")];
    let analysis = analyze_files(&diff, &fixtures(), &files, &JavaParser::new());

    match ChangeAnalysis::from_analysis(&analysis) {
        ChangeAnalysis::AnalysisFailed { reason } => assert!(reason.contains("Broken.java")),
        other => panic!("expected AnalysisFailed, got {other:?}"),
    }
}

#[test]
fn test_change_outside_members_is_no_change() {
    // Line 1 of Alpha is the package declaration
    let diff = edit("Alpha.java", 1);
    let files = vec![PathBuf::from("Alpha.java")];
    let analysis = analyze_files(&diff, &fixtures(), &files, &JavaParser::new());

    assert!(analysis.failures.is_empty());
    assert_eq!(ChangeAnalysis::from_analysis(&analysis), ChangeAnalysis::NoChangesDetected);
}
