//! Correlating impacted lines with declarations in one syntax tree

use std::collections::{BTreeMap, BTreeSet};

use crate::syntax::{NodeKind, SyntaxTree};

use super::fields::references_field;
use super::types::{push_unique, ClassImpact, FieldImpact, ImpactRecord};

fn any_in(lines: &BTreeSet<u32>, start: u32, end: u32) -> bool {
    start <= end && lines.range(start..=end).next().is_some()
}

/// Build the [`ImpactRecord`] for one file.
///
/// `lines` are the impacted new-revision lines of the file and `file_stem`
/// its name without extension, which stands in for the class name when a
/// constructor is not marked as such. Declarations without a position are
/// left out of the record.
pub fn correlate(tree: &SyntaxTree, lines: &BTreeSet<u32>, file_stem: &str) -> ImpactRecord {
    let mut record = ImpactRecord::default();
    if lines.is_empty() {
        return record;
    }

    // Fields first: methods are pulled in by referencing them.
    let mut changed_fields: BTreeMap<String, FieldImpact> = BTreeMap::new();
    for (id, field) in tree.fields() {
        let Some(span) = tree.span(id) else {
            tracing::debug!(names = ?field.names, "Field without position, skipping");
            continue;
        };
        if any_in(lines, span.start, span.end) {
            for name in &field.names {
                changed_fields.insert(name.clone(), FieldImpact::Low);
            }
        }
    }

    let class_names: BTreeSet<&str> = tree.classes().map(|(_, c)| c.name.as_str()).collect();

    for (id, method) in tree.methods() {
        let Some(span) = tree.span(id) else {
            tracing::debug!(method = method.name.as_str(), "Method without position, skipping");
            continue;
        };

        let signature_impacted = lines.contains(&span.start);
        let body_impacted = any_in(lines, span.start.saturating_add(1), span.end);

        let body = tree.body_statements(method.body);
        let mut references_changed_field = false;
        for (name, level) in changed_fields.iter_mut() {
            if references_field(tree, name, &body) {
                *level = FieldImpact::High;
                references_changed_field = true;
            }
        }

        if !(signature_impacted || body_impacted || references_changed_field) {
            continue;
        }

        let is_constructor = method.is_constructor
            || class_names.contains(method.name.as_str())
            || method.name == file_stem;
        if is_constructor {
            if !record.impacted_methods.contains(&method.name) {
                push_unique(&mut record.impacted_constructors, &method.name);
            }
        } else if !record.impacted_constructors.contains(&method.name) {
            push_unique(&mut record.impacted_methods, &method.name);
        }

        if signature_impacted {
            for exception in &method.throws {
                push_unique(&mut record.impacted_exceptions, exception);
            }
        }
    }

    for (id, class) in tree.classes() {
        let Some(span) = tree.span(id) else {
            tracing::debug!(class = class.name.as_str(), "Class without position, skipping");
            continue;
        };
        let end = class
            .members
            .iter()
            .filter_map(|&m| tree.span(m))
            .map(|s| s.end)
            .max()
            .unwrap_or(span.start);
        if !any_in(lines, span.start, end.max(span.start)) {
            continue;
        }

        let mut impact = ClassImpact::default();
        if lines.contains(&span.start) {
            impact.inheritance_changed = !class.extends.is_empty() || !class.implements.is_empty();
            impact.modifiers_changed = !class.modifiers.is_empty();
        }
        record.impacted_classes.insert(class.name.clone(), impact);
    }

    for (_, node) in tree.iter() {
        match &node.kind {
            NodeKind::Annotation { name } => {
                if node.line().is_some_and(|l| lines.contains(&l)) {
                    push_unique(&mut record.impacted_annotations, name);
                }
            }
            NodeKind::Initializer { is_static, .. } => {
                let Some(span) = node.span else {
                    continue;
                };
                if !any_in(lines, span.start, span.end) {
                    continue;
                }
                if *is_static {
                    push_unique(
                        &mut record.impacted_static_blocks,
                        &format!("static_block_{}", span.start),
                    );
                } else {
                    push_unique(
                        &mut record.impacted_instance_blocks,
                        &format!("instance_block_{}", span.start),
                    );
                }
            }
            _ => {}
        }
    }

    record.impacted_fields = changed_fields;
    record
}
