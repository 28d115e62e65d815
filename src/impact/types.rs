//! Data types for impact analysis

use std::collections::BTreeMap;

/// How strongly a changed field affects the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldImpact {
    /// Declaration changed, no method in the file reads or writes it
    Low,
    /// Declaration changed and at least one method references it
    High,
}

/// What happened to an impacted class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    #[default]
    Modified,
}

/// Per-class flags.
///
/// `inheritance_changed` and `modifiers_changed` mean "the header line
/// changed and the class has an extends/implements clause (or modifiers)",
/// not that those particular tokens differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct ClassImpact {
    pub change_kind: ChangeKind,
    pub inheritance_changed: bool,
    pub modifiers_changed: bool,
}

/// Everything a diff touches in one file.
///
/// The `Vec` fields keep first-seen order and hold no duplicates. A name is
/// never in both `impacted_methods` and `impacted_constructors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImpactRecord {
    pub impacted_methods: Vec<String>,
    pub impacted_constructors: Vec<String>,
    pub impacted_fields: BTreeMap<String, FieldImpact>,
    pub impacted_classes: BTreeMap<String, ClassImpact>,
    pub impacted_annotations: Vec<String>,
    pub impacted_static_blocks: Vec<String>,
    pub impacted_instance_blocks: Vec<String>,
    pub impacted_exceptions: Vec<String>,
}

impl ImpactRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Impacted methods followed by impacted constructors
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.impacted_methods
            .iter()
            .chain(&self.impacted_constructors)
            .map(String::as_str)
    }
}

/// Append `name` unless already present
pub(crate) fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}
