//! Set and list helpers for attribute values

use std::collections::HashSet;

use awsutils_core::resource::Value;

/// Strings held by a set or list attribute, duplicates and empty strings
/// dropped, in first-seen order.
pub fn string_set(value: Option<&Value>) -> Vec<String> {
    let mut seen = HashSet::new();
    value
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty() && seen.insert(*s))
        .map(str::to_string)
        .collect()
}

/// Elements of `items` not present in `other`, first-seen order, no duplicates
pub fn difference(items: &[String], other: &[String]) -> Vec<String> {
    let other: HashSet<&str> = other.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|s| !other.contains(s.as_str()) && seen.insert(s.as_str()))
        .cloned()
        .collect()
}

/// Membership change between two sets of account ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipChange {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl MembershipChange {
    pub fn compute(old: &[String], new: &[String]) -> Self {
        Self {
            to_add: difference(new, old),
            to_remove: difference(old, new),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
