//! Generic structural JSON diff.
//!
//! Compares the remote payload (previous state) against the declared
//! payload (next state) and reports every leaf-level difference with a
//! dotted path. Arrays are compared by index.

use serde_json::Value;

/// The kind of change a diff entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    /// Present in the declared payload but not the remote.
    Added,
    /// Present in the remote payload but not the declared.
    Removed,
    /// Present in both with different values.
    Changed,
}

impl DiffKind {
    /// Single-character prefix used when rendering plans.
    #[must_use]
    pub const fn sigil(self) -> char {
        match self {
            Self::Added => '+',
            Self::Removed => '-',
            Self::Changed => '~',
        }
    }
}

/// One leaf-level difference between remote and declared state.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    /// Kind of change.
    pub kind: DiffKind,
    /// Dotted path to the differing value, e.g. `options.thresholds[0].target`.
    pub path: String,
    /// Remote value, absent for additions.
    pub previous: Option<Value>,
    /// Declared value, absent for removals.
    pub next: Option<Value>,
}

/// Diffs `actual` (remote state) against `expected` (declared state).
///
/// Entries are ordered by the declared payload's key order first, then by
/// remote-only keys, so output is stable across runs.
#[must_use]
pub fn diff_values(actual: &Value, expected: &Value) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    diff_inner(actual, expected, "", &mut entries);
    entries
}

fn diff_inner(actual: &Value, expected: &Value, path: &str, entries: &mut Vec<DiffEntry>) {
    match (actual, expected) {
        (Value::Object(prev), Value::Object(next)) => {
            for (key, next_value) in next {
                let child = join_key(path, key);
                match prev.get(key) {
                    Some(prev_value) => diff_inner(prev_value, next_value, &child, entries),
                    None => entries.push(DiffEntry {
                        kind: DiffKind::Added,
                        path: child,
                        previous: None,
                        next: Some(next_value.clone()),
                    }),
                }
            }
            for (key, prev_value) in prev {
                if !next.contains_key(key) {
                    entries.push(DiffEntry {
                        kind: DiffKind::Removed,
                        path: join_key(path, key),
                        previous: Some(prev_value.clone()),
                        next: None,
                    });
                }
            }
        }
        (Value::Array(prev), Value::Array(next)) => {
            for (index, pair) in next.iter().enumerate().take(prev.len()) {
                diff_inner(&prev[index], pair, &join_index(path, index), entries);
            }
            for (index, next_value) in next.iter().enumerate().skip(prev.len()) {
                entries.push(DiffEntry {
                    kind: DiffKind::Added,
                    path: join_index(path, index),
                    previous: None,
                    next: Some(next_value.clone()),
                });
            }
            for (index, prev_value) in prev.iter().enumerate().skip(next.len()) {
                entries.push(DiffEntry {
                    kind: DiffKind::Removed,
                    path: join_index(path, index),
                    previous: Some(prev_value.clone()),
                    next: None,
                });
            }
        }
        (prev, next) => {
            if prev != next {
                entries.push(DiffEntry {
                    kind: DiffKind::Changed,
                    path: path.to_string(),
                    previous: Some(prev.clone()),
                    next: Some(next.clone()),
                });
            }
        }
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn join_index(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_values_produce_no_entries() {
        let value = json!({"a": 1, "b": [1, 2], "c": {"d": null}});
        assert!(diff_values(&value, &value).is_empty());
    }

    #[test]
    fn changed_added_and_removed_keys_are_all_reported() {
        let actual = json!({"foo": "baz", "baz": "foo"});
        let expected = json!({"foo": "bar", "bar": "foo"});
        let entries = diff_values(&actual, &expected);

        assert_eq!(entries.len(), 3);
        assert!(entries.contains(&DiffEntry {
            kind: DiffKind::Changed,
            path: "foo".to_string(),
            previous: Some(json!("baz")),
            next: Some(json!("bar")),
        }));
        assert!(entries.contains(&DiffEntry {
            kind: DiffKind::Added,
            path: "bar".to_string(),
            previous: None,
            next: Some(json!("foo")),
        }));
        assert!(entries.contains(&DiffEntry {
            kind: DiffKind::Removed,
            path: "baz".to_string(),
            previous: Some(json!("foo")),
            next: None,
        }));
    }

    #[test]
    fn nested_paths_use_dots_and_indexes() {
        let actual = json!({"options": {"thresholds": [{"target": 99.0}]}});
        let expected = json!({"options": {"thresholds": [{"target": 99.9}]}});
        let entries = diff_values(&actual, &expected);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "options.thresholds[0].target");
        assert_eq!(entries[0].kind, DiffKind::Changed);
    }

    #[test]
    fn array_length_changes_report_tail_elements() {
        let actual = json!({"tags": ["a", "b", "c"]});
        let expected = json!({"tags": ["a"]});
        let entries = diff_values(&actual, &expected);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "tags[1]");
        assert_eq!(entries[0].kind, DiffKind::Removed);
        assert_eq!(entries[1].path, "tags[2]");
    }

    #[test]
    fn type_changes_are_a_single_change() {
        let actual = json!({"a": {"nested": true}});
        let expected = json!({"a": [1]});
        let entries = diff_values(&actual, &expected);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "a");
        assert_eq!(entries[0].kind, DiffKind::Changed);
    }

    #[test]
    fn null_and_absent_are_distinct() {
        let actual = json!({"a": null});
        let expected = json!({});
        let entries = diff_values(&actual, &expected);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, DiffKind::Removed);
        assert_eq!(entries[0].previous, Some(Value::Null));
    }
}
