//! Structural checks on a version source before it is applied.

use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use super::document::{compare_versions, is_well_formed_version, statements};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Critical,
    High,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Low => "LOW",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Issue {
    pub severity: Severity,
    pub path: String,
    pub message: String,
}

impl Issue {
    fn new(severity: Severity, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// All problems found, most severe first. Empty means the source is usable.
pub fn verify(source: &Value) -> Vec<Issue> {
    let mut issues = Vec::new();

    let Some(root) = source.as_object() else {
        issues.push(Issue::new(Severity::Critical, "", "version source must be a JSON object"));
        return issues;
    };

    match root.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => {}
        _ => issues.push(Issue::new(Severity::Critical, "name", "missing template name")),
    }

    let Some(versions) = root.get("version").and_then(Value::as_array) else {
        issues.push(Issue::new(Severity::Critical, "version", "missing version list"));
        issues.sort();
        return issues;
    };

    let mut seen = HashSet::new();
    let mut previous: Option<&str> = None;
    for (idx, entry) in versions.iter().enumerate() {
        let path = format!("version[{idx}]");
        if !entry.is_object() {
            issues.push(Issue::new(Severity::Critical, &path, "version entry must be an object"));
            continue;
        }

        match entry.get("_id").and_then(Value::as_str) {
            None => issues.push(Issue::new(Severity::Critical, format!("{path}._id"), "missing version id")),
            Some(id) => {
                if !is_well_formed_version(id) {
                    issues.push(Issue::new(
                        Severity::High,
                        format!("{path}._id"),
                        format!("version id {id:?} is not a dotted number"),
                    ));
                }
                if !seen.insert(id) {
                    issues.push(Issue::new(
                        Severity::High,
                        format!("{path}._id"),
                        format!("duplicate version id {id:?}"),
                    ));
                }
                if let Some(prev) = previous
                    && compare_versions(id, prev) != Ordering::Greater
                {
                    issues.push(Issue::new(
                        Severity::High,
                        format!("{path}._id"),
                        format!("version {id:?} does not come after {prev:?}"),
                    ));
                }
                previous = Some(id);
            }
        }

        let mut has_work = false;
        for key in ["sql", "default_data"] {
            match statements(entry.get(key)) {
                Ok(stmts) => has_work |= !stmts.is_empty(),
                Err(e) => issues.push(Issue::new(Severity::High, format!("{path}.{key}"), e)),
            }
        }
        if !has_work {
            issues.push(Issue::new(Severity::Low, &path, "version has nothing to apply"));
        }
    }

    issues.sort();
    issues
}
