//! Version source document understood by the built-in engine.
//!
//! ```json
//! {
//!   "name": "shop",
//!   "version": [
//!     { "_id": "0.1.0", "sql": ["CREATE TABLE ..."], "default_data": ["INSERT ..."] }
//!   ]
//! }
//! ```
//! `sql` and `default_data` accept a single string or an array of strings.

use serde_json::Value;
use std::cmp::Ordering;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub id: String,
    pub sql: Vec<String>,
    pub default_data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDocument {
    pub name: String,
    pub versions: Vec<VersionEntry>,
}

impl VersionDocument {
    pub fn from_json(value: &Value) -> Result<Self, AppError> {
        let invalid = |msg: String| AppError::InvalidVersionSource(msg);

        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing template name".to_string()))?
            .to_string();
        let raw_versions = value
            .get("version")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("missing version list".to_string()))?;

        let mut versions = Vec::with_capacity(raw_versions.len());
        for (idx, entry) in raw_versions.iter().enumerate() {
            let id = entry
                .get("_id")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(format!("version[{idx}] has no _id")))?
                .to_string();
            let sql = statements(entry.get("sql"))
                .map_err(|e| invalid(format!("version[{idx}].sql {e}")))?;
            let default_data = statements(entry.get("default_data"))
                .map_err(|e| invalid(format!("version[{idx}].default_data {e}")))?;
            versions.push(VersionEntry {
                id,
                sql,
                default_data,
            });
        }

        Ok(Self { name, versions })
    }

    /// Entries newer than `current`, oldest first.
    pub fn pending_after(&self, current: Option<&str>) -> Vec<&VersionEntry> {
        let mut pending: Vec<&VersionEntry> = self
            .versions
            .iter()
            .filter(|v| current.is_none_or(|cur| compare_versions(&v.id, cur) == Ordering::Greater))
            .collect();
        pending.sort_by(|a, b| compare_versions(&a.id, &b.id));
        pending
    }
}

pub(crate) fn statements(value: Option<&Value>) -> Result<Vec<String>, String> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| "must only contain strings".to_string())
            })
            .collect(),
        Some(_) => Err("must be a string or an array of strings".to_string()),
    }
}

/// Dotted numeric comparison: `0.10.0 > 0.9.1`, missing parts count as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |s: &str| -> Vec<u64> {
        s.split('.')
            .map(|part| part.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };
    let (pa, pb) = (parse(a), parse(b));
    let len = pa.len().max(pb.len());
    (0..len)
        .map(|i| {
            let x = pa.get(i).copied().unwrap_or(0);
            let y = pb.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// True when every dot-separated part of `id` is numeric.
pub fn is_well_formed_version(id: &str) -> bool {
    !id.is_empty()
        && id
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
