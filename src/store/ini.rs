//! Minimal INI codec for the session store.
//!
//! Layout:
//! - `[Section]` headers, case-sensitive
//! - `key = value` entries; the value is everything after the first `=`, trimmed
//! - blank lines and lines starting with `;` or `#` are ignored
//!
//! Inline comments are not recognized: URLs and paths may legitimately
//! contain `;` or `#`.

use crate::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl IniSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replace the value for `key`, or append it while keeping insertion order.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

/// Ordered set of sections as they appear in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

impl IniDocument {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let mut doc = IniDocument::default();
        let mut current: Option<usize> = None;

        for (idx, raw) in input.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let name = rest.strip_suffix(']').ok_or_else(|| AppError::StoreParse {
                    line: line_no,
                    reason: "unterminated section header".to_string(),
                })?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(AppError::StoreParse {
                        line: line_no,
                        reason: "empty section name".to_string(),
                    });
                }
                current = Some(doc.section_index_or_insert(name));
                continue;
            }

            let Some(section_idx) = current else {
                return Err(AppError::StoreParse {
                    line: line_no,
                    reason: "entry outside of any section".to_string(),
                });
            };
            let (key, value) = line.split_once('=').ok_or_else(|| AppError::StoreParse {
                line: line_no,
                reason: "expected `key = value`".to_string(),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(AppError::StoreParse {
                    line: line_no,
                    reason: "empty key".to_string(),
                });
            }
            doc.sections[section_idx].set(key, value.trim());
        }

        Ok(doc)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for (key, value) in &section.entries {
                out.push_str(key);
                out.push_str(" = ");
                out.push_str(value);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> &mut IniSection {
        let idx = self.section_index_or_insert(name);
        &mut self.sections[idx]
    }

    /// Returns true when a section was actually removed.
    pub fn remove_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != name);
        before != self.sections.len()
    }

    fn section_index_or_insert(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(IniSection::new(name));
                self.sections.len() - 1
            }
        }
    }
}
