//! Persistent, section-keyed config store.
//!
//! Every operation re-reads the backing file, so edits made by another
//! process between two calls are always observed. Writes rewrite the whole
//! file through a temporary sibling that is renamed into place, which leaves
//! either the old or the new file on disk, never a partial one.

pub mod ini;

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

pub use ini::{IniDocument, IniSection};

use crate::error::AppError;

pub const CONFIG_SECTION: &str = "CONFIG";
pub const SESSION_SECTION: &str = "DB_SESSION";
pub const SOURCES_SECTION: &str = "VERSION_SOURCES";

/// Entries to merge into one section.
pub type SectionUpdate = Vec<(String, String)>;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of `section.key`; `ConfigIncomplete` if either is absent.
    pub fn get(&self, section: &str, key: &str) -> Result<String, AppError> {
        let doc = self.load()?;
        doc.section(section)
            .ok_or_else(|| AppError::missing_section(section))?
            .get(key)
            .map(str::to_string)
            .ok_or_else(|| AppError::missing_key(section, key))
    }

    /// Fallback lookup: absence yields `None` instead of failing.
    pub fn get_opt(&self, section: &str, key: &str) -> Result<Option<String>, AppError> {
        let doc = self.load()?;
        Ok(doc
            .section(section)
            .and_then(|s| s.get(key))
            .map(str::to_string))
    }

    /// Whole section; `ConfigIncomplete` if it does not exist.
    pub fn section(&self, section: &str) -> Result<IniSection, AppError> {
        self.section_opt(section)?
            .ok_or_else(|| AppError::missing_section(section))
    }

    pub fn section_opt(&self, section: &str) -> Result<Option<IniSection>, AppError> {
        Ok(self.load()?.section(section).cloned())
    }

    /// Merge each section's entries into the store. Keys not mentioned keep
    /// their current values; sections not mentioned are untouched.
    pub fn write<I, S>(&self, updates: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = (S, SectionUpdate)>,
        S: AsRef<str>,
    {
        let mut doc = self.load()?;
        for (section, entries) in updates {
            let section = section.as_ref();
            validate_section_name(section)?;
            let target = doc.section_mut(section);
            for (key, value) in entries {
                validate_entry(section, &key, &value)?;
                target.set(key, value);
            }
        }
        self.persist(&doc)
    }

    /// Replace a section's body entirely (no merge with previous keys).
    pub fn replace_section(&self, section: &str, entries: SectionUpdate) -> Result<(), AppError> {
        validate_section_name(section)?;
        for (key, value) in &entries {
            validate_entry(section, key, value)?;
        }
        let mut doc = self.load()?;
        let target = doc.section_mut(section);
        target.entries = entries;
        self.persist(&doc)
    }

    /// Entries of `section` in file order; empty when the section is absent.
    pub fn list_items(&self, section: &str) -> Result<Vec<(String, String)>, AppError> {
        Ok(self
            .load()?
            .section(section)
            .map(|s| s.entries.clone())
            .unwrap_or_default())
    }

    /// Drop a single key from a section; no-op when absent.
    pub fn remove_key(&self, section: &str, key: &str) -> Result<bool, AppError> {
        let mut doc = self.load()?;
        let Some(existing) = doc.section(section) else {
            return Ok(false);
        };
        if !existing.contains_key(key) {
            return Ok(false);
        }
        doc.section_mut(section).entries.retain(|(k, _)| k != key);
        self.persist(&doc)?;
        Ok(true)
    }

    /// Delete `section` if present.
    pub fn remove(&self, section: &str) -> Result<(), AppError> {
        let mut doc = self.load()?;
        if doc.remove_section(section) {
            self.persist(&doc)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<IniDocument, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => IniDocument::parse(&contents),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(IniDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, doc: &IniDocument) -> Result<(), AppError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(doc.render().as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), "config store rewritten");
        Ok(())
    }
}

fn validate_section_name(section: &str) -> Result<(), AppError> {
    if section.trim().is_empty() || section.contains([']', '\n', '\r']) {
        return Err(AppError::InvalidValue {
            section: section.to_string(),
            key: String::new(),
            value: section.to_string(),
        });
    }
    Ok(())
}

fn validate_entry(section: &str, key: &str, value: &str) -> Result<(), AppError> {
    let bad_key = key.trim().is_empty()
        || key.trim() != key
        || key.starts_with(['[', ';', '#'])
        || key.contains(['=', '\n', '\r']);
    let bad_value = value.contains(['\n', '\r']) || value.trim() != value;
    if bad_key || bad_value {
        return Err(AppError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}
