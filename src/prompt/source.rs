//! Template sources - where the registry gets its raw records from
//!
//! A source only has to hand over `(identifier, structured data)` pairs. Each
//! entry carries its own read/parse outcome so one broken file never hides the
//! rest of a directory.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{PromptError, Result};

/// File suffixes recognized as prompt definitions, most specific first
pub const PROMPT_SUFFIXES: &[&str] = &[".prompt.json", ".prompt.yaml", ".prompt.yml"];

/// One raw entry produced by a source
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub id: String,
    pub raw: std::result::Result<Value, String>,
}

impl SourceEntry {
    pub fn parsed(id: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            raw: Ok(value),
        }
    }

    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw: Err(reason.into()),
        }
    }
}

/// Supplies raw template entries to the registry
pub trait TemplateSource {
    /// Enumerate all entries; per-entry failures are reported inside the entries
    fn entries(&self) -> Result<Vec<SourceEntry>>;
}

/// Loads every `*.prompt.{json,yaml,yml}` file in a directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Identifier for a prompt file: its file name without the prompt suffix
    pub fn prompt_id(path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        PROMPT_SUFFIXES
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .filter(|stem| !stem.is_empty())
            .map(str::to_string)
    }

    fn read_entry(path: &Path) -> std::result::Result<Value, String> {
        let content = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json {
            serde_json::from_str(&content).map_err(|e| format!("invalid JSON: {}", e))
        } else {
            serde_yaml::from_str(&content).map_err(|e| format!("invalid YAML: {}", e))
        }
    }
}

impl TemplateSource for DirectorySource {
    fn entries(&self) -> Result<Vec<SourceEntry>> {
        if !self.dir.is_dir() {
            return Err(PromptError::Source(format!(
                "prompts directory not found: {}",
                self.dir.display()
            )));
        }

        let base = glob::Pattern::escape(&self.dir.to_string_lossy());
        let mut paths = Vec::new();
        for suffix in PROMPT_SUFFIXES {
            let pattern = format!("{}/*{}", base, suffix);
            let matches = glob::glob(&pattern).map_err(|e| PromptError::Source(format!("bad pattern {}: {}", pattern, e)))?;
            for entry in matches {
                match entry {
                    Ok(path) => paths.push(path),
                    Err(e) => log::warn!("Skipping unreadable path: {}", e),
                }
            }
        }
        paths.sort();

        let entries = paths
            .iter()
            .filter_map(|path| {
                let id = Self::prompt_id(path)?;
                Some(SourceEntry {
                    id,
                    raw: Self::read_entry(path),
                })
            })
            .collect();
        Ok(entries)
    }
}

/// A fixed, in-memory list of entries
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: Vec<SourceEntry>,
}

impl StaticSource {
    pub fn new(entries: Vec<SourceEntry>) -> Self {
        Self { entries }
    }

    pub fn with(mut self, id: impl Into<String>, value: Value) -> Self {
        self.entries.push(SourceEntry::parsed(id, value));
        self
    }
}

impl TemplateSource for StaticSource {
    fn entries(&self) -> Result<Vec<SourceEntry>> {
        Ok(self.entries.clone())
    }
}
