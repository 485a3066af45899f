//! Prompt Registry - immutable snapshot of every loaded template
//!
//! A [`PromptRegistry`] is built once from a [`TemplateSource`] and never
//! mutated afterwards, so any number of readers can share it through an `Arc`.
//! [`RegistryHandle`] adds reloading by building a new snapshot and swapping
//! the pointer; readers holding the old snapshot are unaffected.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use super::source::TemplateSource;
use super::template::{TemplateRecord, VariableDeclaration};
use crate::error::Result;

/// An entry that could not be loaded, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of building a registry from a source
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    /// Number of records that made it into the registry
    pub fn count(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, id: &str) -> bool {
        self.failures.iter().any(|f| f.id == id)
    }
}

/// Discovery view of one prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptSummary {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub variables: Vec<VariableDeclaration>,
}

/// Read-only map from prompt identifier to template record
#[derive(Debug, Default)]
pub struct PromptRegistry {
    records: BTreeMap<String, Arc<TemplateRecord>>,
}

impl PromptRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from every entry the source yields
    ///
    /// Each entry is parsed on its own; failures are logged, recorded in the
    /// report and skipped. Only a failure to enumerate the source aborts.
    pub fn load(source: &dyn TemplateSource) -> Result<(Self, LoadReport)> {
        let mut records = BTreeMap::new();
        let mut report = LoadReport::default();

        for entry in source.entries()? {
            let parsed = entry
                .raw
                .and_then(|value| TemplateRecord::from_value(entry.id.clone(), value).map_err(|e| e.to_string()));

            match parsed {
                Ok(_) if records.contains_key(&entry.id) => {
                    log::warn!("Duplicate prompt '{}' ignored", entry.id);
                    report.failures.push(LoadFailure {
                        id: entry.id,
                        reason: "duplicate identifier".to_string(),
                    });
                }
                Ok(record) => {
                    log::debug!("Loaded prompt: {}", entry.id);
                    report.loaded.push(entry.id.clone());
                    records.insert(entry.id, Arc::new(record));
                }
                Err(reason) => {
                    log::warn!("Error loading prompt {}: {}", entry.id, reason);
                    report.failures.push(LoadFailure { id: entry.id, reason });
                }
            }
        }

        log::info!(
            "Loaded {} prompts ({} failed)",
            report.count(),
            report.failures.len()
        );
        Ok((Self { records }, report))
    }

    /// Look up a record by identifier
    pub fn get(&self, id: &str) -> Option<Arc<TemplateRecord>> {
        self.records.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Summaries of all prompts, ordered by identifier
    pub fn list(&self) -> Vec<PromptSummary> {
        self.records
            .values()
            .map(|record| PromptSummary {
                id: record.id.clone(),
                title: record.title.clone(),
                description: record.description.clone(),
                variables: record.variables.clone(),
            })
            .collect()
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Shared, reloadable reference to the current registry snapshot
///
/// The lock only guards the pointer swap; lookups run against a cloned `Arc`.
#[derive(Debug, Default)]
pub struct RegistryHandle {
    current: RwLock<Arc<PromptRegistry>>,
}

impl RegistryHandle {
    pub fn new(registry: PromptRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// The snapshot in effect right now
    pub fn snapshot(&self) -> Arc<PromptRegistry> {
        match self.current.read() {
            Ok(guard) => (*guard).clone(),
            Err(poisoned) => (*poisoned.into_inner()).clone(),
        }
    }

    /// Build a fresh snapshot from `source` and swap it in
    ///
    /// The old snapshot stays in place if the source cannot be enumerated.
    pub fn reload(&self, source: &dyn TemplateSource) -> Result<LoadReport> {
        let (registry, report) = PromptRegistry::load(source)?;
        let fresh = Arc::new(registry);
        match self.current.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        Ok(report)
    }
}

impl From<PromptRegistry> for RegistryHandle {
    fn from(registry: PromptRegistry) -> Self {
        Self::new(registry)
    }
}
