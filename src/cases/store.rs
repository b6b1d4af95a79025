//! Flat-file record store
//!
//! Loads the persisted JSON array once, keeps only complete records and
//! stays read-only for the lifetime of the process.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::cases::types::{AccidentCase, RawCase};
use crate::errors::{RagError, Result};

/// Counts collected while loading a record file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries present in the file
    pub total_entries: usize,
    /// Entries dropped because a field was missing, blank or not a string
    pub incomplete: usize,
    /// Entries dropped because their case code was already loaded
    pub duplicates: usize,
}

impl LoadReport {
    /// Number of records kept
    pub fn loaded(&self) -> usize {
        self.total_entries - self.incomplete - self.duplicates
    }
}

/// Immutable collection of accident cases
#[derive(Debug, Clone, Default)]
pub struct CaseStore {
    cases: Vec<AccidentCase>,
}

impl CaseStore {
    /// Build a store from in-memory records, applying the same filtering as `load`
    pub fn from_cases(cases: Vec<AccidentCase>) -> Self {
        let (store, _) = Self::filter(cases.into_iter().map(Some), 0);
        store
    }

    /// Load records from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let (store, report) = Self::load_with_report(path)?;
        tracing::info!(
            path = %path.display(),
            loaded = report.loaded(),
            "Loaded accident case store"
        );
        Ok(store)
    }

    /// Load records and report what was dropped
    pub fn load_with_report(path: &Path) -> Result<(Self, LoadReport)> {
        let contents = fs::read_to_string(path).map_err(|e| {
            RagError::Store(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
    }

    /// Parse the persisted JSON array
    pub fn parse(contents: &str) -> Result<(Self, LoadReport)> {
        let entries: Vec<JsonValue> = serde_json::from_str(contents)
            .map_err(|e| RagError::Store(format!("Record file is not a JSON array: {}", e)))?;

        let total = entries.len();
        let candidates = entries.into_iter().map(|entry| {
            serde_json::from_value::<RawCase>(entry)
                .ok()
                .and_then(RawCase::into_case)
        });

        let (store, report) = Self::filter(candidates, total);

        if report.incomplete > 0 {
            tracing::warn!(
                dropped = report.incomplete,
                "Skipped records with missing fields"
            );
        }
        if report.duplicates > 0 {
            tracing::warn!(
                dropped = report.duplicates,
                "Skipped records with duplicate case codes"
            );
        }

        Ok((store, report))
    }

    fn filter(
        candidates: impl Iterator<Item = Option<AccidentCase>>,
        capacity: usize,
    ) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let mut seen = HashSet::new();
        let mut cases = Vec::with_capacity(capacity);

        for candidate in candidates {
            report.total_entries += 1;
            match candidate {
                Some(case) if case.is_complete() => {
                    if seen.insert(case.case_code.clone()) {
                        cases.push(case);
                    } else {
                        report.duplicates += 1;
                    }
                }
                _ => report.incomplete += 1,
            }
        }

        (Self { cases }, report)
    }

    /// Write records in the persisted layout (UTF-8, 4-space indent)
    pub fn save(&self, path: &Path) -> Result<()> {
        write_cases(path, &self.cases)
    }

    /// All records, in file order
    pub fn cases(&self) -> &[AccidentCase] {
        &self.cases
    }

    /// Look up a record by its case code
    pub fn get(&self, case_code: &str) -> Option<&AccidentCase> {
        self.cases.iter().find(|c| c.case_code == case_code)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Serialize records as a pretty JSON array with four-space indentation
pub fn write_cases(path: &Path, cases: &[AccidentCase]) -> Result<()> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    cases.serialize(&mut serializer)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, buffer)?;
    Ok(())
}
