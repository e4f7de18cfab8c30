//! Page catalog: labels and lookup tables known at page load
//!
//! The catalog carries what a rendered page embeds in its markup: the label
//! of every executable, environment, benchmark and baseline, the benchmark
//! groups of the comparison view, the executable-to-project matrix and the
//! revision choices of the changes view, and the timeline defaults.

use crate::error::{Error, Result};
use crate::selection::TimelineDefaults;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A selectable item with a display label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Value of the input control (executable key, environment id, ...)
    pub id: String,
    /// Text of the control's label
    pub label: String,
    /// Owning project, for executables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl Entry {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            project: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

/// A benchmark: numeric id plus its name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub id: String,
    pub name: String,
}

/// Benchmarks sharing a unit, drawn together on one comparison chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitGroup {
    /// Unit title, e.g. "Time"
    pub title: String,
    pub benchmark_ids: Vec<String>,
    /// Suffix such as " (less is better)"
    pub lessisbetter: String,
    /// Unit, e.g. "seconds"
    pub units: String,
}

/// A revision choice in the changes view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionOption {
    pub label: String,
    pub commitid: String,
}

/// All page-load lookup data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub executables: Vec<Entry>,
    #[serde(default)]
    pub environments: Vec<Entry>,
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkEntry>,
    #[serde(default)]
    pub baselines: Vec<Entry>,
    #[serde(default)]
    pub bench_units: Vec<UnitGroup>,
    /// Revision choices keyed by project name
    #[serde(default)]
    pub revisions: BTreeMap<String, Vec<RevisionOption>>,
    #[serde(default)]
    pub timeline_defaults: TimelineDefaults,
}

impl Catalog {
    /// Load a catalog from a JSON file; a missing file yields an empty catalog
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        let catalog: Self = serde_json::from_str(&content)?;
        Ok(catalog)
    }

    /// Label of an executable, falling back to its key
    pub fn executable_label(&self, id: &str) -> String {
        label_of(&self.executables, id)
    }

    pub fn environment_label(&self, id: &str) -> String {
        label_of(&self.environments, id)
    }

    /// Label of a baseline choice, falling back to the executable label
    pub fn baseline_label(&self, key: &str) -> String {
        self.baselines
            .iter()
            .find(|b| b.id == key)
            .map(|b| b.label.clone())
            .unwrap_or_else(|| self.executable_label(key))
    }

    /// Name of a benchmark by id, falling back to the id
    pub fn benchmark_label(&self, id: &str) -> String {
        self.benchmarks
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Position of an executable in the catalog (input order)
    pub fn executable_index(&self, id: &str) -> Option<usize> {
        self.executables.iter().position(|e| e.id == id)
    }

    /// Project an executable belongs to
    pub fn project_of(&self, executable: &str) -> Option<&str> {
        self.executables
            .iter()
            .find(|e| e.id == executable)
            .and_then(|e| e.project.as_deref())
    }

    /// Revision choices of a project
    pub fn revisions_for(&self, project: &str) -> &[RevisionOption] {
        self.revisions
            .get(project)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn label_of(entries: &[Entry], id: &str) -> String {
    entries
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.label.clone())
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog {
            executables: vec![
                Entry::new("1", "CPython").with_project("CPython"),
                Entry::new("2", "PyPy").with_project("PyPy"),
            ],
            environments: vec![Entry::new("1", "Dual Core")],
            benchmarks: vec![BenchmarkEntry {
                id: "3".to_string(),
                name: "float".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_labels_fall_back_to_id() {
        let catalog = sample();
        assert_eq!(catalog.executable_label("2"), "PyPy");
        assert_eq!(catalog.executable_label("9"), "9");
        assert_eq!(catalog.benchmark_label("3"), "float");
        assert_eq!(catalog.environment_label("1"), "Dual Core");
    }

    #[test]
    fn test_baseline_label_uses_executable_when_unknown() {
        let catalog = sample();
        assert_eq!(catalog.baseline_label("1"), "CPython");
    }

    #[test]
    fn test_project_lookup() {
        let catalog = sample();
        assert_eq!(catalog.project_of("2"), Some("PyPy"));
        assert_eq!(catalog.project_of("7"), None);
        assert!(catalog.revisions_for("PyPy").is_empty());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let catalog = Catalog::load_from_file(Path::new("/nonexistent/catalog.json")).unwrap();
        assert_eq!(catalog, Catalog::default());
    }

    #[test]
    fn test_deserialize_partial_catalog() {
        let json = r#"{"executables": [{"id": "1", "label": "CPython"}]}"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.executables.len(), 1);
        assert!(catalog.bench_units.is_empty());
    }
}
