//! Immutable in-memory view of all loaded datasets, dictionary, and code
//! lists (C1). A `SnapshotStore` holds the currently active snapshot behind a
//! `RwLock<Arc<Snapshot>>`: readers clone the `Arc` once at the top of a
//! handler and never block on a concurrent reload, satisfying the "a request
//! begun before reload observes the pre-reload snapshot" property.

mod loader;

use crate::error::McpError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type Record = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryField {
    pub sheet: String,
    pub table: String,
    pub field_name: Option<String>,
    pub question: Option<String>,
    pub field_type: Option<String>,
    pub codelist_ref: Option<String>,
    pub module: Option<String>,
    pub form: Option<String>,
    pub notes: Option<String>,
}

impl DictionaryField {
    /// Lower-cased concatenation of every field substring search matches
    /// against (field short name, question text, module, code-list
    /// reference, notes).
    pub fn searchable_text(&self) -> String {
        [
            self.field_name.as_deref().unwrap_or(""),
            self.question.as_deref().unwrap_or(""),
            self.module.as_deref().unwrap_or(""),
            self.codelist_ref.as_deref().unwrap_or(""),
            self.notes.as_deref().unwrap_or(""),
        ]
        .join(" ")
        .to_lowercase()
    }

    fn from_record(sheet: &str, table: &str, record: &Record) -> Self {
        let get = |key: &str| record.get(key).and_then(|v| v.as_str()).map(String::from);
        DictionaryField {
            sheet: sheet.to_string(),
            table: table.to_string(),
            field_name: get("Question Short Name (Databank Fieldname)"),
            question: get("Question"),
            field_type: get("Type"),
            codelist_ref: get("Code List or format"),
            module: get("Module"),
            form: get("Form"),
            notes: get("Notes"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: Option<String>,
    pub descriptor: Option<String>,
}

impl CodeEntry {
    fn from_record(record: &Record) -> Self {
        CodeEntry {
            code: record.get("Codes").and_then(|v| v.as_str()).map(String::from),
            descriptor: record
                .get("Descriptors")
                .and_then(|v| v.as_str())
                .map(String::from),
        }
    }
}

#[derive(Debug, Default)]
pub struct Snapshot {
    pub dictionary: HashMap<String, Vec<DictionaryField>>,
    pub code_lists: HashMap<String, Vec<CodeEntry>>,
    pub cleaned_dataset: HashMap<String, Vec<Record>>,
    pub original_dataset: HashMap<String, Vec<Record>>,
}

impl Snapshot {
    pub fn load(data_root: &PathBuf, dataset_name: &str) -> Result<Self, McpError> {
        let dictionary_root = data_root.join(crate::constants::DATA_DICTIONARY_DIR);
        let deidentified_root = data_root.join(crate::constants::DEIDENTIFIED_DIR).join(dataset_name);

        let (dictionary, code_lists) = loader::load_dictionary_tree(&dictionary_root)?;
        let cleaned_dataset = loader::load_dataset_dir(&deidentified_root.join("cleaned"))?;
        let original_dataset = loader::load_dataset_dir(&deidentified_root.join("original"))?;

        Ok(Snapshot {
            dictionary,
            code_lists,
            cleaned_dataset,
            original_dataset,
        })
    }

    /// All dictionary fields across every table, for tools that scan the
    /// whole dictionary regardless of table.
    pub fn all_dictionary_fields(&self) -> impl Iterator<Item = &DictionaryField> {
        self.dictionary.values().flatten()
    }
}

pub struct SnapshotStore {
    data_root: PathBuf,
    dataset_name: String,
    inner: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub async fn load(data_root: PathBuf, dataset_name: String) -> Result<Self, McpError> {
        let snapshot = Snapshot::load(&data_root, &dataset_name)?;
        Ok(SnapshotStore {
            data_root,
            dataset_name,
            inner: RwLock::new(Arc::new(snapshot)),
        })
    }

    pub fn data_root(&self) -> &PathBuf {
        &self.data_root
    }

    /// Returns the currently active snapshot. Cheap `Arc` clone; callers
    /// should take this once per request and use the same handle throughout,
    /// so a concurrent reload never produces a partially-mixed view.
    pub async fn current(&self) -> Arc<Snapshot> {
        self.inner.read().await.clone()
    }

    /// Atomically replaces the active snapshot. In-flight handlers that
    /// already cloned the previous `Arc<Snapshot>` keep observing it until
    /// they finish and drop it.
    pub async fn reload(&self) -> Result<(), McpError> {
        let fresh = Snapshot::load(&self.data_root, &self.dataset_name)?;
        let mut guard = self.inner.write().await;
        *guard = Arc::new(fresh);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn searchable_text_is_lowercased_and_joined() {
        let field = DictionaryField {
            sheet: "demo".into(),
            table: "t1".into(),
            field_name: Some("AGE".into()),
            question: Some("Patient Age".into()),
            field_type: None,
            codelist_ref: None,
            module: Some("Baseline".into()),
            form: None,
            notes: None,
        };
        let text = field.searchable_text();
        assert!(text.contains("age"));
        assert!(text.contains("patient age"));
        assert!(text.contains("baseline"));
    }
}
