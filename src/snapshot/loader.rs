//! Strict JSONL parsing. Every fallible read is annotated with the path (and
//! line number for JSONL) before propagating, following the base repo's
//! `anyhow::Context`-style error annotation.

use super::{CodeEntry, DictionaryField, Record};
use crate::error::McpError;
use std::collections::HashMap;
use std::path::Path;

fn load_jsonl_file(path: &Path) -> Result<Vec<Record>, McpError> {
    let content = std::fs::read_to_string(path).map_err(|e| McpError::LoadError {
        path: path.display().to_string(),
        cause: e.to_string(),
    })?;

    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: serde_json::Value =
            serde_json::from_str(trimmed).map_err(|e| McpError::LoadError {
                path: format!("{}:{}", path.display(), idx + 1),
                cause: e.to_string(),
            })?;
        match value {
            serde_json::Value::Object(map) => records.push(map),
            other => {
                return Err(McpError::LoadError {
                    path: format!("{}:{}", path.display(), idx + 1),
                    cause: format!("expected a JSON object, found {other}"),
                })
            }
        }
    }
    Ok(records)
}

fn table_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Loads every `<table>.jsonl` file directly under `dir`, keyed by file stem.
/// A missing directory yields an empty map rather than an error — a freshly
/// configured server with no original-dataset export yet is a valid state.
pub fn load_dataset_dir(dir: &Path) -> Result<HashMap<String, Vec<Record>>, McpError> {
    let mut out = HashMap::new();
    if !dir.exists() {
        return Ok(out);
    }
    let entries = std::fs::read_dir(dir).map_err(|e| McpError::LoadError {
        path: dir.display().to_string(),
        cause: e.to_string(),
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| McpError::LoadError {
            path: dir.display().to_string(),
            cause: e.to_string(),
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        out.insert(table_stem(&path), load_jsonl_file(&path)?);
    }
    Ok(out)
}

/// Walks `<root>/<sheet>/<table>.jsonl`. Files whose stem contains
/// `codelist` (case-insensitive) are parsed as code lists, keyed by their
/// table stem; everything else is parsed as a dictionary table. This split
/// is a generalization the reference source leaves implicit in its loader
/// module (`_loaders.py`'s `get_data_dictionary`/`get_codelists` read from
/// the same on-disk tree but are not captured in the retrieval pack).
pub fn load_dictionary_tree(
    root: &Path,
) -> Result<
    (
        HashMap<String, Vec<DictionaryField>>,
        HashMap<String, Vec<CodeEntry>>,
    ),
    McpError,
> {
    let mut dictionary = HashMap::new();
    let mut code_lists = HashMap::new();

    if !root.exists() {
        return Ok((dictionary, code_lists));
    }

    let sheets = std::fs::read_dir(root).map_err(|e| McpError::LoadError {
        path: root.display().to_string(),
        cause: e.to_string(),
    })?;

    for sheet_entry in sheets {
        let sheet_entry = sheet_entry.map_err(|e| McpError::LoadError {
            path: root.display().to_string(),
            cause: e.to_string(),
        })?;
        let sheet_path = sheet_entry.path();
        if !sheet_path.is_dir() {
            continue;
        }
        let sheet_name = table_stem(&sheet_path);

        let tables = std::fs::read_dir(&sheet_path).map_err(|e| McpError::LoadError {
            path: sheet_path.display().to_string(),
            cause: e.to_string(),
        })?;

        for table_entry in tables {
            let table_entry = table_entry.map_err(|e| McpError::LoadError {
                path: sheet_path.display().to_string(),
                cause: e.to_string(),
            })?;
            let table_path = table_entry.path();
            if table_path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            let table_name = table_stem(&table_path);
            let records = load_jsonl_file(&table_path)?;

            if table_name.to_lowercase().contains("codelist") {
                let entries = records.iter().map(CodeEntry::from_record).collect();
                code_lists.insert(table_name, entries);
            } else {
                let fields = records
                    .iter()
                    .map(|r| DictionaryField::from_record(&sheet_name, &table_name, r))
                    .collect();
                dictionary.insert(table_name, fields);
            }
        }
    }

    Ok((dictionary, code_lists))
}
