//! T4 `search_cleaned_dataset` — direct aggregate lookup against the cleaned
//! dataset only. Ported from the reference implementation's
//! `search_cleaned_dataset.py`.

use crate::analyzer::compute_variable_stats;
use crate::snapshot::Snapshot;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct SearchCleanedDatasetInput {
    pub variable: String,
    #[serde(default)]
    pub table_filter: Option<String>,
}

pub fn search_cleaned_dataset(
    snapshot: &Snapshot,
    input: &SearchCleanedDatasetInput,
    min_k: usize,
) -> serde_json::Value {
    if snapshot.cleaned_dataset.is_empty() {
        return json!({"error": "Cleaned dataset not available"});
    }

    let var_lower = input.variable.to_lowercase();
    let mut aggregates = Vec::new();

    for (table_name, records) in &snapshot.cleaned_dataset {
        if let Some(filter) = &input.table_filter {
            if !table_name.to_lowercase().contains(&filter.to_lowercase()) {
                continue;
            }
        }

        let Some(sample) = records.first() else { continue };
        let matches: Vec<&String> = sample
            .keys()
            .filter(|k| k.to_lowercase().contains(&var_lower))
            .collect();

        for field in matches {
            let stat = compute_variable_stats(records, field, min_k);
            let mut value = serde_json::to_value(&stat).unwrap_or(json!({}));
            value["source_table"] = json!(table_name);
            value["matched_field"] = json!(field);
            aggregates.push(value);
        }
    }

    if aggregates.is_empty() {
        return json!({
            "variable_searched": input.variable,
            "status": "not_found",
            "suggestion": "Use search_data_dictionary first to find exact variable names, or use combined_search for automatic variable discovery",
        });
    }

    json!({
        "variable_searched": input.variable,
        "status": "found",
        "tables_searched": snapshot.cleaned_dataset.len(),
        "aggregates": aggregates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Record;
    use std::collections::HashMap;

    fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
        let mut m = serde_json::Map::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v.clone());
        }
        m
    }

    #[test]
    fn not_found_returns_status_marker_not_error() {
        let mut cleaned = HashMap::new();
        cleaned.insert(
            "demographics".to_string(),
            vec![record(&[("SEX", json!("M"))])],
        );
        let snapshot = Snapshot {
            dictionary: HashMap::new(),
            code_lists: HashMap::new(),
            cleaned_dataset: cleaned,
            original_dataset: HashMap::new(),
        };
        let input = SearchCleanedDatasetInput {
            variable: "NOT_A_REAL_FIELD".to_string(),
            table_filter: None,
        };
        let result = search_cleaned_dataset(&snapshot, &input, 5);
        assert_eq!(result["status"], json!("not_found"));
    }

    #[test]
    fn empty_cleaned_dataset_is_an_error() {
        let snapshot = Snapshot::default();
        let input = SearchCleanedDatasetInput {
            variable: "AGE".to_string(),
            table_filter: None,
        };
        let result = search_cleaned_dataset(&snapshot, &input, 5);
        assert!(result.get("error").is_some());
    }
}
