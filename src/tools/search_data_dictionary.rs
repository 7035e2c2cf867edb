//! T3 `search_data_dictionary` — metadata only, never computes statistics.
//! Ported from the reference implementation's `search_data_dictionary.py`.

use crate::constants::{MAX_DICTIONARY_CODELISTS, MAX_DICTIONARY_VARIABLES};
use crate::snapshot::Snapshot;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct SearchDataDictionaryInput {
    pub query: String,
    #[serde(default = "default_true")]
    pub include_codelists: bool,
}

fn default_true() -> bool {
    true
}

pub fn search_data_dictionary(snapshot: &Snapshot, input: &SearchDataDictionaryInput) -> serde_json::Value {
    let query_lower = input.query.to_lowercase();

    let mut variable_matches = Vec::new();
    for fields in snapshot.dictionary.values() {
        for field in fields {
            if field.searchable_text().contains(&query_lower) {
                variable_matches.push(json!({
                    "table": field.table.clone(),
                    "field_name": field.field_name,
                    "description": field.question,
                    "type": field.field_type,
                    "codelist_ref": field.codelist_ref,
                    "module": field.module,
                    "form": field.form,
                    "notes": field.notes,
                }));
            }
        }
    }

    let mut codelist_matches: Vec<serde_json::Value> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    if input.include_codelists {
        for (name, entries) in &snapshot.code_lists {
            let matched = name.to_lowercase().contains(&query_lower)
                || entries.iter().any(|e| {
                    e.descriptor
                        .clone()
                        .unwrap_or_default()
                        .to_lowercase()
                        .contains(&query_lower)
                });
            if matched && seen.insert(name.clone()) {
                let values: Vec<_> = entries
                    .iter()
                    .map(|e| json!({"code": e.code, "description": e.descriptor}))
                    .collect();
                codelist_matches.push(json!({"codelist_name": name, "values": values}));
            }
        }
    }
    let variables_found = variable_matches.len();
    let codelists_found = codelist_matches.len();
    variable_matches.truncate(MAX_DICTIONARY_VARIABLES);
    codelist_matches.truncate(MAX_DICTIONARY_CODELISTS);

    json!({
        "query": input.query,
        "variables_found": variables_found,
        "variables": variable_matches,
        "codelists_found": codelists_found,
        "codelists": codelist_matches,
        "hint": "Use exact field_name values when querying datasets. For statistics, use combined_search instead.",
    })
}
