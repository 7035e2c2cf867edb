//! Static descriptive resources exposed via `resources/list`/`resources/read`.
//! Computed from the current snapshot; carry no statistics and are therefore
//! exempt from k-anonymity.

use crate::snapshot::Snapshot;
use serde_json::{json, Value};

const STUDY_OVERVIEW: &str = "reportalin://study-overview";
const TABLE_INDEX: &str = "reportalin://table-index";
const CODELIST_CATALOG: &str = "reportalin://codelist-catalog";

pub fn list() -> Value {
    json!({
        "resources": [
            {"uri": STUDY_OVERVIEW, "name": "Study overview", "mimeType": "application/json"},
            {"uri": TABLE_INDEX, "name": "Table index", "mimeType": "application/json"},
            {"uri": CODELIST_CATALOG, "name": "Code list catalog", "mimeType": "application/json"},
        ],
    })
}

pub fn read(uri: &str, snapshot: &Snapshot) -> Option<Value> {
    let body = match uri {
        STUDY_OVERVIEW => json!({
            "cleaned_tables": snapshot.cleaned_dataset.iter().map(|(name, records)| {
                json!({"table": name, "record_count": records.len()})
            }).collect::<Vec<_>>(),
            "original_tables": snapshot.original_dataset.iter().map(|(name, records)| {
                json!({"table": name, "record_count": records.len()})
            }).collect::<Vec<_>>(),
        }),
        TABLE_INDEX => json!({
            "tables": snapshot.dictionary.iter().map(|(table, fields)| {
                json!({
                    "table": table,
                    "fields": fields.iter().filter_map(|f| f.field_name.clone()).collect::<Vec<_>>(),
                })
            }).collect::<Vec<_>>(),
        }),
        CODELIST_CATALOG => json!({
            "codelists": snapshot.code_lists.iter().map(|(name, entries)| {
                json!({"name": name, "value_count": entries.len()})
            }).collect::<Vec<_>>(),
        }),
        _ => return None,
    };

    Some(json!({
        "contents": [{"uri": uri, "mimeType": "application/json", "text": body.to_string()}],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_has_three_resources() {
        let result = list();
        assert_eq!(result["resources"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn read_unknown_uri_is_none() {
        let snapshot = Snapshot::default();
        assert!(read("reportalin://nope", &snapshot).is_none());
    }

    #[test]
    fn read_study_overview_on_empty_snapshot() {
        let snapshot = Snapshot::default();
        let result = read(STUDY_OVERVIEW, &snapshot).unwrap();
        assert!(result["contents"].is_array());
    }
}
