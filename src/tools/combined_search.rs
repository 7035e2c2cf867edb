//! T2 `combined_search` — the default tool for analytical queries. Ported
//! from the reference implementation's `combined_search.py`.

use super::synonyms::expand_search_terms;
use crate::analyzer::compute_variable_stats;
use crate::constants::{
    MAX_COMBINED_SEARCH_CODELISTS, MAX_COMBINED_SEARCH_STATS, MAX_COMBINED_SEARCH_VARIABLES,
    MAX_SEARCH_TERMS,
};
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CombinedSearchInput {
    pub concept: String,
    #[serde(default = "default_true")]
    pub include_statistics: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
struct VariableMatch {
    field_name: String,
    description: Option<String>,
    #[serde(rename = "type")]
    field_type: Option<String>,
    table: String,
    module: Option<String>,
    codelist_ref: Option<String>,
    matched_term: String,
}

#[derive(Debug, Serialize)]
struct CodelistMatch {
    name: String,
    values: Vec<serde_json::Value>,
    total_values: usize,
}

pub fn combined_search(snapshot: &Snapshot, input: &CombinedSearchInput, min_k: usize) -> serde_json::Value {
    let search_terms = expand_search_terms(&input.concept, MAX_SEARCH_TERMS);

    let mut found_vars: Vec<VariableMatch> = Vec::new();
    let mut seen_fields = std::collections::HashSet::new();
    for (table_name, fields) in &snapshot.dictionary {
        for field in fields {
            let field_name = match &field.field_name {
                Some(name) if !name.is_empty() => name.clone(),
                _ => continue,
            };
            if seen_fields.contains(&field_name) {
                continue;
            }
            let searchable = field.searchable_text();
            if let Some(term) = search_terms.iter().find(|t| searchable.contains(t.as_str())) {
                seen_fields.insert(field_name.clone());
                found_vars.push(VariableMatch {
                    field_name,
                    description: field.question.clone(),
                    field_type: field.field_type.clone(),
                    table: table_name.clone(),
                    module: field.module.clone(),
                    codelist_ref: field.codelist_ref.clone(),
                    matched_term: term.clone(),
                });
            }
        }
    }
    found_vars.truncate(MAX_COMBINED_SEARCH_VARIABLES);

    let mut found_codelists: Vec<CodelistMatch> = Vec::new();
    for (name, entries) in &snapshot.code_lists {
        let name_lower = name.to_lowercase();
        let name_matches = search_terms.iter().any(|t| name_lower.contains(t.as_str()));
        let descriptor_matches = entries.iter().any(|e| {
            let desc = e.descriptor.clone().unwrap_or_default().to_lowercase();
            search_terms.iter().any(|t| desc.contains(t.as_str()))
        });
        if name_matches || descriptor_matches {
            let values = entries
                .iter()
                .take(crate::constants::MAX_CODELIST_EXAMPLES)
                .map(|e| json!({"code": e.code, "description": e.descriptor}))
                .collect();
            found_codelists.push(CodelistMatch {
                name: name.clone(),
                values,
                total_values: entries.len(),
            });
        }
    }
    found_codelists.truncate(MAX_COMBINED_SEARCH_CODELISTS);

    let mut statistics: Vec<serde_json::Value> = Vec::new();
    let mut data_source: Option<String> = None;

    if input.include_statistics {
        let mut computed = std::collections::HashSet::new();
        data_source = Some("cleaned".to_string());

        'vars: for var_info in found_vars.iter().take(15) {
            let field_name = &var_info.field_name;
            let field_lower = field_name.to_lowercase();
            let mut found_in_cleaned = false;

            for (table_name, records) in &snapshot.cleaned_dataset {
                let Some(sample) = records.first() else { continue };

                if sample.contains_key(field_name) && !computed.contains(field_name) {
                    computed.insert(field_name.clone());
                    statistics.push(stat_entry(
                        records,
                        field_name,
                        min_k,
                        table_name,
                        "cleaned",
                        field_name,
                        None,
                        "exact",
                    ));
                    found_in_cleaned = true;
                } else {
                    for actual_field in sample.keys() {
                        let actual_lower = actual_field.to_lowercase();
                        if (actual_lower.contains(&field_lower)
                            || actual_lower.ends_with(&field_lower)
                            || field_lower.ends_with(&actual_lower))
                            && !computed.contains(actual_field)
                        {
                            computed.insert(actual_field.clone());
                            statistics.push(stat_entry(
                                records,
                                actual_field,
                                min_k,
                                table_name,
                                "cleaned",
                                field_name,
                                Some(actual_field),
                                "partial",
                            ));
                            found_in_cleaned = true;
                            break;
                        }
                    }
                }
                if found_in_cleaned {
                    break;
                }
            }

            if !found_in_cleaned {
                for (table_name, records) in &snapshot.original_dataset {
                    let Some(sample) = records.first() else { continue };

                    if sample.contains_key(field_name) && !computed.contains(field_name) {
                        computed.insert(field_name.clone());
                        statistics.push(stat_entry(
                            records,
                            field_name,
                            min_k,
                            table_name,
                            "original",
                            field_name,
                            None,
                            "exact",
                        ));
                        data_source = Some("original (not in cleaned)".to_string());
                        break;
                    }
                    for actual_field in sample.keys() {
                        let actual_lower = actual_field.to_lowercase();
                        if (actual_lower.contains(&field_lower) || actual_lower.ends_with(&field_lower))
                            && !computed.contains(actual_field)
                        {
                            computed.insert(actual_field.clone());
                            statistics.push(stat_entry(
                                records,
                                actual_field,
                                min_k,
                                table_name,
                                "original",
                                field_name,
                                Some(actual_field),
                                "partial",
                            ));
                            data_source = Some("original (not in cleaned)".to_string());
                            break;
                        }
                    }
                }
            }

            if computed.len() >= MAX_COMBINED_SEARCH_STATS {
                break 'vars;
            }
        }

        if statistics.is_empty() {
            data_source = Some("no data found".to_string());
        }
    }

    let mut result = json!({
        "concept": input.concept,
        "search_terms_used": search_terms,
        "variables_found": found_vars,
        "codelists_found": found_codelists,
        "statistics": statistics,
        "data_source": data_source,
        "summary": {
            "query": input.concept,
            "variables_found": found_vars.len(),
            "codelists_found": found_codelists.len(),
            "statistics_computed": statistics.len(),
            "data_source": data_source,
        },
    });

    if found_vars.is_empty() {
        result["guidance"] = json!(format!(
            "No variables found for '{}'. Try:\n\
             - Different keywords (e.g., 'smoking' instead of 'tobacco use')\n\
             - Medical abbreviations (e.g., 'DM' for diabetes, 'HIV' for human immunodeficiency virus)\n\
             - Specific variable names if you know them\n\
             - Use search_data_dictionary to browse all available variables",
            input.concept
        ));
    }

    result
}

#[allow(clippy::too_many_arguments)]
fn stat_entry(
    records: &[crate::snapshot::Record],
    actual_field: &str,
    min_k: usize,
    table_name: &str,
    source_dataset: &str,
    dictionary_field: &str,
    actual_field_if_partial: Option<&str>,
    match_type: &str,
) -> serde_json::Value {
    let stat = compute_variable_stats(records, actual_field, min_k);
    let mut value = serde_json::to_value(&stat).unwrap_or(json!({}));
    value["source_table"] = json!(table_name);
    value["source_dataset"] = json!(source_dataset);
    value["dictionary_field"] = json!(dictionary_field);
    value["match_type"] = json!(match_type);
    if let Some(actual) = actual_field_if_partial {
        value["actual_field"] = json!(actual);
    }
    value
}
