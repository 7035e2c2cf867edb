//! Tool kernel (C3): the four clinical-data analytical tools, built on the
//! snapshot (C1) and analyzer (C2), registered by name in an explicit table
//! built once at startup rather than discovered through reflection.

pub mod combined_search;
pub mod prompt_enhancer;
pub mod schema;
pub mod search_cleaned_dataset;
pub mod search_data_dictionary;
pub mod synonyms;

use crate::error::McpError;
use crate::snapshot::Snapshot;

pub const TOOL_NAMES: &[&str] = &[
    "prompt_enhancer",
    "combined_search",
    "search_data_dictionary",
    "search_cleaned_dataset",
];

/// Validates and dispatches a `tools/call` invocation. Input-shape failures
/// (missing/malformed fields) surface as `InvalidParams`; everything past
/// that point is infallible by construction — each tool always returns a
/// JSON value, using an in-band `{"error": ...}` marker for internal search
/// failures rather than a wire-level error, matching the source behavior.
pub fn call_tool(
    name: &str,
    arguments: &serde_json::Value,
    snapshot: &Snapshot,
    min_k: usize,
) -> Result<serde_json::Value, McpError> {
    match name {
        "prompt_enhancer" => {
            let input: prompt_enhancer::PromptEnhancerInput =
                serde_json::from_value(arguments.clone()).map_err(|e| invalid_params(&e))?;
            if input.user_query.len() < 5 || input.user_query.len() > 500 {
                return Err(McpError::InvalidParams {
                    field: "user_query".to_string(),
                    reason: "must be between 5 and 500 characters".to_string(),
                });
            }
            Ok(prompt_enhancer::prompt_enhancer(snapshot, &input, min_k))
        }
        "combined_search" => {
            let input: combined_search::CombinedSearchInput =
                serde_json::from_value(arguments.clone()).map_err(|e| invalid_params(&e))?;
            if input.concept.is_empty() {
                return Err(McpError::InvalidParams {
                    field: "concept".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            Ok(combined_search::combined_search(snapshot, &input, min_k))
        }
        "search_data_dictionary" => {
            let input: search_data_dictionary::SearchDataDictionaryInput =
                serde_json::from_value(arguments.clone()).map_err(|e| invalid_params(&e))?;
            if input.query.is_empty() || input.query.len() > 200 {
                return Err(McpError::InvalidParams {
                    field: "query".to_string(),
                    reason: "must be between 1 and 200 characters".to_string(),
                });
            }
            Ok(search_data_dictionary::search_data_dictionary(snapshot, &input))
        }
        "search_cleaned_dataset" => {
            let input: search_cleaned_dataset::SearchCleanedDatasetInput =
                serde_json::from_value(arguments.clone()).map_err(|e| invalid_params(&e))?;
            if input.variable.is_empty() {
                return Err(McpError::InvalidParams {
                    field: "variable".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            Ok(search_cleaned_dataset::search_cleaned_dataset(snapshot, &input, min_k))
        }
        other => Err(McpError::MethodNotFound(other.to_string())),
    }
}

fn invalid_params(e: &serde_json::Error) -> McpError {
    McpError::InvalidParams {
        field: "arguments".to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_is_method_not_found() {
        let snapshot = Snapshot::default();
        let err = call_tool("nonexistent", &serde_json::json!({}), &snapshot, 5).unwrap_err();
        assert!(matches!(err, McpError::MethodNotFound(_)));
    }

    #[test]
    fn rejects_short_prompt_enhancer_query() {
        let snapshot = Snapshot::default();
        let args = serde_json::json!({"user_query": "hi", "user_confirmation": true});
        let err = call_tool("prompt_enhancer", &args, &snapshot, 5).unwrap_err();
        assert!(matches!(err, McpError::InvalidParams { .. }));
    }

    #[test]
    fn rejects_empty_combined_search_concept() {
        let snapshot = Snapshot::default();
        let args = serde_json::json!({"concept": ""});
        let err = call_tool("combined_search", &args, &snapshot, 5).unwrap_err();
        assert!(matches!(err, McpError::InvalidParams { .. }));
    }

    #[test]
    fn tool_names_lists_all_four() {
        assert_eq!(TOOL_NAMES.len(), 4);
    }
}
