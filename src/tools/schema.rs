//! JSON-Schema tool descriptors for `tools/list`, in the same
//! `{name, description, inputSchema}` shape the base repo uses for its own
//! tool registry (`server/schema.rs`).

pub fn tool_descriptors() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "name": "prompt_enhancer",
            "description": "Classify a natural-language clinical-data question, explain how it will be \
                interpreted, and (once confirmed) route it to the right analytical tool. Recommended \
                as the first call for ambiguous questions.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_query": { "type": "string", "minLength": 5, "maxLength": 500 },
                    "context": { "type": "object" },
                    "user_confirmation": { "type": "boolean" },
                },
                "required": ["user_query", "user_confirmation"],
            },
        }),
        serde_json::json!({
            "name": "combined_search",
            "description": "Default tool for any analytical question: expands a clinical concept into \
                synonyms, finds matching dictionary variables and code lists, and computes aggregate \
                statistics (cleaned dataset first, original dataset as fallback).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "concept": { "type": "string", "minLength": 1 },
                    "include_statistics": { "type": "boolean" },
                },
                "required": ["concept"],
            },
        }),
        serde_json::json!({
            "name": "search_data_dictionary",
            "description": "Search ONLY for variable definitions and metadata - no statistics. Use when \
                the user wants field names, types, or codelist values without any aggregate computation.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string", "minLength": 1, "maxLength": 200 },
                    "include_codelists": { "type": "boolean" },
                },
                "required": ["query"],
            },
        }),
        serde_json::json!({
            "name": "search_cleaned_dataset",
            "description": "Direct aggregate lookup against the cleaned dataset by variable name \
                substring, optionally filtered by table name.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "variable": { "type": "string", "minLength": 1 },
                    "table_filter": { "type": "string" },
                },
                "required": ["variable"],
            },
        }),
    ]
}
