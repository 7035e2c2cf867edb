//! T1 `prompt_enhancer` — the recommended (not enforced) entry point. Ported
//! from the reference implementation's `prompt_enhancer.py`: keyword-based
//! intent classification, clinical-concept extraction, and a mandatory
//! confirmation gate before any downstream tool runs.

use crate::snapshot::Snapshot;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct PromptEnhancerInput {
    pub user_query: String,
    #[serde(default)]
    pub context: Option<Value>,
    pub user_confirmation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    MetadataDiscovery,
    VariableDefinition,
    StatisticalQuery,
    ComparisonAnalysis,
    DistributionAnalysis,
    GeneralAnalysis,
}

impl QueryType {
    fn as_str(&self) -> &'static str {
        match self {
            QueryType::MetadataDiscovery => "metadata_discovery",
            QueryType::VariableDefinition => "variable_definition",
            QueryType::StatisticalQuery => "statistical_query",
            QueryType::ComparisonAnalysis => "comparison_analysis",
            QueryType::DistributionAnalysis => "distribution_analysis",
            QueryType::GeneralAnalysis => "general_analysis",
        }
    }

    /// `T3` (metadata-only) for discovery/definition queries; `T2` (default
    /// analytical tool) for everything else. `T4` is a legal, reachable route
    /// for a future, more specific classifier but is never the one selected
    /// here — it stays reachable via the `primary_tool` field rather than
    /// being hardcoded out.
    fn primary_tool(&self) -> &'static str {
        match self {
            QueryType::MetadataDiscovery | QueryType::VariableDefinition => "search_data_dictionary",
            _ => "combined_search",
        }
    }
}

fn classify_intent(query_lower: &str) -> QueryType {
    const METADATA: &[&str] = &["what variables", "which variables", "list variables", "what fields", "variable names"];
    const DEFINITION: &[&str] = &["what does", "mean", "definition", "describe variable", "what is the meaning"];
    const STATISTICAL: &[&str] = &["how many", "count", "number of", "total", "percentage", "proportion"];
    const COMPARISON: &[&str] = &["compare", "vs", "versus", "between", "difference", "association", "relationship"];
    const DISTRIBUTION: &[&str] = &["distribution", "breakdown", "spread", "range"];

    if METADATA.iter().any(|k| query_lower.contains(k)) {
        QueryType::MetadataDiscovery
    } else if DEFINITION.iter().any(|k| query_lower.contains(k)) {
        QueryType::VariableDefinition
    } else if STATISTICAL.iter().any(|k| query_lower.contains(k)) {
        QueryType::StatisticalQuery
    } else if COMPARISON.iter().any(|k| query_lower.contains(k)) {
        QueryType::ComparisonAnalysis
    } else if DISTRIBUTION.iter().any(|k| query_lower.contains(k)) {
        QueryType::DistributionAnalysis
    } else {
        QueryType::GeneralAnalysis
    }
}

const CLINICAL_CONCEPTS: &[(&str, &[&str])] = &[
    ("hiv", &["hiv", "aids", "human immunodeficiency"]),
    ("diabetes", &["diabetes", "diabetic", "glucose", "hba1c"]),
    ("smoking", &["smoking", "smoke", "smoker", "tobacco", "cigarette"]),
    ("alcohol", &["alcohol", "drinking", "drink", "liquor"]),
    ("age", &["age", "years old", "elderly", "young"]),
    ("sex", &["sex", "gender", "male", "female"]),
    ("outcome", &["outcome", "cure", "success", "failure", "death", "result"]),
    ("site", &["site", "center", "location", "pune", "chennai", "vellore"]),
    ("bmi", &["bmi", "body mass", "weight", "malnutrition"]),
    ("tuberculosis", &["tuberculosis", "tb"]),
];

fn extract_clinical_concepts(query_lower: &str) -> Vec<&'static str> {
    CLINICAL_CONCEPTS
        .iter()
        .filter(|(_, synonyms)| synonyms.iter().any(|kw| query_lower.contains(kw)))
        .map(|(concept, _)| *concept)
        .collect()
}

fn complexity_tier(concept_count: usize) -> &'static str {
    match concept_count {
        0..=2 => "simple",
        3..=4 => "moderate",
        _ => "complex",
    }
}

fn build_interpretation(query_type: QueryType, concepts: &[&str]) -> String {
    let concept_desc = if concepts.is_empty() {
        "the study data".to_string()
    } else {
        concepts.join(", ")
    };
    let base = match query_type {
        QueryType::MetadataDiscovery => format!("looking up variable metadata related to {concept_desc}"),
        QueryType::VariableDefinition => format!("asking for the definition of a variable related to {concept_desc}"),
        QueryType::StatisticalQuery => format!("requesting summary statistics about {concept_desc}"),
        QueryType::ComparisonAnalysis => format!("comparing groups with respect to {concept_desc}"),
        QueryType::DistributionAnalysis => format!("requesting a distribution/breakdown of {concept_desc}"),
        QueryType::GeneralAnalysis => format!("a general analytical question about {concept_desc}"),
    };
    format!(
        "Interpreting this as {base}. Only de-identified aggregate statistics will be returned; \
         no individual patient records are ever disclosed.",
    )
}

pub fn prompt_enhancer(
    snapshot: &Snapshot,
    input: &PromptEnhancerInput,
    min_k: usize,
) -> Value {
    let query_lower = input.user_query.to_lowercase();
    let query_type = classify_intent(&query_lower);
    let concepts = extract_clinical_concepts(&query_lower);
    let complexity = complexity_tier(concepts.len());
    let interpretation = build_interpretation(query_type, &concepts);

    let understood_intent = json!({
        "query_type": query_type.as_str(),
        "concepts": concepts,
        "complexity": complexity,
        "routing": query_type.primary_tool(),
    });

    if !input.user_confirmation {
        return json!({
            "needs_confirmation": true,
            "interpretation": interpretation,
            "understood_intent": understood_intent,
        });
    }

    let tool_used = query_type.primary_tool();
    let result: Value = match tool_used {
        "search_data_dictionary" => {
            let tool_input = super::search_data_dictionary::SearchDataDictionaryInput {
                query: input.user_query.clone(),
                include_codelists: true,
            };
            super::search_data_dictionary::search_data_dictionary(snapshot, &tool_input)
        }
        "search_cleaned_dataset" => {
            let tool_input = super::search_cleaned_dataset::SearchCleanedDatasetInput {
                variable: input.user_query.clone(),
                table_filter: None,
            };
            super::search_cleaned_dataset::search_cleaned_dataset(snapshot, &tool_input, min_k)
        }
        _ => {
            let tool_input = super::combined_search::CombinedSearchInput {
                concept: input.user_query.clone(),
                include_statistics: true,
            };
            super::combined_search::combined_search(snapshot, &tool_input, min_k)
        }
    };

    json!({
        "needs_confirmation": false,
        "original_query": input.user_query,
        "interpretation": interpretation,
        "tool_used": tool_used,
        "result": result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfirmed_query_never_invokes_downstream_tool() {
        let snapshot = Snapshot::default();
        let input = PromptEnhancerInput {
            user_query: "how many patients have diabetes".to_string(),
            context: None,
            user_confirmation: false,
        };
        let result = prompt_enhancer(&snapshot, &input, 5);
        assert_eq!(result["needs_confirmation"], json!(true));
        assert!(result.get("result").is_none());
    }

    #[test]
    fn confirmed_query_routes_and_invokes() {
        let snapshot = Snapshot::default();
        let input = PromptEnhancerInput {
            user_query: "what variables exist for diabetes".to_string(),
            context: None,
            user_confirmation: true,
        };
        let result = prompt_enhancer(&snapshot, &input, 5);
        assert_eq!(result["needs_confirmation"], json!(false));
        assert_eq!(result["tool_used"], json!("search_data_dictionary"));
    }

    #[test]
    fn complexity_tiers_scale_with_concept_count() {
        assert_eq!(complexity_tier(0), "simple");
        assert_eq!(complexity_tier(2), "simple");
        assert_eq!(complexity_tier(3), "moderate");
        assert_eq!(complexity_tier(5), "complex");
    }
}
