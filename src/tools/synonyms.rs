//! Clinical concept → synonym-list table, ported verbatim as a data artifact
//! from the reference implementation's `combined_search` tool. A plain linear
//! const table is the right scale here (30 entries) — the base repo prefers
//! plain const tables over lookup-macro crates for data this size.

pub const CONCEPT_SYNONYMS: &[(&str, &[&str])] = &[
    ("age", &["age", "birth", "dob", "years old"]),
    ("sex", &["sex", "gender", "male", "female"]),
    ("site", &["site", "center", "location", "pune", "chennai", "vellore"]),
    ("bmi", &["bmi", "body mass", "weight", "height"]),
    ("weight", &["weight", "kgs", "mass"]),
    ("height", &["height", "tall"]),
    (
        "malnutrition",
        &["malnutrition", "undernutrition", "undernourish", "bmi", "weight"],
    ),
    ("nutrition", &["nutrition", "bmi", "weight", "diet", "food"]),
    (
        "diabetes",
        &[
            "diabetes",
            "diabetic",
            "glucose",
            "hba1c",
            "hba1",
            "fbg_",
            "rbg_",
            "ogtt",
            "blood sugar",
        ],
    ),
    ("hiv", &["hiv", "aids", "hivstat", "retroviral", "antiretroviral"]),
    (
        "smoking",
        &["smoking", "smoke", "smoker", "tobacco", "cigarette", "smokhx", "bidi"],
    ),
    ("alcohol", &["alcohol", "drinking", "drink", "liquor", "beer", "alcoh"]),
    ("drug", &["drug use", "substance", "injection drug", "idu"]),
    ("tuberculosis", &["tuberculosis", "tbnew", "tbdx", "pulmonary"]),
    ("diagnosis", &["diagnosis", "diagnosed", "tbdx", "confirm"]),
    ("treatment", &["treatment", "therapy", "regimen", "medication", "anti-tb"]),
    (
        "outcome",
        &[
            "outcome",
            "outclin",
            "outoth",
            "cure",
            "fail",
            "death",
            "ltfu",
            "treatment result",
        ],
    ),
    ("cure", &["cure", "cured", "success", "favorable"]),
    ("failure", &["failure", "fail", "unfavorable", "unsuccessful"]),
    ("death", &["death", "died", "mortality", "dead"]),
    ("relapse", &["relapse", "recurrence", "recurrent", "recur"]),
    ("follow-up", &["follow", "followup", "fua_", "fub_", "visit"]),
    ("sputum", &["sputum", "smear", "afb", "microscopy"]),
    ("culture", &["culture", "growth"]),
    ("xpert", &["xpert", "genexpert", "pcr", "molecular"]),
    ("xray", &["xray", "x-ray", "chest", "radiograph", "cxr"]),
    ("cd4", &["cd4", "t-cell", "immune"]),
    ("symptoms", &["symptom", "cough", "fever", "weight loss", "night sweat"]),
    ("cough", &["cough", "sputum", "expectoration"]),
    ("fever", &["fever", "temperature", "febrile"]),
    ("baseline", &["baseline", "enrollment", "initial", "screening", "index"]),
    ("month", &["month", "week", "day", "visit", "follow"]),
];

/// Builds the capped, deduplicated search-term set for a concept query: the
/// concept itself, words longer than 2 characters, and every synonym of any
/// matched concept key. Capped at `max_terms`.
pub fn expand_search_terms(concept: &str, max_terms: usize) -> Vec<String> {
    let concept_lower = concept.to_lowercase();
    let mut terms: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    let mut push = |term: &str, seen: &mut std::collections::HashSet<String>, terms: &mut Vec<String>| {
        if seen.insert(term.to_string()) {
            terms.push(term.to_string());
        }
    };

    push(&concept_lower, &mut seen, &mut terms);

    for word in concept_lower.split_whitespace() {
        if word.len() > 2 {
            push(word, &mut seen, &mut terms);
        }
    }

    for (key, synonyms) in CONCEPT_SYNONYMS {
        let key_matches = concept_lower.contains(key)
            || synonyms.iter().any(|syn| concept_lower.contains(syn));
        if key_matches {
            for syn in *synonyms {
                push(syn, &mut seen, &mut terms);
            }
        }
    }

    terms.truncate(max_terms);
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_concept_itself() {
        let terms = expand_search_terms("diabetes", 15);
        assert!(terms.contains(&"diabetes".to_string()));
        assert!(terms.contains(&"hba1c".to_string()));
    }

    #[test]
    fn caps_at_max_terms() {
        let terms = expand_search_terms("age sex site diabetes hiv", 15);
        assert!(terms.len() <= 15);
    }

    #[test]
    fn skips_short_words() {
        let terms = expand_search_terms("hiv at bmi", 15);
        assert!(!terms.contains(&"at".to_string()));
    }
}
