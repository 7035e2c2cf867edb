//! PHI-key redaction applied to any value before it is attached to a log
//! event. Matches on field-key shape, not value content — the datasets are
//! already de-identified, but key names like `patient_name` should never
//! round-trip into a log line even if a caller's tool arguments happen to
//! include one.

const DENYLIST: &[&str] = &[
    "name",
    "patient_name",
    "first_name",
    "last_name",
    "address",
    "phone",
    "email",
    "ssn",
    "mrn",
    "identifier",
    "patient_id",
    "dob",
    "date_of_birth",
];

fn is_denied_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST.iter().any(|denied| lower.contains(denied))
}

/// Returns a copy of `value` with any object key matching the PHI denylist
/// replaced by the literal string `"[redacted]"`. Arrays and scalars are
/// walked recursively; non-object leaves are returned unchanged.
pub fn redact(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                if is_denied_key(k) {
                    out.insert(k.clone(), serde_json::Value::String("[redacted]".to_string()));
                } else {
                    out.insert(k.clone(), redact(v));
                }
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_top_level_denied_key() {
        let input = json!({"patient_name": "Jane Doe", "age": 42});
        let out = redact(&input);
        assert_eq!(out["patient_name"], json!("[redacted]"));
        assert_eq!(out["age"], json!(42));
    }

    #[test]
    fn redacts_nested_denied_key() {
        let input = json!({"context": {"email": "a@b.com"}, "variable": "AGE"});
        let out = redact(&input);
        assert_eq!(out["context"]["email"], json!("[redacted]"));
        assert_eq!(out["variable"], json!("AGE"));
    }

    #[test]
    fn leaves_non_denied_keys_untouched() {
        let input = json!({"table": "demographics", "field_name": "AGE"});
        assert_eq!(redact(&input), input);
    }

    #[test]
    fn walks_arrays() {
        let input = json!([{"name": "x"}, {"variable": "y"}]);
        let out = redact(&input);
        assert_eq!(out[0]["name"], json!("[redacted]"));
        assert_eq!(out[1]["variable"], json!("y"));
    }
}
