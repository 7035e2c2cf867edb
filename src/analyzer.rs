//! Aggregate analyzers (C2): given a record set and a field name, produce a
//! typed statistical summary. Ported line-for-line from the reference
//! implementation's `compute_variable_stats`/`compute_histogram`.

use crate::constants::{MAX_CATEGORICAL_VALUES, MAX_HISTOGRAM_BINS};
use crate::snapshot::Record;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum AggregateResult {
    #[serde(rename = "numeric")]
    Numeric(NumericAggregate),
    #[serde(rename = "categorical")]
    Categorical(CategoricalAggregate),
    #[serde(rename = "suppressed")]
    Suppressed {
        reason: &'static str,
        k: usize,
        threshold: usize,
    },
    #[serde(rename = "no_data")]
    NoData,
}

#[derive(Debug, Clone, Serialize)]
pub struct Common {
    pub variable: String,
    pub total_records: usize,
    pub non_null_count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    pub range: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stddev: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericAggregate {
    #[serde(flatten)]
    pub common: Common,
    pub statistics: NumericStatistics,
    pub distribution: Vec<HistogramBin>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoricalAggregate {
    #[serde(flatten)]
    pub common: Common,
    pub value_counts: Vec<ValueCount>,
    pub unique_values: usize,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// `true` for a JSON number that is not a JSON boolean — booleans never count
/// as numeric even though `serde_json` stores them separately already; this
/// mirrors the source's explicit `not isinstance(v, bool)` guard.
fn is_numeric(value: &serde_json::Value) -> bool {
    value.is_number()
}

pub fn compute_histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() {
        return Vec::new();
    }
    let min_val = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_val = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if min_val == max_val {
        return vec![HistogramBin {
            range: format!("{min_val}"),
            count: values.len(),
        }];
    }

    let bin_width = (max_val - min_val) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let mut idx = ((v - min_val) / bin_width) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        counts[idx] += 1;
    }

    (0..bins)
        .map(|i| {
            let start = min_val + bin_width * i as f64;
            let end = min_val + bin_width * (i + 1) as f64;
            HistogramBin {
                range: format!("{}-{}", round1(start), round1(end)),
                count: counts[i],
            }
        })
        .collect()
}

/// Computes the aggregate for `variable` over `records`, enforcing
/// k-anonymity against `min_k`.
pub fn compute_variable_stats(
    records: &[Record],
    variable: &str,
    min_k: usize,
) -> AggregateResult {
    let total_records = records.len();
    let values: Vec<&serde_json::Value> = records
        .iter()
        .filter_map(|r| r.get(variable))
        .filter(|v| !v.is_null())
        .collect();

    let non_null_count = values.len();
    let null_count = total_records.saturating_sub(non_null_count);
    let null_percentage = if total_records == 0 {
        0.0
    } else {
        round1(null_count as f64 / total_records as f64 * 100.0)
    };

    if non_null_count == 0 {
        return AggregateResult::NoData;
    }
    if non_null_count < min_k {
        return AggregateResult::Suppressed {
            reason: "k-anonymity",
            k: non_null_count,
            threshold: min_k,
        };
    }

    let common = Common {
        variable: variable.to_string(),
        total_records,
        non_null_count,
        null_count,
        null_percentage,
    };

    let numeric_values: Vec<f64> = values
        .iter()
        .filter(|v| is_numeric(v))
        .filter_map(|v| v.as_f64())
        .collect();
    let categorical_count = non_null_count - numeric_values.len();

    if numeric_values.len() > categorical_count {
        let min_val = numeric_values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_val = numeric_values
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        let mean = numeric_values.iter().sum::<f64>() / numeric_values.len() as f64;

        let mut sorted = numeric_values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median = if sorted.len() % 2 == 1 {
            sorted[sorted.len() / 2]
        } else {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        };

        let stddev = if numeric_values.len() > 1 {
            let variance = numeric_values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (numeric_values.len() - 1) as f64;
            Some(round2(variance.sqrt()))
        } else {
            None
        };

        AggregateResult::Numeric(NumericAggregate {
            common,
            statistics: NumericStatistics {
                min: round2(min_val),
                max: round2(max_val),
                mean: round2(mean),
                median: round2(median),
                stddev,
            },
            distribution: compute_histogram(&numeric_values, MAX_HISTOGRAM_BINS),
        })
    } else {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for v in &values {
            let s = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if let Some(entry) = counts.iter_mut().find(|(k, _)| *k == s) {
                entry.1 += 1;
            } else {
                counts.push((s, 1));
            }
        }
        let unique_values = counts.len();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        let value_counts = counts
            .into_iter()
            .take(MAX_CATEGORICAL_VALUES)
            .map(|(value, count)| ValueCount {
                value,
                count,
                percentage: round1(count as f64 / non_null_count as f64 * 100.0),
            })
            .collect();

        AggregateResult::Categorical(CategoricalAggregate {
            common,
            value_counts,
            unique_values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records_with(variable: &str, values: Vec<serde_json::Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| {
                let mut m = serde_json::Map::new();
                m.insert(variable.to_string(), v);
                m
            })
            .collect()
    }

    #[test]
    fn suppresses_below_k() {
        let records = records_with("AGE", vec![json!(20), json!(30), json!(40)]);
        let result = compute_variable_stats(&records, "AGE", 5);
        match result {
            AggregateResult::Suppressed { k, threshold, .. } => {
                assert_eq!(k, 3);
                assert_eq!(threshold, 5);
            }
            other => panic!("expected suppressed, got {other:?}"),
        }
    }

    #[test]
    fn no_data_when_all_null() {
        let records = records_with("AGE", vec![json!(null), json!(null)]);
        let result = compute_variable_stats(&records, "AGE", 5);
        assert!(matches!(result, AggregateResult::NoData));
    }

    #[test]
    fn numeric_aggregate_basic_shape() {
        let values: Vec<serde_json::Value> = (18..=90).map(|n| json!(n)).collect();
        let records = records_with("AGE", values);
        let result = compute_variable_stats(&records, "AGE", 5);
        match result {
            AggregateResult::Numeric(agg) => {
                assert_eq!(agg.statistics.min, 18.0);
                assert_eq!(agg.statistics.max, 90.0);
                assert_eq!(agg.distribution.len(), 10);
                let total: usize = agg.distribution.iter().map(|b| b.count).sum();
                assert_eq!(total, agg.common.non_null_count);
            }
            other => panic!("expected numeric, got {other:?}"),
        }
    }

    #[test]
    fn categorical_aggregate_counts_and_percentages() {
        let mut values = Vec::new();
        for _ in 0..10 {
            values.push(json!("male"));
        }
        for _ in 0..5 {
            values.push(json!("female"));
        }
        let records = records_with("SEX", values);
        let result = compute_variable_stats(&records, "SEX", 5);
        match result {
            AggregateResult::Categorical(agg) => {
                assert_eq!(agg.unique_values, 2);
                let total: usize = agg.value_counts.iter().map(|v| v.count).sum();
                assert_eq!(total, agg.common.non_null_count);
                let male = agg.value_counts.iter().find(|v| v.value == "male").unwrap();
                assert_eq!(male.percentage, round1(10.0 / 15.0 * 100.0));
            }
            other => panic!("expected categorical, got {other:?}"),
        }
    }

    #[test]
    fn histogram_single_bin_when_min_equals_max() {
        let bins = compute_histogram(&[5.0, 5.0, 5.0], 10);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
    }

    #[test]
    fn histogram_last_bin_inclusive_of_max() {
        let values: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let bins = compute_histogram(&values, 10);
        let total: usize = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, values.len());
        assert!(bins.last().unwrap().count > 0);
    }
}
