//! Result reconciliation
//!
//! Maps the outcomes of a dispatched subset back onto the full row
//! collection. Rows carry no identifier, so a selected record is matched to
//! the first full-collection row that is structurally equal to it on every
//! field except the result field.
//!
//! # Precision limit
//!
//! Two rows identical on all non-result fields are indistinguishable: only
//! the lower index receives the outcome for a given selected record.

use crate::schema::Schema;
use crate::types::{Outcome, Record};

/// Summary of one merge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Selected records that found their row
    pub matched: usize,
    /// Selected records with no structural match
    pub unmatched: usize,
}

/// Result column written by a merge pass
#[derive(Debug, Clone, Copy)]
pub struct ResultColumn<'a> {
    /// Field key
    pub key: &'a str,
    /// Label used if the column has to be created
    pub label: &'a str,
}

/// Merge `outcomes` for `subset` into `rows`
///
/// The result column is ensured on the schema before any write. Entries
/// beyond the shorter of `subset` and `outcomes` are ignored.
pub fn reconcile(
    schema: &mut Schema,
    rows: &mut [Record],
    subset: &[Record],
    outcomes: &[Outcome],
    column: ResultColumn<'_>,
) -> MergeSummary {
    if subset.len() != outcomes.len() {
        tracing::warn!(
            "Subset/outcome length mismatch: {} records, {} outcomes",
            subset.len(),
            outcomes.len()
        );
    }

    if schema.ensure_column(column.key, column.label, rows) {
        tracing::info!("Created result column {}", column.key);
    }

    let mut summary = MergeSummary::default();
    for (selected, outcome) in subset.iter().zip(outcomes) {
        match find_match(rows, selected, column.key) {
            Some(index) => {
                rows[index].insert(column.key.to_string(), outcome.cell_value());
                summary.matched += 1;
            }
            None => {
                tracing::debug!("NoStructuralMatch: selected record dropped");
                summary.unmatched += 1;
            }
        }
    }
    summary
}

/// Index of the first row matching `selected` on all non-result fields
#[must_use]
pub fn find_match(rows: &[Record], selected: &Record, result_key: &str) -> Option<usize> {
    rows.iter().position(|row| {
        selected
            .iter()
            .filter(|(key, _)| key.as_str() != result_key)
            .all(|(key, value)| row.get(key) == Some(value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const RESULT: ResultColumn<'static> = ResultColumn {
        key: "llm_result",
        label: "LLM Result",
    };

    fn records(value: Value) -> Vec<Record> {
        value
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }

    #[test]
    fn find_match_ignores_result_field() {
        let rows = records(json!([
            {"t": "a", "llm_result": "old"},
            {"t": "b", "llm_result": "old"}
        ]));
        let selected = records(json!([{"t": "b", "llm_result": "stale"}]));
        assert_eq!(find_match(&rows, &selected[0], "llm_result"), Some(1));
    }

    #[test]
    fn find_match_compares_nested_values() {
        let rows = records(json!([
            {"meta": {"tags": ["x"]}},
            {"meta": {"tags": ["y"]}}
        ]));
        let selected = records(json!([{"meta": {"tags": ["y"]}}]));
        assert_eq!(find_match(&rows, &selected[0], "llm_result"), Some(1));
    }

    #[test]
    fn reconcile_writes_success_and_failure() {
        let mut rows = records(json!([{"t": "a"}, {"t": "b"}, {"t": "c"}]));
        let mut schema = Schema::from_first_record(&rows[0]);
        let subset = vec![rows[0].clone(), rows[2].clone()];
        let outcomes = vec![
            Outcome::Success("A".to_string()),
            Outcome::Failure("timeout".to_string()),
        ];

        let summary = reconcile(&mut schema, &mut rows, &subset, &outcomes, RESULT);

        assert_eq!(summary, MergeSummary { matched: 2, unmatched: 0 });
        assert!(schema.contains("llm_result"));
        assert_eq!(rows[0]["llm_result"], json!("A"));
        assert_eq!(rows[1]["llm_result"], json!(""));
        assert_eq!(rows[2]["llm_result"], json!("[failed] timeout"));
    }

    #[test]
    fn reconcile_unmatched_is_dropped() {
        let mut rows = records(json!([{"t": "a"}]));
        let mut schema = Schema::from_first_record(&rows[0]);
        let subset = records(json!([{"t": "zzz"}]));
        let outcomes = vec![Outcome::Success("A".to_string())];

        let summary = reconcile(&mut schema, &mut rows, &subset, &outcomes, RESULT);

        assert_eq!(summary.unmatched, 1);
        assert_eq!(rows[0]["llm_result"], json!(""));
    }

    #[test]
    fn reconcile_first_duplicate_wins() {
        let mut rows = records(json!([{"t": "same"}, {"t": "same"}]));
        let mut schema = Schema::from_first_record(&rows[0]);
        let subset = vec![rows[1].clone()];
        let outcomes = vec![Outcome::Success("only first".to_string())];

        reconcile(&mut schema, &mut rows, &subset, &outcomes, RESULT);

        assert_eq!(rows[0]["llm_result"], json!("only first"));
        assert_eq!(rows[1]["llm_result"], json!(""));
    }

    #[test]
    fn reconcile_length_mismatch_merges_prefix() {
        let mut rows = records(json!([{"t": "a"}, {"t": "b"}]));
        let mut schema = Schema::from_first_record(&rows[0]);
        let subset = rows.clone();
        let outcomes = vec![Outcome::Success("A".to_string())];

        let summary = reconcile(&mut schema, &mut rows, &subset, &outcomes, RESULT);

        assert_eq!(summary.matched, 1);
        assert_eq!(rows[1]["llm_result"], json!(""));
    }
}
