use annotator_core::{BatchDispatcher, Outcome, RowStore, FAILURE_MARKER_PREFIX};
use annotator_core::reconciler::ResultColumn;
use annotator_test_utils::{
    five_records, records_from_json, setup_test_workbench, ScriptedGenerator,
    UnreachableGenerator,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

const RESULT: ResultColumn<'static> = ResultColumn {
    key: "llm_result",
    label: "LLM Result",
};

#[tokio::test]
async fn outcomes_follow_input_order_not_completion_order() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .respond("p alpha", "A")
            .respond("p beta", "B")
            .respond("p gamma", "C")
            .delay("p alpha", 60)
            .delay("p beta", 30),
    );
    let dispatcher = BatchDispatcher::new(generator.clone());
    let records = records_from_json(json!([
        {"title": "alpha"},
        {"title": "beta"},
        {"title": "gamma"}
    ]));

    let report = dispatcher.process(&records, "p {title}").await;

    assert_eq!(
        generator.completions().await,
        vec!["p gamma", "p beta", "p alpha"]
    );
    assert_eq!(
        report.outcomes,
        vec![
            Outcome::Success("A".to_string()),
            Outcome::Success("B".to_string()),
            Outcome::Success("C".to_string()),
        ]
    );
}

#[tokio::test]
async fn calls_run_concurrently() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .delay("1", 200)
            .delay("2", 200)
            .delay("3", 200)
            .delay("4", 200),
    );
    let dispatcher = BatchDispatcher::new(generator);
    let records = records_from_json(json!([{"n": 1}, {"n": 2}, {"n": 3}, {"n": 4}]));

    let started = std::time::Instant::now();
    let report = dispatcher.process(&records, "{n}").await;

    assert_eq!(report.outcomes.len(), 4);
    assert!(started.elapsed() < std::time::Duration::from_millis(700));
}

#[tokio::test]
async fn one_failure_leaves_siblings_successful() {
    let generator = Arc::new(ScriptedGenerator::new().fail("gamma", "overloaded"));
    let dispatcher = BatchDispatcher::new(generator);

    let report = dispatcher.process(&five_records(), "{title}").await;

    assert_eq!(report.outcomes.len(), 5);
    for (index, outcome) in report.outcomes.iter().enumerate() {
        if index == 2 {
            assert!(!outcome.is_success());
        } else {
            assert!(outcome.is_success(), "record {index} should succeed");
        }
    }
}

#[tokio::test]
async fn transport_failures_become_outcomes() {
    let dispatcher = BatchDispatcher::new(Arc::new(UnreachableGenerator));

    let report = dispatcher.process(&five_records(), "{title}").await;

    assert_eq!(report.failed(), 5);
    assert_eq!(
        report.outcomes[0],
        Outcome::Failure("transport failure: connection refused".to_string())
    );
}

#[test]
fn merge_populates_only_selected_rows() {
    let mut store = RowStore::new();
    store.load(&five_records());
    let subset = store.selection(&[1, 3]).unwrap();
    let outcomes = vec![
        Outcome::Success("B".to_string()),
        Outcome::Success("D".to_string()),
    ];

    let summary = store.merge_results(&subset, &outcomes, RESULT);

    assert_eq!(summary.matched, 2);
    let results: Vec<_> = store
        .rows()
        .iter()
        .map(|row| row["llm_result"].clone())
        .collect();
    assert_eq!(
        results,
        vec![json!(""), json!("B"), json!(""), json!("D"), json!("")]
    );
    for (row, original) in store.rows().iter().zip(five_records()) {
        for (key, value) in &original {
            assert_eq!(&row[key], value);
        }
    }
}

#[test]
fn identical_rows_only_first_receives_outcome() {
    let mut store = RowStore::new();
    store.load(&records_from_json(json!([
        {"title": "twin"},
        {"title": "twin"},
        {"title": "other"}
    ])));
    let subset = store.selection(&[1]).unwrap();

    store.merge_results(&subset, &[Outcome::Success("X".to_string())], RESULT);

    assert_eq!(store.get_cell(0, "llm_result").unwrap(), Some(&json!("X")));
    assert_eq!(store.get_cell(1, "llm_result").unwrap(), Some(&json!("")));
}

#[tokio::test]
async fn end_to_end_translation() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .respond("Translate Hi to French", "Bonjour")
            .fail("Translate Bye to French", "quota exceeded"),
    );
    let mut bench = setup_test_workbench(generator.clone());
    bench.load_json(r#"[{"title":"Hi"},{"title":"Bye"}]"#).unwrap();

    let summary = bench
        .process_selection(&[0, 1], "Translate {title} to French")
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(generator.calls().await.len(), 2);

    let rows = bench.store().rows();
    assert_eq!(rows[0]["llm_result"], json!("Bonjour"));
    let marker = rows[1]["llm_result"].as_str().unwrap();
    assert!(marker.starts_with(FAILURE_MARKER_PREFIX));
    assert!(marker.contains("quota exceeded"));
    assert_eq!(bench.store().schema().keys(), vec!["title", "llm_result"]);
    assert!(bench.has_changes());
}

#[tokio::test]
async fn second_batch_overwrites_previous_results() {
    let generator = Arc::new(ScriptedGenerator::new());
    let mut bench = setup_test_workbench(generator);
    bench.load(&five_records());

    bench.process_selection(&[0, 1], "first {title}").await.unwrap();
    let summary = bench.process_selection(&[1, 2], "second {title}").await.unwrap();

    assert_eq!(summary.merge.matched, 2);
    let rows = bench.store().rows();
    assert_eq!(rows[0]["llm_result"], json!("first alpha"));
    assert_eq!(rows[1]["llm_result"], json!("second beta"));
    assert_eq!(rows[2]["llm_result"], json!("second gamma"));
    assert_eq!(bench.store().schema().len(), 4);
}

#[tokio::test]
async fn result_placeholder_sees_previous_result() {
    let mut bench = setup_test_workbench(Arc::new(ScriptedGenerator::new()));
    bench.load(&records_from_json(json!([{"title": "Hi"}])));

    bench.process_all("draft {title}").await.unwrap();
    bench.process_all("refine {llm_result}").await.unwrap();

    assert_eq!(
        bench.store().rows()[0]["llm_result"],
        json!("refine draft Hi")
    );
}
