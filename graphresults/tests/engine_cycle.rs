// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! End-to-end result cycles against a replayed execution endpoint

#[path = "testutils/mod.rs"]
mod testutils;

use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use graphresults::{
    CycleOutcome, EngineConfig, EngineError, GraphData, ListenerError, ResultNotification, RootEntity,
};
use testutils::*;

#[tokio::test]
async fn test_three_rows_reach_result_listener() {
    let h = harness(EngineConfig::default());
    let results = record_results(&h.engine);
    h.client.push_response(response(vec![abc_results()]));

    let outcome = h.engine.update_results().await;
    assert!(matches!(outcome, CycleOutcome::Completed { cycles: 1 }));

    let calls = results.lock();
    assert_eq!(calls.len(), 1);
    let records = calls[0].records();
    assert_eq!(records.len(), 3);
    for (expected, record) in records.iter().enumerate() {
        assert_eq!(record.result_index, expected);
        assert_eq!(record.label, "Person");
    }
    assert_eq!(records[2].attribute("name"), Some(&json!("C")));
    assert!(!h.engine.has_changed());
    assert_eq!(h.engine.last_results().len(), 3);
}

#[tokio::test]
async fn test_unchanged_engine_does_nothing() {
    let h = harness(EngineConfig::default());
    let results = record_results(&h.engine);
    h.client.push_response(response(vec![abc_results()]));

    assert!(h.engine.update_results().await.is_completed());
    assert!(matches!(h.engine.update_results().await, CycleOutcome::Unchanged));

    assert_eq!(h.client.submission_count(), 1);
    assert_eq!(results.lock().len(), 1);
    assert_eq!(h.progress.events.lock().len(), 1);
}

#[tokio::test]
async fn test_mark_changed_reopens_gate() {
    let h = harness(EngineConfig::default());
    h.client.push_response(response(vec![abc_results()]));
    h.client.push_response(response(vec![tabular(&["name"], vec![json!(["Z"])])]));

    assert!(h.engine.update_results().await.is_completed());
    h.model.select(RootEntity::new("Movie", 0));
    h.engine.mark_changed();
    assert!(h.engine.update_results().await.is_completed());

    let last = h.engine.last_results();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].result_index, 0);
    assert_eq!(last[0].label, "Movie");
}

#[tokio::test]
async fn test_rejected_batch_notifies_results_once_with_failure() {
    let h = harness(EngineConfig::default().with_total_count(true));
    let results = record_results(&h.engine);
    let counts = record_counts(&h.engine);
    let graphs = record_graphs(&h.engine);
    h.client.push_failure("connection refused");

    let outcome = h.engine.update_results().await;
    match outcome {
        CycleOutcome::Failed { cycles, cause } => {
            assert_eq!(cycles, 1);
            assert!(cause.is_execution());
        }
        other => panic!("expected failure, got {:?}", other),
    }

    let calls = results.lock();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_failure());
    assert!(calls[0].records().is_empty());
    assert!(counts.lock().is_empty());
    assert!(graphs.lock().is_empty());
    assert!(h.engine.has_changed());
}

#[tokio::test]
async fn test_failed_cycle_is_retried_on_next_trigger() {
    let h = harness(EngineConfig::default());
    let results = record_results(&h.engine);
    h.client.push_failure("timeout");
    h.client.push_response(response(vec![abc_results()]));

    assert!(h.engine.update_results().await.is_failed());
    assert!(h.engine.update_results().await.is_completed());

    let calls = results.lock();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].is_failure());
    assert_eq!(calls[1].records().len(), 3);
    assert!(!h.engine.has_changed());
}

#[tokio::test]
async fn test_count_statement_skipped_when_total_count_disabled() {
    let h = harness(EngineConfig::default());
    let counts = record_counts(&h.engine);
    h.client.push_response(response(vec![abc_results()]));

    assert!(h.engine.update_results().await.is_completed());

    let submitted = h.client.submitted();
    assert_eq!(submitted[0].len(), 1);
    assert!(counts.lock().is_empty());
}

#[tokio::test]
async fn test_count_dispatched_before_results() {
    let h = harness(EngineConfig::default().with_total_count(true));
    let order = Arc::new(Mutex::new(Vec::new()));

    let sink = order.clone();
    h.engine.listeners().on_result_received(move |_: &ResultNotification| {
        sink.lock().push("result".to_string());
        Ok(())
    });
    let sink = order.clone();
    h.engine.listeners().on_total_result_count(move |count: &u64| {
        sink.lock().push(format!("count {}", count));
        Ok(())
    });

    h.client.push_response(response(vec![
        abc_results(),
        tabular(&["count"], vec![json!([57])]),
    ]));

    assert!(h.engine.update_results().await.is_completed());
    assert_eq!(*order.lock(), vec!["count 57".to_string(), "result".to_string()]);

    let batch = &h.client.submitted()[0];
    assert_eq!(batch.len(), 2);
    assert_eq!(
        batch.statements()[1].statement(),
        "MATCH (n:Person) RETURN count(n) AS count"
    );
    assert_eq!(
        h.engine.last_generated_query().unwrap().statement(),
        "MATCH (n:Person) RETURN count(n) AS count"
    );
}

#[tokio::test]
async fn test_missing_count_row_takes_failure_path() {
    let h = harness(EngineConfig::default().with_total_count(true));
    let results = record_results(&h.engine);
    let counts = record_counts(&h.engine);
    h.client
        .push_response(response(vec![abc_results(), tabular(&["count"], vec![])]));

    let outcome = h.engine.update_results().await;
    match outcome {
        CycleOutcome::Failed { cause, .. } => {
            assert!(matches!(cause.as_ref(), EngineError::Parse(_)))
        }
        other => panic!("expected parse failure, got {:?}", other),
    }

    let calls = results.lock();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].is_failure());
    assert!(counts.lock().is_empty());
    assert!(h.engine.has_changed());
    assert!(h.engine.last_results().is_empty());
}

#[tokio::test]
async fn test_graph_rows_deduplicated_first_seen_wins() {
    let h = harness(EngineConfig::default());
    let graphs = record_graphs(&h.engine);
    let order = Arc::new(Mutex::new(Vec::new()));
    let sink = order.clone();
    h.engine.listeners().on_result_received(move |_: &ResultNotification| {
        sink.lock().push("result");
        Ok(())
    });
    let sink = order.clone();
    h.engine.listeners().on_graph_result_received(move |_: &GraphData| {
        sink.lock().push("graph");
        Ok(())
    });

    h.client.push_response(response(vec![
        abc_results(),
        graph_result(vec![
            (json!([{"id": "n1", "name": "first"}]), json!([])),
            (
                json!([{"id": "n1", "name": "second"}, {"id": "n2"}]),
                json!([{"id": "r1", "type": "KNOWS"}]),
            ),
        ]),
    ]));

    assert!(h.engine.update_results().await.is_completed());

    let calls = graphs.lock();
    assert_eq!(calls.len(), 1);
    let graph = &calls[0];
    let n1: Vec<_> = graph.nodes.iter().filter(|n| n.id.as_str() == "n1").collect();
    assert_eq!(n1.len(), 1);
    assert_eq!(n1[0].properties["name"], json!("first"));
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(*order.lock(), vec!["result", "graph"]);

    let batch = &h.client.submitted()[0];
    assert_eq!(batch.statements()[1].statement(), "MATCH p=(n:Person)--() RETURN p");
}

#[tokio::test]
async fn test_positions_follow_inclusion_order_with_all_statements() {
    let h = harness(EngineConfig::default().with_total_count(true));
    let counts = record_counts(&h.engine);
    let graphs = record_graphs(&h.engine);
    h.client.push_response(response(vec![
        abc_results(),
        graph_result(vec![(json!([{"id": 1}]), json!([]))]),
        tabular(&["count"], vec![json!([3])]),
    ]));

    assert!(h.engine.update_results().await.is_completed());
    assert_eq!(*counts.lock(), vec![3]);
    assert_eq!(graphs.lock()[0].nodes[0].id.as_str(), "1");
    assert_eq!(h.client.submitted()[0].len(), 3);
}

#[tokio::test]
async fn test_short_response_is_a_parse_failure() {
    let h = harness(EngineConfig::default());
    let results = record_results(&h.engine);
    record_graphs(&h.engine);
    h.client.push_response(response(vec![abc_results()]));

    let outcome = h.engine.update_results().await;
    assert!(outcome.is_failed());
    assert!(results.lock()[0].is_failure());
}

#[tokio::test]
async fn test_failing_result_listener_does_not_block_siblings() {
    let h = harness(EngineConfig::default());
    h.engine
        .listeners()
        .on_result_received(|_: &ResultNotification| -> Result<(), ListenerError> {
            Err(ListenerError::new("render failed"))
        });
    h.engine
        .listeners()
        .on_result_received(|_: &ResultNotification| -> Result<(), ListenerError> {
            panic!("subscriber bug")
        });
    let results = record_results(&h.engine);
    h.client.push_response(response(vec![abc_results()]));

    assert!(h.engine.update_results().await.is_completed());
    assert_eq!(results.lock().len(), 1);
    assert_eq!(h.engine.listeners().failure_count(), 2);
    assert!(!h.engine.has_changed());
}

#[tokio::test]
async fn test_reserved_channels_never_notified() {
    let h = harness(EngineConfig::default().with_total_count(true));
    record_counts(&h.engine);
    record_graphs(&h.engine);
    let reserved = Arc::new(Mutex::new(Vec::new()));
    let sink = reserved.clone();
    h.engine
        .listeners()
        .on_result_relation_received(move |value: &Value| {
            sink.lock().push(("relation", value.clone()));
            Ok(())
        });
    let sink = reserved.clone();
    h.engine.listeners().on_result_value_received(move |value: &Value| {
        sink.lock().push(("value", value.clone()));
        Ok(())
    });

    h.client.push_response(response(vec![
        abc_results(),
        graph_result(vec![(json!([{"id": "n1"}]), json!([]))]),
        tabular(&["count"], vec![json!([3])]),
    ]));
    h.client.push_failure("connection reset");

    assert!(h.engine.update_results().await.is_completed());
    h.engine.mark_changed();
    assert!(h.engine.update_results().await.is_failed());
    h.engine.update_results_count();

    assert!(reserved.lock().is_empty());
    assert_eq!(h.engine.listeners().failure_count(), 0);
}

#[tokio::test]
async fn test_unsubscribed_listener_is_not_called() {
    let h = harness(EngineConfig::default());
    let results = record_results(&h.engine);
    let calls = Arc::new(Mutex::new(0usize));
    let sink = calls.clone();
    let subscription = h
        .engine
        .listeners()
        .on_result_received(move |_: &ResultNotification| {
            *sink.lock() += 1;
            Ok(())
        });
    assert!(h.engine.listeners().unsubscribe(&subscription));
    h.client.push_response(response(vec![abc_results()]));

    assert!(h.engine.update_results().await.is_completed());
    assert_eq!(*calls.lock(), 0);
    assert_eq!(results.lock().len(), 1);
}

#[tokio::test]
async fn test_loading_event_lists_every_statement() {
    let h = harness(EngineConfig::default().with_total_count(true));
    record_counts(&h.engine);
    h.client.push_response(response(vec![
        abc_results(),
        tabular(&["count"], vec![json!([3])]),
    ]));

    assert!(h.engine.update_results().await.is_completed());

    let events = h.progress.events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].statements,
        vec![
            "MATCH (n:Person) RETURN n.name AS name".to_string(),
            "MATCH (n:Person) RETURN count(n) AS count".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_display_updated_only_when_active() {
    let h = harness(EngineConfig::default().with_page_size(2));
    h.client.push_response(response(vec![abc_results()]));
    h.client.push_response(response(vec![abc_results()]));

    assert!(h.engine.update_results().await.is_completed());
    assert!(h.display.elements().is_empty());

    h.engine.set_active(true);
    h.engine.mark_changed();
    assert!(h.engine.update_results().await.is_completed());

    let elements = h.display.elements();
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].id, "results-0");
    assert_eq!(elements[1].id, "results-1");
    assert_eq!(elements[0].lines, vec!["name: A".to_string()]);
}

#[tokio::test]
async fn test_page_size_caps_display_not_listeners() {
    let h = harness(EngineConfig::default().with_active(true));
    h.engine.set_page_size(NonZeroUsize::new(1).unwrap());
    let results = record_results(&h.engine);
    h.client.push_response(response(vec![abc_results()]));

    assert!(h.engine.update_results().await.is_completed());
    assert_eq!(h.display.elements().len(), 1);
    assert_eq!(results.lock()[0].records().len(), 3);
}

#[tokio::test]
async fn test_pre_query_uses_last_result_ids() {
    let h = harness(EngineConfig::default());
    h.client.push_response(response(vec![tabular(
        &["id", "name"],
        vec![json!([11, "A"]), json!([12, "B"])],
    )]));

    assert!(h.engine.update_results().await.is_completed());

    let pre = h.engine.generate_pre_query();
    assert_eq!(pre.query, "MATCH (d) WHERE d.id IN $ids WITH d");
    assert_eq!(pre.param.ids, vec![json!(11), json!(12)]);
}

#[tokio::test]
async fn test_update_results_count_uses_root_entity() {
    let h = harness(EngineConfig::default());
    assert_eq!(h.engine.update_results_count().delivered, 0);

    let counts = record_counts(&h.engine);
    h.model.select(RootEntity::new("Person", 128));

    let report = h.engine.update_results_count();
    assert_eq!(report.delivered, 1);
    assert_eq!(*counts.lock(), vec![128]);
    assert_eq!(h.client.submission_count(), 0);
}

#[tokio::test]
async fn test_endpoint_errors_take_failure_path() {
    let h = harness(EngineConfig::default());
    let results = record_results(&h.engine);
    h.client.push_response(json!({
        "results": [],
        "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "Invalid input"}]
    }));

    let outcome = h.engine.update_results().await;
    assert!(outcome.is_failed());
    let calls = results.lock();
    let cause = calls[0].cause().expect("failure carries its cause");
    assert!(cause.is_execution());
}
