use super::pipeline_harness::{MockResponder, PipelineBuilder};
use std::sync::Arc;
use std::time::Duration;
use wardgate::delegation::FlowOutcome;
use wardgate::session::HistoryKind;

#[tokio::test]
async fn timeout_restores_histories() {
    let p = PipelineBuilder::new(MockResponder::slow("late", Duration::from_millis(500)))
        .request_timeout(Duration::from_millis(50))
        .build();

    let outcome = p.flow.handle("tina", "Book me a hotel in Paris").await;

    assert_eq!(outcome, FlowOutcome::TimedOut);
    assert_eq!(p.responder.calls(), 1);
    assert!(p.store.history("tina", HistoryKind::Conversation).is_empty());
    assert!(p.store.history("tina", HistoryKind::Guardian).is_empty());
}

#[tokio::test]
async fn timeout_keeps_earlier_turns() {
    let p = PipelineBuilder::new(MockResponder::slow("done", Duration::from_millis(200)))
        .request_timeout(Duration::from_secs(2))
        .build();
    p.flow.handle("uma", "first").await;
    let before = p.store.get_or_create("uma");

    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        p.flow.handle("uma", "second"),
    )
    .await;

    assert!(cancelled.is_err());
    assert_eq!(p.store.get_or_create("uma"), before);
}

#[tokio::test]
async fn same_identity_requests_run_in_order() {
    let p = PipelineBuilder::new(MockResponder::slow("reply", Duration::from_millis(30))).build();
    let flow = Arc::new(p.flow);

    let first = {
        let flow = Arc::clone(&flow);
        tokio::spawn(async move { flow.handle("vera", "one").await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = {
        let flow = Arc::clone(&flow);
        tokio::spawn(async move { flow.handle("vera", "two").await })
    };
    first.await.unwrap();
    second.await.unwrap();

    let contents: Vec<String> = p
        .store
        .history("vera", HistoryKind::Conversation)
        .into_iter()
        .map(|e| e.content)
        .collect();
    assert_eq!(contents, vec!["one", "reply", "two", "reply"]);
    assert_eq!(p.responder.prompts()[1], "one\nreply\ntwo");
}
