use super::pipeline_harness::{MockResponder, PipelineBuilder, ReviewMode};
use wardgate::delegation::FlowOutcome;
use wardgate::guardian::BlockStage;
use wardgate::guardian::verdict::REVIEW_UNAVAILABLE_REASON;
use wardgate::session::HistoryKind;

#[tokio::test]
async fn reviewer_outage_fails_closed_by_default() {
    let p = PipelineBuilder::new(MockResponder::answering("unused", &[]))
        .review(ReviewMode::Fail)
        .build();

    let outcome = p.flow.handle("quinn", "Book me a hotel in Paris").await;

    let FlowOutcome::Blocked(verdict) = &outcome else {
        panic!("expected block, got {outcome:?}");
    };
    assert_eq!(verdict.stage, BlockStage::ContextualReviewer);
    assert_eq!(verdict.reason, REVIEW_UNAVAILABLE_REASON);
    assert_eq!(p.responder.calls(), 0);
    assert!(p.store.history("quinn", HistoryKind::Guardian).is_empty());
}

#[tokio::test]
async fn fail_open_delivers_when_reviewer_is_down() {
    let p = PipelineBuilder::new(MockResponder::answering("Hotel Lutetia", &["HotelAgent"]))
        .review(ReviewMode::Fail)
        .fail_open(true)
        .build();

    let outcome = p.flow.handle("rosa", "Book me a hotel in Paris").await;

    assert_eq!(outcome.user_message(), "Hotel Lutetia");
    // pre, post and the delegation log all tried the reviewer
    assert_eq!(p.reviewer.calls(), 3);
    assert!(p.store.history("rosa", HistoryKind::Guardian).is_empty());
}

#[tokio::test]
async fn fail_open_still_honours_scanners() {
    let p = PipelineBuilder::new(MockResponder::answering("unused", &[]))
        .review(ReviewMode::Fail)
        .fail_open(true)
        .input_valid(false)
        .build();

    let outcome = p.flow.handle("sam", "anything").await;

    assert!(matches!(outcome, FlowOutcome::Blocked(_)));
    assert_eq!(p.responder.calls(), 0);
}
