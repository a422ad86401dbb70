use super::pipeline_harness::{MockResponder, PipelineBuilder};
use wardgate::delegation::FlowOutcome;
use wardgate::guardian::DELEGATION_NOTICE;
use wardgate::session::{HistoryKind, Role};

#[tokio::test]
async fn hotel_request_is_delivered_and_logged_once() {
    let responder = MockResponder::answering(
        "[HotelAgent]\nHotel Lutetia, 420 EUR/night, Saint-Germain.",
        &["HotelAgent"],
    );
    let p = PipelineBuilder::new(responder).build();

    let outcome = p.flow.handle("alice", "Book me a hotel in Paris").await;

    let FlowOutcome::Delivered { text, contributors } = outcome else {
        panic!("expected delivery, got {outcome:?}");
    };
    assert_eq!(text, "[HotelAgent]\nHotel Lutetia, 420 EUR/night, Saint-Germain.");
    assert!(contributors.contains("HotelAgent"));

    // pre-check, post-check, delegation log
    assert_eq!(p.reviewer.calls(), 3);
    assert_eq!(p.reviewer.delegation_reviews(), 1);
    assert_eq!(p.responder.calls(), 1);

    let conversation = p.store.history("alice", HistoryKind::Conversation);
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation[0].role, Role::User);
    assert_eq!(conversation[0].content, "Book me a hotel in Paris");
    assert_eq!(conversation[1].role, Role::Assistant);

    let guardian = p.store.history("alice", HistoryKind::Guardian);
    assert_eq!(guardian.len(), 6);
    let notices = guardian
        .iter()
        .filter(|e| e.role == Role::User && e.content == DELEGATION_NOTICE)
        .count();
    assert_eq!(notices, 1);
}

#[tokio::test]
async fn direct_answer_skips_delegation_log() {
    let responder = MockResponder::answering("Paris is lovely in spring.", &[]);
    let p = PipelineBuilder::new(responder).build();

    let outcome = p.flow.handle("bob", "When should I visit Paris?").await;

    assert!(matches!(outcome, FlowOutcome::Delivered { ref contributors, .. } if contributors.is_empty()));
    assert_eq!(p.reviewer.calls(), 2);
    assert_eq!(p.reviewer.delegation_reviews(), 0);
}

#[tokio::test]
async fn approval_markers_are_stripped_from_delivery() {
    let responder = MockResponder::answering("[APPROVED] Paris is lovely in spring.", &[]);
    let p = PipelineBuilder::new(responder).build();

    let outcome = p.flow.handle("carol", "When should I visit Paris?").await;

    assert_eq!(outcome.user_message(), "Paris is lovely in spring.");
}

#[tokio::test]
async fn responder_sees_full_conversation_history() {
    let responder = MockResponder::answering("Noted.", &[]);
    let p = PipelineBuilder::new(responder).build();

    p.flow.handle("dave", "I like quiet hotels").await;
    p.flow.handle("dave", "Now find one in Lyon").await;

    let prompts = p.responder.prompts();
    assert_eq!(prompts[0], "I like quiet hotels");
    assert_eq!(prompts[1], "I like quiet hotels\nNoted.\nNow find one in Lyon");
}

#[tokio::test]
async fn identities_keep_separate_histories() {
    let responder = MockResponder::answering("Sure.", &[]);
    let p = PipelineBuilder::new(responder).build();

    p.flow.handle("erin", "first").await;
    p.flow.handle("frank", "second").await;

    assert_eq!(p.store.history("erin", HistoryKind::Conversation).len(), 2);
    assert_eq!(p.store.history("frank", HistoryKind::Conversation)[0].content, "second");
    assert_eq!(p.store.identity_count(), 2);
}

#[tokio::test]
async fn conversation_history_stays_within_limit() {
    let responder = MockResponder::answering("ok", &[]);
    let p = PipelineBuilder::new(responder).build();

    for i in 0..8 {
        p.flow.handle("gina", &format!("message {i}")).await;
    }

    let conversation = p.store.history("gina", HistoryKind::Conversation);
    assert_eq!(conversation.len(), 10);
    assert_eq!(conversation[0].content, "message 3");
    assert_eq!(conversation[9].content, "ok");
    assert!(p.store.history("gina", HistoryKind::Guardian).len() <= 10);
}

#[tokio::test]
async fn responder_failure_returns_generic_error_without_post_check() {
    let p = PipelineBuilder::new(MockResponder::failing()).build();

    let outcome = p.flow.handle("hank", "Book me a hotel in Rome").await;

    let FlowOutcome::SystemError { message } = outcome else {
        panic!("expected system error, got {outcome:?}");
    };
    assert!(!message.contains("sk-"));
    assert_eq!(p.reviewer.calls(), 1);
    assert_eq!(p.output_scanner.calls(), 0);

    // No orphaned user turn; the approved pre-check review stays on record.
    assert!(p.store.history("hank", HistoryKind::Conversation).is_empty());
    assert_eq!(p.store.history("hank", HistoryKind::Guardian).len(), 2);
}

#[tokio::test]
async fn failed_turn_is_absent_from_next_prompt() {
    let p = PipelineBuilder::new(MockResponder::failing()).build();
    p.flow.handle("ida", "Book me a hotel in Rome").await;
    p.flow.handle("ida", "Actually, Florence").await;

    assert_eq!(p.responder.prompts()[1], "Actually, Florence");
}
