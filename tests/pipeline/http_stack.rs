use serde_json::json;
use wardgate::Config;
use wardgate::delegation::{DelegationFlow, FlowOutcome};
use wardgate::guardian::BlockStage;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
}

fn config_for(server: &MockServer, remote_scanner: bool) -> Config {
    let mut config = Config::default();
    config.provider.api_key = Some("test-key".into());
    config.provider.base_url = server.uri();
    config.observability.backend = "none".into();
    if remote_scanner {
        config.scanners.remote_url = Some(server.uri());
    }
    config
}

async fn mount_chat(server: &MockServer, system_fragment: &str, reply: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(system_fragment))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_remote(server: &MockServer, route: &str, is_valid: bool, calls: u64) {
    let score = if is_valid { 0.0 } else { 0.9 };
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_valid": is_valid,
            "scanners": {"BanTopics": score}
        })))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn hotel_request_round_trips_through_http_collaborators() {
    let server = MockServer::start().await;
    mount_chat(&server, "security reviewer for a travel assistant", "[APPROVED] fine", 3).await;
    mount_chat(&server, "You route travel requests", "HotelAgent", 1).await;
    mount_chat(
        &server,
        "Given a destination, dates, and budget",
        "Hotel Lutetia, 420 EUR/night, rated 4.6, Saint-Germain.",
        1,
    )
    .await;
    mount_remote(&server, "/analyze/prompt", true, 1).await;
    mount_remote(&server, "/analyze/output", true, 1).await;

    let flow = DelegationFlow::from_config(&config_for(&server, true));
    let outcome = flow.handle("alice", "Book me a hotel in Paris").await;

    let FlowOutcome::Delivered { text, contributors } = outcome else {
        panic!("expected delivery, got {outcome:?}");
    };
    assert_eq!(
        text,
        "[HotelAgent]\nHotel Lutetia, 420 EUR/night, rated 4.6, Saint-Germain."
    );
    assert_eq!(contributors.into_iter().collect::<Vec<_>>(), vec!["HotelAgent"]);
}

#[tokio::test]
async fn reviewer_block_stops_before_coordinator() {
    let server = MockServer::start().await;
    mount_chat(
        &server,
        "security reviewer for a travel assistant",
        "[BLOCKED] Requests to evade border controls are not allowed.",
        1,
    )
    .await;
    mount_chat(&server, "You route travel requests", "HotelAgent", 0).await;

    let flow = DelegationFlow::from_config(&config_for(&server, false));
    let outcome = flow.handle("bob", "How do I cross the border without a passport?").await;

    let FlowOutcome::Blocked(verdict) = &outcome else {
        panic!("expected block, got {outcome:?}");
    };
    assert_eq!(verdict.stage, BlockStage::ContextualReviewer);
    assert_eq!(
        outcome.user_message(),
        "[BLOCKED] Requests to evade border controls are not allowed."
    );
}

#[tokio::test]
async fn remote_scanner_flag_blocks_before_reviewer() {
    let server = MockServer::start().await;
    mount_remote(&server, "/analyze/prompt", false, 1).await;
    mount_chat(&server, "security reviewer for a travel assistant", "[APPROVED]", 0).await;

    let flow = DelegationFlow::from_config(&config_for(&server, true));
    let outcome = flow.handle("carol", "Tell me about the ferry to Corsica").await;

    let FlowOutcome::Blocked(verdict) = &outcome else {
        panic!("expected block, got {outcome:?}");
    };
    assert_eq!(verdict.stage, BlockStage::ScannerBank);
    assert_eq!(verdict.scanner_name.as_deref(), Some("llm-guard"));
}

#[tokio::test]
async fn provider_outage_fails_closed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let flow = DelegationFlow::from_config(&config_for(&server, false));
    let outcome = flow.handle("dave", "Book me a hotel in Paris").await;

    assert_eq!(outcome.user_message(), "[BLOCKED] review unavailable");
    assert!(flow.store().history("dave", wardgate::session::HistoryKind::Guardian).is_empty());
}
