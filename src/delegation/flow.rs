use super::coordinator::CoordinatorResponder;
use super::responder::Responder;
use crate::config::Config;
use crate::guardian::reviewer::{REVIEWER_INSTRUCTIONS, REVIEWER_NAME};
use crate::guardian::{
    BlockedVerdict, ContextualReviewer, Guardian, GuardianVerdict, strip_approval_markers,
};
use crate::llm::scrub::sanitize_api_error;
use crate::llm::{AgentHandle, create_provider};
use crate::observability::{GatewayEvent, NoopObserver, Observer, create_observer};
use crate::scan::{ScannerBank, StaticFilter};
use crate::session::{ConversationStore, HistoryCheckpoint, HistoryKind, Role, join_contents};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const SYSTEM_ERROR_MESSAGE: &str =
    "System error: the assistant is unavailable right now. Please try again.";
pub const TIMED_OUT_MESSAGE: &str = "The request took too long and was cancelled. Please try again.";

/// Result of one request through the delegation flow.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    Delivered {
        text: String,
        contributors: BTreeSet<String>,
    },
    Blocked(BlockedVerdict),
    SystemError {
        message: String,
    },
    TimedOut,
}

impl FlowOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::Blocked(_) => "blocked",
            Self::SystemError { .. } => "system_error",
            Self::TimedOut => "timed_out",
        }
    }

    /// Text shown to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Delivered { text, .. } => text.clone(),
            Self::Blocked(blocked) => blocked.to_string(),
            Self::SystemError { message } => message.clone(),
            Self::TimedOut => TIMED_OUT_MESSAGE.to_string(),
        }
    }
}

/// Restores an identity's histories unless disarmed. Covers both the
/// timeout path and the caller dropping the request future.
struct RollbackGuard<'a> {
    store: &'a ConversationStore,
    checkpoint: Option<HistoryCheckpoint>,
}

impl<'a> RollbackGuard<'a> {
    fn new(store: &'a ConversationStore, checkpoint: HistoryCheckpoint) -> Self {
        Self {
            store,
            checkpoint: Some(checkpoint),
        }
    }

    fn disarm(&mut self) {
        self.checkpoint = None;
    }
}

impl Drop for RollbackGuard<'_> {
    fn drop(&mut self) {
        if let Some(checkpoint) = self.checkpoint.take() {
            tracing::warn!(identity = %checkpoint.identity(), "flow.rolled_back");
            self.store.restore(&checkpoint);
        }
    }
}

/// Guarded request path: pre-check, respond, post-check, deliver.
pub struct DelegationFlow {
    guardian: Arc<Guardian>,
    responder: Arc<dyn Responder>,
    store: Arc<ConversationStore>,
    observer: Arc<dyn Observer>,
    request_timeout: Duration,
}

impl DelegationFlow {
    pub fn new(
        guardian: Arc<Guardian>,
        responder: Arc<dyn Responder>,
        store: Arc<ConversationStore>,
    ) -> Self {
        Self {
            guardian,
            responder,
            store,
            observer: Arc::new(NoopObserver),
            request_timeout: Duration::from_secs(180),
        }
    }

    /// Wire the full pipeline from config: one store, one provider shared by
    /// the reviewer and the coordinator, one observer.
    pub fn from_config(config: &Config) -> Self {
        let observer = create_observer(&config.observability);
        let store = Arc::new(ConversationStore::from_config(&config.session));
        let provider = create_provider(&config.provider);

        let bank = ScannerBank::from_config(&config.scanners).with_observer(observer.clone());
        let reviewer_agent = AgentHandle::new(
            REVIEWER_NAME,
            REVIEWER_INSTRUCTIONS,
            provider.clone(),
            config.provider.reviewer_model(),
            0.0,
        );
        let guardian = Guardian::new(
            Arc::new(bank),
            StaticFilter::from_config(&config.static_filter),
            ContextualReviewer::new(reviewer_agent, store.clone()),
            store.clone(),
        )
        .with_config(&config.guardian)
        .with_observer(observer.clone());

        let responder = CoordinatorResponder::with_default_specialists(
            provider,
            &config.provider.model,
            config.provider.temperature,
        );

        Self::new(Arc::new(guardian), Arc::new(responder), store)
            .with_observer(observer)
            .with_request_timeout(Duration::from_secs(config.guardian.request_timeout_secs))
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Handle one user message for `identity`.
    ///
    /// Requests for the same identity run one at a time. If the request
    /// times out or this future is dropped, the identity's histories are
    /// restored to their state before the request.
    pub async fn handle(&self, identity: &str, input: &str) -> FlowOutcome {
        let started = Instant::now();
        let _request = self.store.lock_identity(identity).await;
        let mut rollback = RollbackGuard::new(&self.store, self.store.checkpoint(identity));

        let outcome =
            match tokio::time::timeout(self.request_timeout, self.run(identity, input)).await {
                Ok(outcome) => {
                    rollback.disarm();
                    outcome
                }
                Err(_) => {
                    tracing::warn!(
                        identity = %identity,
                        timeout_secs = self.request_timeout.as_secs(),
                        "flow.timed_out"
                    );
                    FlowOutcome::TimedOut
                }
            };
        drop(rollback);

        self.observer.record_event(&GatewayEvent::RequestEnd {
            duration: started.elapsed(),
            outcome: outcome.label(),
        });
        outcome
    }

    async fn run(&self, identity: &str, input: &str) -> FlowOutcome {
        if let GuardianVerdict::Blocked(blocked) = self.guardian.pre_check(identity, input).await {
            return FlowOutcome::Blocked(blocked);
        }

        // Keeps the approved pre-check review, drops the user turn on failure.
        let before_turn = self.store.checkpoint(identity);
        self.store
            .append(identity, HistoryKind::Conversation, Role::User, input);
        let prompt = join_contents(&self.store.history(identity, HistoryKind::Conversation));
        tracing::debug!(
            identity = %identity,
            responder = %self.responder.name(),
            prompt_chars = prompt.chars().count(),
            "flow.respond"
        );

        let output = match self.responder.respond(&prompt).await {
            Ok(output) => output,
            Err(error) => {
                tracing::error!(
                    identity = %identity,
                    responder = %self.responder.name(),
                    error = %sanitize_api_error(&error.to_string()),
                    "flow.responder_failed"
                );
                self.observer.record_event(&GatewayEvent::ResponderFailed {
                    responder: self.responder.name().to_string(),
                });
                self.store.restore(&before_turn);
                return FlowOutcome::SystemError {
                    message: SYSTEM_ERROR_MESSAGE.to_string(),
                };
            }
        };

        self.store.append(
            identity,
            HistoryKind::Conversation,
            Role::Assistant,
            output.text.as_str(),
        );

        if let GuardianVerdict::Blocked(blocked) =
            self.guardian.post_check(identity, &output.text).await
        {
            return FlowOutcome::Blocked(blocked);
        }

        if output.delegated() {
            self.observer.record_event(&GatewayEvent::Delegation {
                identity: identity.to_string(),
                contributors: output.contributors.iter().cloned().collect(),
            });
            self.guardian.log_delegation(identity).await;
        }

        FlowOutcome::Delivered {
            text: strip_approval_markers(&output.text).trim().to_string(),
            contributors: output.contributors,
        }
    }
}
