//! Moderation on both sides of the responder layer.
//!
//! Each check runs the scanner bank, then the static filter, then the
//! contextual reviewer. The first stage that blocks decides the verdict and
//! later stages are skipped.

pub mod reviewer;
pub mod verdict;

pub use reviewer::ContextualReviewer;
pub use verdict::{
    BlockStage, BlockedVerdict, GuardianVerdict, parse_review, strip_approval_markers,
};

use crate::config::GuardianConfig;
use crate::observability::{GatewayEvent, NoopObserver, Observer};
use crate::scan::{Direction, ScannerBank, StaticFilter};
use crate::session::{ConversationStore, HistoryKind, join_user_contents};
use sha2::{Digest, Sha256};
use std::sync::Arc;

pub const DELEGATION_NOTICE: &str = "Delegating to another agent";

/// Hex SHA-256 of `text`; stands in for blocked content in logs.
pub fn content_digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// The deterministic stages: scanner bank, then static filter. `prompt` is
/// set for outputs only.
pub async fn screen(
    bank: &ScannerBank,
    static_filter: &StaticFilter,
    prompt: Option<&str>,
    text: &str,
) -> Option<BlockedVerdict> {
    let scan = match prompt {
        Some(prompt) => bank.scan_output(prompt, text).await,
        None => bank.scan_input(text).await,
    };
    match scan {
        Some(verdict) => Some(BlockedVerdict::from_scan(&verdict)),
        None => BlockedVerdict::from_static(&static_filter.check(text)),
    }
}

pub struct Guardian {
    bank: Arc<ScannerBank>,
    static_filter: StaticFilter,
    reviewer: ContextualReviewer,
    store: Arc<ConversationStore>,
    observer: Arc<dyn Observer>,
    reviewer_fail_open: bool,
}

impl Guardian {
    pub fn new(
        bank: Arc<ScannerBank>,
        static_filter: StaticFilter,
        reviewer: ContextualReviewer,
        store: Arc<ConversationStore>,
    ) -> Self {
        Self {
            bank,
            static_filter,
            reviewer,
            store,
            observer: Arc::new(NoopObserver),
            reviewer_fail_open: false,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_config(mut self, config: &GuardianConfig) -> Self {
        self.reviewer_fail_open = config.reviewer_fail_open;
        self
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Moderate a user prompt before it reaches the responder layer.
    pub async fn pre_check(&self, identity: &str, prompt: &str) -> GuardianVerdict {
        tracing::debug!(identity = %identity, "guardian.pre_check");
        if let Some(blocked) = screen(&self.bank, &self.static_filter, None, prompt).await {
            return self.blocked(Direction::Input, identity, prompt, blocked);
        }
        self.review(Direction::Input, identity, prompt).await
    }

    /// Moderate a responder output. Output scanners see every user turn of
    /// the identity's conversation history as the originating prompt.
    pub async fn post_check(&self, identity: &str, output: &str) -> GuardianVerdict {
        tracing::debug!(identity = %identity, "guardian.post_check");
        let history = self.store.history(identity, HistoryKind::Conversation);
        let prompt = join_user_contents(&history);
        if let Some(blocked) = screen(&self.bank, &self.static_filter, Some(&prompt), output).await {
            return self.blocked(Direction::Output, identity, output, blocked);
        }
        self.review(Direction::Output, identity, output).await
    }

    /// Record a delegation in the guardian history. The verdict is returned
    /// for audit only and never gates delivery.
    pub async fn log_delegation(&self, identity: &str) -> GuardianVerdict {
        tracing::info!(identity = %identity, "guardian.log_delegation");
        match self.reviewer.review(identity, DELEGATION_NOTICE).await {
            Ok(text) => parse_review(&text),
            Err(error) => {
                tracing::warn!(identity = %identity, error = %error, "guardian.delegation_review_failed");
                self.observer.record_event(&GatewayEvent::ReviewFailed {
                    identity: identity.to_string(),
                });
                BlockedVerdict::review_unavailable().into()
            }
        }
    }

    async fn review(&self, direction: Direction, identity: &str, text: &str) -> GuardianVerdict {
        let verdict = match self.reviewer.review(identity, text).await {
            Ok(answer) => parse_review(&answer),
            Err(error) => {
                self.observer.record_event(&GatewayEvent::ReviewFailed {
                    identity: identity.to_string(),
                });
                if self.reviewer_fail_open {
                    tracing::warn!(
                        identity = %identity,
                        direction = %direction,
                        error = %error,
                        "guardian.reviewer_fail_open"
                    );
                    return GuardianVerdict::approved();
                }
                BlockedVerdict::review_unavailable().into()
            }
        };

        match verdict {
            GuardianVerdict::Blocked(blocked) => self.blocked(direction, identity, text, blocked),
            approved => {
                tracing::info!(identity = %identity, direction = %direction, "guardian.approved");
                approved
            }
        }
    }

    fn blocked(
        &self,
        direction: Direction,
        identity: &str,
        text: &str,
        blocked: BlockedVerdict,
    ) -> GuardianVerdict {
        tracing::warn!(
            identity = %identity,
            direction = %direction,
            stage = %blocked.stage,
            scanner = blocked.scanner_name.as_deref().unwrap_or("-"),
            risk_score = blocked.risk_score.unwrap_or(0.0),
            content_sha256 = %content_digest(text),
            content_chars = text.chars().count(),
            "guardian.blocked"
        );
        self.observer.record_event(&GatewayEvent::StageBlocked {
            direction,
            stage: blocked.stage,
        });
        blocked.into()
    }
}
