use crate::scan::{ScanVerdict, StaticVerdict};
use serde::Serialize;
use strum::Display;

pub const APPROVED_MARKER: &str = "[APPROVED";
pub const DELEGATION_MARKER: &str = "[APPROVED - delegation]";
const BLOCKED_MARKER: &str = "[BLOCKED]";
pub const REVIEW_UNAVAILABLE_REASON: &str = "review unavailable";
const EMPTY_REVIEW_REASON: &str = "reviewer returned no verdict";

/// Which guardian stage produced a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum BlockStage {
    ScannerBank,
    StaticFilter,
    ContextualReviewer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockedVerdict {
    pub reason: String,
    pub stage: BlockStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f32>,
}

impl BlockedVerdict {
    pub fn new(stage: BlockStage, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            stage,
            scanner_name: None,
            risk_score: None,
        }
    }

    pub fn from_scan(verdict: &ScanVerdict) -> Self {
        Self {
            reason: format!("{} scanner flagged the content.", verdict.scanner_name),
            stage: BlockStage::ScannerBank,
            scanner_name: Some(verdict.scanner_name.clone()),
            risk_score: Some(verdict.risk_score),
        }
    }

    /// `None` when the static filter passed.
    pub fn from_static(verdict: &StaticVerdict) -> Option<Self> {
        verdict.blocked.then(|| {
            Self::new(
                BlockStage::StaticFilter,
                verdict.reason.clone().unwrap_or_default(),
            )
        })
    }

    pub fn review_unavailable() -> Self {
        Self::new(BlockStage::ContextualReviewer, REVIEW_UNAVAILABLE_REASON)
    }
}

impl std::fmt::Display for BlockedVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[BLOCKED] {}", self.reason)
    }
}

/// Outcome of a pre-check, post-check or delegation review.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum GuardianVerdict {
    Approved { delegation_note: bool },
    Blocked(BlockedVerdict),
}

impl GuardianVerdict {
    pub fn approved() -> Self {
        Self::Approved {
            delegation_note: false,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    pub fn blocked(&self) -> Option<&BlockedVerdict> {
        match self {
            Self::Blocked(blocked) => Some(blocked),
            Self::Approved { .. } => None,
        }
    }
}

impl From<BlockedVerdict> for GuardianVerdict {
    fn from(blocked: BlockedVerdict) -> Self {
        Self::Blocked(blocked)
    }
}

/// Read the reviewer's free-text answer into a verdict.
///
/// Only a response that starts with an approval marker approves; anything
/// else, including an empty response, blocks with the reviewer's text as
/// the reason.
pub fn parse_review(text: &str) -> GuardianVerdict {
    let trimmed = text.trim();
    if trimmed.starts_with(DELEGATION_MARKER) {
        return GuardianVerdict::Approved {
            delegation_note: true,
        };
    }
    if trimmed.starts_with(APPROVED_MARKER) {
        return GuardianVerdict::approved();
    }

    let reason = trimmed
        .strip_prefix(BLOCKED_MARKER)
        .map_or(trimmed, str::trim_start);
    let reason = if reason.is_empty() {
        EMPTY_REVIEW_REASON
    } else {
        reason
    };
    BlockedVerdict::new(BlockStage::ContextualReviewer, reason).into()
}

/// Remove approval markers a model may have echoed into user-facing text.
pub fn strip_approval_markers(text: &str) -> String {
    text.replace(DELEGATION_MARKER, "")
        .replace("[APPROVED]", "")
}
