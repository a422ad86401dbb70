use crate::guardian::BlockStage;
use crate::scan::Direction;
use std::time::Duration;

/// Events the observer can record
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// One scanner invocation, emitted whether or not it passed.
    ScanCompleted {
        direction: Direction,
        scanner: String,
        valid: bool,
        risk_score: f32,
    },
    StageBlocked {
        direction: Direction,
        stage: BlockStage,
    },
    ReviewFailed {
        identity: String,
    },
    ResponderFailed {
        responder: String,
    },
    Delegation {
        identity: String,
        contributors: Vec<String>,
    },
    RequestEnd {
        duration: Duration,
        outcome: &'static str,
    },
}

/// Sink for gateway events.
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &GatewayEvent);

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
