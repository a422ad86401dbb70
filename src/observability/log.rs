use super::traits::{GatewayEvent, Observer};
use tracing::{info, warn};

/// Writes every gateway event as a structured tracing record.
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Observer for LogObserver {
    fn record_event(&self, event: &GatewayEvent) {
        match event {
            GatewayEvent::ScanCompleted {
                direction,
                scanner,
                valid,
                risk_score,
            } => {
                info!(
                    direction = %direction,
                    scanner = %scanner,
                    valid = valid,
                    risk_score = risk_score,
                    "scan.completed"
                );
            }
            GatewayEvent::StageBlocked { direction, stage } => {
                warn!(direction = %direction, stage = %stage, "stage.blocked");
            }
            GatewayEvent::ReviewFailed { identity } => {
                warn!(identity = %identity, "review.failed");
            }
            GatewayEvent::ResponderFailed { responder } => {
                warn!(responder = %responder, "responder.failed");
            }
            GatewayEvent::Delegation {
                identity,
                contributors,
            } => {
                info!(identity = %identity, contributors = ?contributors, "delegation");
            }
            GatewayEvent::RequestEnd { duration, outcome } => {
                let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                info!(duration_ms = ms, outcome = %outcome, "request.end");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
