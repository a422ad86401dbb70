use super::traits::{GatewayEvent, Observer};

/// Discards every event.
pub struct NoopObserver;

impl Observer for NoopObserver {
    #[inline(always)]
    fn record_event(&self, _event: &GatewayEvent) {}

    fn name(&self) -> &str {
        "noop"
    }
}
