pub mod agent;
pub mod compatible;
pub mod http_client;
pub mod scrub;
pub mod traits;

pub use agent::AgentHandle;
pub use compatible::OpenAiCompatibleProvider;
pub use scrub::{api_error, sanitize_api_error, scrub_secret_patterns};
pub use traits::Provider;

use crate::config::ProviderConfig;
use std::sync::Arc;

/// Label used in logs and errors for the configured endpoint.
fn provider_label(base_url: &str) -> &'static str {
    if base_url.contains("api.openai.com") {
        "openai"
    } else {
        "openai-compatible"
    }
}

/// Build the chat provider shared by the reviewer and the responder layer.
pub fn create_provider(config: &ProviderConfig) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatibleProvider::new(
        provider_label(&config.base_url),
        &config.base_url,
        config.api_key.as_deref(),
        config.timeout_secs,
    ))
}
