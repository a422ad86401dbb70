use super::traits::Provider;
use std::sync::Arc;

/// One named agent: a provider plus the instructions and sampling settings
/// it always runs with.
#[derive(Clone)]
pub struct AgentHandle {
    name: String,
    instructions: String,
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f64,
}

impl AgentHandle {
    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            provider,
            model: model.into(),
            temperature,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn run(&self, prompt: &str) -> anyhow::Result<String> {
        tracing::debug!(
            agent = %self.name,
            provider = %self.provider.name(),
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "agent.run"
        );
        self.provider
            .chat_with_system(Some(&self.instructions), prompt, &self.model, self.temperature)
            .await
    }
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle")
            .field("name", &self.name)
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}
