use super::responder::{RespondFuture, Responder, ResponderOutput};
use crate::error::ResponderError;
use crate::llm::scrub::sanitize_api_error;
use crate::llm::{AgentHandle, Provider};
use std::sync::Arc;

pub const COORDINATOR_NAME: &str = "TravelCoordinator";

pub const HOTEL_AGENT_INSTRUCTIONS: &str = "\
You are a hotel booking assistant.
Given a destination, dates, and budget, suggest 2-3 suitable hotel options.
For each, include hotel name, nightly price, user rating, and location details.
Be factual, concise, and focus only on hotel stay arrangements.
Do NOT suggest sightseeing or activities.";

pub const ACTIVITIES_AGENT_INSTRUCTIONS: &str = "\
You are a local activity and tour guide assistant.
Given a destination and interests (like food, culture, nature), suggest 2-3 relevant activities \
or attractions.
For each, provide name, description, estimated price, and duration.
Do NOT suggest hotels or booking options.";

const COORDINATOR_INSTRUCTIONS: &str = "\
You are a travel coordinator. Answer travel questions that no specialist covers, briefly and \
factually.";

const ROUTING_NONE: &str = "NONE";

/// A named specialist the coordinator may delegate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specialist {
    pub name: String,
    pub instructions: String,
}

impl Specialist {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("HotelAgent", HOTEL_AGENT_INSTRUCTIONS),
            Self::new("ActivitiesAgent", ACTIVITIES_AGENT_INSTRUCTIONS),
        ]
    }
}

fn routing_instructions(specialists: &[AgentHandle]) -> String {
    let roster: Vec<String> = specialists
        .iter()
        .map(|s| {
            let summary = s.instructions().lines().next().unwrap_or_default();
            format!("- {}: {summary}", s.name())
        })
        .collect();
    format!(
        "You route travel requests to specialists. Available specialists:\n{}\n\
         Reply with the comma-separated names of every specialist needed for the request, \
         or {ROUTING_NONE} if none applies. Reply with names only.",
        roster.join("\n")
    )
}

/// Delegating responder: a routing call picks specialists, each chosen
/// specialist answers, and the sections are combined under `[Name]` headers.
pub struct CoordinatorResponder {
    router: AgentHandle,
    fallback: AgentHandle,
    specialists: Vec<AgentHandle>,
}

impl CoordinatorResponder {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: &str,
        temperature: f64,
        specialists: Vec<Specialist>,
    ) -> Self {
        let specialists: Vec<AgentHandle> = specialists
            .into_iter()
            .map(|s| AgentHandle::new(s.name, s.instructions, provider.clone(), model, temperature))
            .collect();
        let router = AgentHandle::new(
            format!("{COORDINATOR_NAME}.router"),
            routing_instructions(&specialists),
            provider.clone(),
            model,
            0.0,
        );
        let fallback = AgentHandle::new(
            COORDINATOR_NAME,
            COORDINATOR_INSTRUCTIONS,
            provider,
            model,
            temperature,
        );
        Self {
            router,
            fallback,
            specialists,
        }
    }

    pub fn with_default_specialists(
        provider: Arc<dyn Provider>,
        model: &str,
        temperature: f64,
    ) -> Self {
        Self::new(provider, model, temperature, Specialist::defaults())
    }

    pub fn specialist_names(&self) -> Vec<&str> {
        self.specialists.iter().map(AgentHandle::name).collect()
    }

    /// Specialists named in a routing reply, in configured order.
    /// Unknown names are ignored; `NONE` or an empty reply selects none.
    pub fn parse_routing(&self, reply: &str) -> Vec<&AgentHandle> {
        let requested: Vec<String> = reply
            .split([',', '\n'])
            .map(|name| name.trim().trim_matches(|c: char| c == '[' || c == ']').to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        if requested.iter().any(|name| name == &ROUTING_NONE.to_lowercase()) {
            return Vec::new();
        }
        self.specialists
            .iter()
            .filter(|s| requested.contains(&s.name().to_lowercase()))
            .collect()
    }

    fn failure(&self, agent: &str, error: &anyhow::Error) -> ResponderError {
        ResponderError::Failed {
            responder: format!("{COORDINATOR_NAME}/{agent}"),
            message: sanitize_api_error(&format!("{error:#}")),
        }
    }

    async fn respond_impl(&self, prompt: &str) -> Result<ResponderOutput, ResponderError> {
        let routing = self
            .router
            .run(prompt)
            .await
            .map_err(|e| self.failure(self.router.name(), &e))?;
        let chosen = self.parse_routing(&routing);
        tracing::info!(
            chosen = ?chosen.iter().map(|s| s.name()).collect::<Vec<_>>(),
            "coordinator.routed"
        );

        if chosen.is_empty() {
            let text = self
                .fallback
                .run(prompt)
                .await
                .map_err(|e| self.failure(self.fallback.name(), &e))?;
            return non_empty(ResponderOutput::direct(text));
        }

        let mut sections = Vec::with_capacity(chosen.len());
        let mut output = ResponderOutput::default();
        for specialist in chosen {
            let answer = specialist
                .run(prompt)
                .await
                .map_err(|e| self.failure(specialist.name(), &e))?;
            sections.push(format!("[{}]\n{}", specialist.name(), answer.trim()));
            output.contributors.insert(specialist.name().to_string());
        }
        output.text = sections.join("\n\n");
        non_empty(output)
    }
}

fn non_empty(output: ResponderOutput) -> Result<ResponderOutput, ResponderError> {
    if output.text.trim().is_empty() {
        return Err(ResponderError::EmptyOutput {
            responder: COORDINATOR_NAME.to_string(),
        });
    }
    Ok(output)
}

impl Responder for CoordinatorResponder {
    fn name(&self) -> &str {
        COORDINATOR_NAME
    }

    fn respond<'a>(&'a self, prompt: &'a str) -> RespondFuture<'a> {
        Box::pin(self.respond_impl(prompt))
    }
}
