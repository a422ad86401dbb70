//! Chat-completions client for OpenAI and any API that speaks its protocol.

use super::http_client::build_http_client;
use super::scrub::api_error;
use super::traits::Provider;
use crate::error::LlmError;
use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiCompatibleProvider {
    name: String,
    base_url: String,
    /// Pre-computed `"Bearer <key>"` header value.
    cached_auth_header: Option<String>,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(name: &str, base_url: &str, api_key: Option<&str>, timeout_secs: u64) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cached_auth_header: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| format!("Bearer {k}")),
            client: build_http_client(timeout_secs),
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request<'a>(
        system_prompt: Option<&'a str>,
        message: &'a str,
        model: &'a str,
        temperature: f64,
    ) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        messages.push(Message {
            role: "user",
            content: message,
        });
        ChatRequest {
            model,
            messages,
            temperature,
        }
    }

    async fn call_api(&self, request: &ChatRequest<'_>) -> anyhow::Result<String> {
        let auth_header = self.cached_auth_header.as_ref().ok_or_else(|| LlmError::Auth {
            provider: self.name.clone(),
        })?;

        let response = self
            .client
            .post(self.chat_completions_url())
            .header("Authorization", auth_header)
            .json(request)
            .send()
            .await
            .map_err(|error| LlmError::Request {
                provider: self.name.clone(),
                message: error.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(api_error(&self.name, response).await);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("{} response JSON decode failed", self.name))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                LlmError::EmptyResponse {
                    provider: self.name.clone(),
                }
                .into()
            })
    }
}

impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn chat_with_system<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        message: &'a str,
        model: &'a str,
        temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let request = Self::build_request(system_prompt, message, model, temperature);
            self.call_api(&request).await
        })
    }
}
