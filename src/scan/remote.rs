//! Adapter for an llm-guard style scanning service.

use super::{InputScanner, OutputScanner, ScanFuture, ScanOutcome};
use crate::error::ScanError;
use crate::llm::http_client::build_http_client;
use crate::llm::scrub::{api_error, sanitize_api_error};
use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const REMOTE_SCANNER_NAME: &str = "llm-guard";

#[derive(Debug, Serialize)]
struct AnalyzePromptRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct AnalyzeOutputRequest<'a> {
    prompt: &'a str,
    output: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    is_valid: bool,
    #[serde(default)]
    scanners: HashMap<String, f32>,
    #[serde(default)]
    sanitized_prompt: Option<String>,
    #[serde(default)]
    sanitized_output: Option<String>,
}

impl AnalyzeResponse {
    fn risk_score(&self) -> f32 {
        self.scanners.values().copied().fold(0.0, f32::max)
    }

    fn into_outcome(self, original: &str) -> ScanOutcome {
        let risk = self.risk_score();
        let sanitized = self
            .sanitized_output
            .or(self.sanitized_prompt)
            .unwrap_or_else(|| original.to_string());
        if self.is_valid {
            ScanOutcome::pass(sanitized, risk)
        } else {
            ScanOutcome::flag(sanitized, risk)
        }
    }
}

/// Runs the remote service's own scanner lineup as a single bank entry.
pub struct RemoteScanner {
    base_url: String,
    client: Client,
}

impl RemoteScanner {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_http_client(timeout_secs),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn analyze<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<AnalyzeResponse> {
        let url = format!("{}/analyze/{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("{REMOTE_SCANNER_NAME} request to /analyze/{path} failed"))?;

        if !response.status().is_success() {
            return Err(api_error(REMOTE_SCANNER_NAME, response).await);
        }

        response
            .json()
            .await
            .with_context(|| format!("{REMOTE_SCANNER_NAME} response JSON decode failed"))
    }
}

fn scan_error(error: &anyhow::Error) -> ScanError {
    ScanError::Failed {
        scanner: REMOTE_SCANNER_NAME.to_string(),
        message: sanitize_api_error(&format!("{error:#}")),
    }
}

impl InputScanner for RemoteScanner {
    fn name(&self) -> &str {
        REMOTE_SCANNER_NAME
    }

    fn scan<'a>(&'a self, prompt: &'a str) -> ScanFuture<'a> {
        Box::pin(async move {
            let response = self
                .analyze("prompt", &AnalyzePromptRequest { prompt })
                .await
                .map_err(|e| scan_error(&e))?;
            Ok(response.into_outcome(prompt))
        })
    }
}

impl OutputScanner for RemoteScanner {
    fn name(&self) -> &str {
        REMOTE_SCANNER_NAME
    }

    fn scan<'a>(&'a self, prompt: &'a str, output: &'a str) -> ScanFuture<'a> {
        Box::pin(async move {
            let response = self
                .analyze("output", &AnalyzeOutputRequest { prompt, output })
                .await
                .map_err(|e| scan_error(&e))?;
            Ok(response.into_outcome(output))
        })
    }
}
