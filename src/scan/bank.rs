use super::injection::PromptInjectionScanner;
use super::relevance::RelevanceScanner;
use super::remote::RemoteScanner;
use super::secrets::{SecretsScanner, SensitiveScanner};
use super::toxicity::ToxicityScanner;
use super::{Direction, InputScanner, OutputScanner, ScanOutcome, ScanVerdict};
use crate::config::ScannersConfig;
use crate::error::ScanError;
use crate::llm::scrub::sanitize_api_error;
use crate::observability::{GatewayEvent, NoopObserver, Observer};
use std::sync::Arc;

/// Ordered input and output scanner lists, fixed at construction.
pub struct ScannerBank {
    input_scanners: Vec<Arc<dyn InputScanner>>,
    output_scanners: Vec<Arc<dyn OutputScanner>>,
    observer: Arc<dyn Observer>,
}

impl ScannerBank {
    pub fn new(
        input_scanners: Vec<Arc<dyn InputScanner>>,
        output_scanners: Vec<Arc<dyn OutputScanner>>,
    ) -> Self {
        Self {
            input_scanners,
            output_scanners,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Default lineup: `PromptInjection`, `Secrets`, `Toxicity` on input and
    /// `Sensitive`, `Relevance`, `Toxicity` on output, minus whatever the
    /// config disables, followed by the remote scanner when configured.
    pub fn from_config(config: &ScannersConfig) -> Self {
        let toxicity = Arc::new(ToxicityScanner::new(config.toxicity_threshold));

        let mut input: Vec<Arc<dyn InputScanner>> = Vec::new();
        if config.prompt_injection {
            input.push(Arc::new(PromptInjectionScanner));
        }
        if config.secrets {
            input.push(Arc::new(SecretsScanner));
        }
        if config.toxicity {
            input.push(toxicity.clone());
        }

        let mut output: Vec<Arc<dyn OutputScanner>> = Vec::new();
        if config.sensitive {
            output.push(Arc::new(SensitiveScanner));
        }
        output.push(Arc::new(RelevanceScanner::new(config.relevance_floor)));
        if config.toxicity {
            output.push(toxicity);
        }

        if let Some(url) = config.remote_url.as_deref().filter(|u| !u.trim().is_empty()) {
            let remote = Arc::new(RemoteScanner::new(url, config.remote_timeout_secs));
            input.push(remote.clone());
            output.push(remote);
        }

        Self::new(input, output)
    }

    pub fn input_scanner_names(&self) -> Vec<&str> {
        self.input_scanners.iter().map(|s| s.name()).collect()
    }

    pub fn output_scanner_names(&self) -> Vec<&str> {
        self.output_scanners.iter().map(|s| s.name()).collect()
    }

    /// First invalid verdict, or `None` when every input scanner passes.
    pub async fn scan_input(&self, text: &str) -> Option<ScanVerdict> {
        for scanner in &self.input_scanners {
            let result = scanner.scan(text).await;
            let verdict = self.settle(Direction::Input, scanner.name(), result);
            if !verdict.is_valid {
                return Some(verdict);
            }
        }
        None
    }

    /// First invalid verdict for `text` produced in answer to `prompt`.
    pub async fn scan_output(&self, prompt: &str, text: &str) -> Option<ScanVerdict> {
        for scanner in &self.output_scanners {
            let result = scanner.scan(prompt, text).await;
            let verdict = self.settle(Direction::Output, scanner.name(), result);
            if !verdict.is_valid {
                return Some(verdict);
            }
        }
        None
    }

    /// Turn a scanner result into a verdict, failing closed on error, and
    /// record it.
    fn settle(
        &self,
        direction: Direction,
        name: &str,
        result: Result<ScanOutcome, ScanError>,
    ) -> ScanVerdict {
        let verdict = match result {
            Ok(outcome) => outcome.into_verdict(name),
            Err(error) => {
                tracing::error!(
                    direction = %direction,
                    scanner = %name,
                    error = %sanitize_api_error(&error.to_string()),
                    "scan.error"
                );
                ScanOutcome::flag(String::new(), 1.0).into_verdict(name)
            }
        };

        tracing::debug!(
            direction = %direction,
            scanner = %name,
            valid = verdict.is_valid,
            risk_score = verdict.risk_score,
            "scan"
        );
        self.observer.record_event(&GatewayEvent::ScanCompleted {
            direction,
            scanner: name.to_string(),
            valid: verdict.is_valid,
            risk_score: verdict.risk_score,
        });
        verdict
    }
}
