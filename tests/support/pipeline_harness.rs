#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use wardgate::delegation::{DelegationFlow, RespondFuture, Responder, ResponderOutput};
use wardgate::error::ResponderError;
use wardgate::config::GuardianConfig;
use wardgate::guardian::{ContextualReviewer, DELEGATION_NOTICE, Guardian};
use wardgate::llm::{AgentHandle, Provider};
use wardgate::scan::{
    InputScanner, OutputScanner, ScanFuture, ScanOutcome, ScannerBank, StaticFilter,
};
use wardgate::session::ConversationStore;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Reviewer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum ReviewMode {
    /// `[APPROVED - delegation]` for delegation notices, `[APPROVED]` otherwise.
    Approve,
    /// Every call errors.
    Fail,
    /// Block when the message under review contains the needle.
    BlockWhenContains(&'static str),
}

/// Reasoning agent stand-in for the contextual reviewer.
pub struct ScriptedReviewer {
    mode: ReviewMode,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedReviewer {
    pub fn new(mode: ReviewMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Reviews whose message under review was the delegation notice.
    pub fn delegation_reviews(&self) -> usize {
        lock(&self.prompts)
            .iter()
            .filter(|p| p.ends_with(DELEGATION_NOTICE))
            .count()
    }
}

impl Provider for ScriptedReviewer {
    fn name(&self) -> &str {
        "scripted-reviewer"
    }

    fn chat_with_system<'a>(
        &'a self,
        _system_prompt: Option<&'a str>,
        message: &'a str,
        _model: &'a str,
        _temperature: f64,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.prompts).push(message.to_string());
        let last_line = message.lines().last().unwrap_or_default();
        let reply = match self.mode {
            ReviewMode::Fail => Err(anyhow::anyhow!("reasoning agent unreachable")),
            ReviewMode::BlockWhenContains(needle) if last_line.contains(needle) => {
                Ok("[BLOCKED] the answer mentions a restricted venue".to_string())
            }
            _ if message.ends_with(DELEGATION_NOTICE) => {
                Ok("[APPROVED - delegation]".to_string())
            }
            _ => Ok("[APPROVED]".to_string()),
        };
        Box::pin(async move { reply })
    }
}

// ── Responder ───────────────────────────────────────────────────────────────

/// Responder stand-in with a canned answer, optional failure and delay.
pub struct MockResponder {
    output: Option<ResponderOutput>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockResponder {
    pub fn answering(text: &str, contributors: &[&str]) -> Arc<Self> {
        let output = contributors
            .iter()
            .fold(ResponderOutput::direct(text), |out, name| out.with_contributor(*name));
        Arc::new(Self {
            output: Some(output),
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            output: None,
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(text: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            output: Some(ResponderOutput::direct(text)),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

impl Responder for MockResponder {
    fn name(&self) -> &str {
        "mock-responder"
    }

    fn respond<'a>(&'a self, prompt: &'a str) -> RespondFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.prompts).push(prompt.to_string());
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.output.clone().ok_or_else(|| ResponderError::Failed {
                responder: "mock-responder".into(),
                message: "upstream 502 with key sk-abcdefghijklmnop".into(),
            })
        })
    }
}

// ── Scanners ────────────────────────────────────────────────────────────────

/// Scanner with a fixed validity that records what it saw.
pub struct CountingScanner {
    name: &'static str,
    valid: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl CountingScanner {
    pub fn new(name: &'static str, valid: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            valid,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Originating prompts passed to output scans.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    fn outcome(&self, text: &str) -> ScanOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.valid {
            ScanOutcome::pass(text, 0.0)
        } else {
            ScanOutcome::flag(text, 0.95)
        }
    }
}

impl InputScanner for CountingScanner {
    fn name(&self) -> &str {
        self.name
    }

    fn scan<'a>(&'a self, prompt: &'a str) -> ScanFuture<'a> {
        let outcome = self.outcome(prompt);
        Box::pin(async move { Ok(outcome) })
    }
}

impl OutputScanner for CountingScanner {
    fn name(&self) -> &str {
        self.name
    }

    fn scan<'a>(&'a self, prompt: &'a str, output: &'a str) -> ScanFuture<'a> {
        lock(&self.prompts).push(prompt.to_string());
        let outcome = self.outcome(output);
        Box::pin(async move { Ok(outcome) })
    }
}

// ── Assembly ────────────────────────────────────────────────────────────────

pub struct Pipeline {
    pub flow: DelegationFlow,
    pub store: Arc<ConversationStore>,
    pub reviewer: Arc<ScriptedReviewer>,
    pub responder: Arc<MockResponder>,
    pub input_scanner: Arc<CountingScanner>,
    pub output_scanner: Arc<CountingScanner>,
}

pub struct PipelineBuilder {
    review: ReviewMode,
    responder: Arc<MockResponder>,
    input_valid: bool,
    output_valid: bool,
    fail_open: bool,
    request_timeout: Duration,
}

impl PipelineBuilder {
    pub fn new(responder: Arc<MockResponder>) -> Self {
        Self {
            review: ReviewMode::Approve,
            responder,
            input_valid: true,
            output_valid: true,
            fail_open: false,
            request_timeout: Duration::from_secs(5),
        }
    }

    pub fn review(mut self, mode: ReviewMode) -> Self {
        self.review = mode;
        self
    }

    pub fn input_valid(mut self, valid: bool) -> Self {
        self.input_valid = valid;
        self
    }

    pub fn output_valid(mut self, valid: bool) -> Self {
        self.output_valid = valid;
        self
    }

    pub fn fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Pipeline {
        let store = Arc::new(ConversationStore::new(10));
        let reviewer = ScriptedReviewer::new(self.review);
        let input_scanner = CountingScanner::new("InputProbe", self.input_valid);
        let output_scanner = CountingScanner::new("OutputProbe", self.output_valid);

        let inputs: Vec<Arc<dyn InputScanner>> = vec![input_scanner.clone()];
        let outputs: Vec<Arc<dyn OutputScanner>> = vec![output_scanner.clone()];
        let agent = AgentHandle::new("SecurityAgent", "review", reviewer.clone(), "m", 0.0);
        let guardian = Guardian::new(
            Arc::new(ScannerBank::new(inputs, outputs)),
            StaticFilter::default(),
            ContextualReviewer::new(agent, store.clone()),
            store.clone(),
        )
        .with_config(&GuardianConfig {
            reviewer_fail_open: self.fail_open,
            ..GuardianConfig::default()
        });

        let flow = DelegationFlow::new(Arc::new(guardian), self.responder.clone(), store.clone())
            .with_request_timeout(self.request_timeout);

        Pipeline {
            flow,
            store,
            reviewer,
            responder: self.responder,
            input_scanner,
            output_scanner,
        }
    }
}
