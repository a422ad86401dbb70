//! Content scanners and the bank that runs them in a fixed order.
//!
//! Scanners are pure with respect to gateway state: they see text (and, on
//! the output side, the prompt that produced it) and return an outcome. The
//! bank short-circuits on the first invalid outcome.

pub mod bank;
pub mod injection;
pub mod relevance;
pub mod remote;
pub mod secrets;
pub mod static_filter;
pub mod toxicity;

pub use bank::ScannerBank;
pub use static_filter::{StaticFilter, StaticVerdict};

use crate::error::ScanError;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use strum::Display;

/// Which side of the responder a check runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

/// Result of one scanner invocation, as surfaced by the bank.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanVerdict {
    pub sanitized_text: String,
    pub is_valid: bool,
    pub risk_score: f32,
    pub scanner_name: String,
}

/// What a scanner returns; the bank stamps it with the scanner's name.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub sanitized_text: String,
    pub is_valid: bool,
    pub risk_score: f32,
}

impl ScanOutcome {
    pub fn pass(text: impl Into<String>, risk_score: f32) -> Self {
        Self {
            sanitized_text: text.into(),
            is_valid: true,
            risk_score,
        }
    }

    pub fn flag(text: impl Into<String>, risk_score: f32) -> Self {
        Self {
            sanitized_text: text.into(),
            is_valid: false,
            risk_score,
        }
    }

    pub fn into_verdict(self, scanner_name: &str) -> ScanVerdict {
        ScanVerdict {
            sanitized_text: self.sanitized_text,
            is_valid: self.is_valid,
            risk_score: self.risk_score,
            scanner_name: scanner_name.to_string(),
        }
    }
}

pub type ScanFuture<'a> = Pin<Box<dyn Future<Output = Result<ScanOutcome, ScanError>> + Send + 'a>>;

/// Scans a user prompt before it reaches the responder layer.
pub trait InputScanner: Send + Sync {
    fn name(&self) -> &str;

    fn scan<'a>(&'a self, prompt: &'a str) -> ScanFuture<'a>;
}

/// Scans a responder output; receives the originating prompt for
/// relevance-style checks.
pub trait OutputScanner: Send + Sync {
    fn name(&self) -> &str;

    fn scan<'a>(&'a self, prompt: &'a str, output: &'a str) -> ScanFuture<'a>;
}

/// Wrap a synchronous outcome for the async scanner contract.
pub(crate) fn ready(outcome: ScanOutcome) -> ScanFuture<'static> {
    Box::pin(std::future::ready(Ok(outcome)))
}
