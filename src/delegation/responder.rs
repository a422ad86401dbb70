use crate::error::ResponderError;
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;

/// Text produced by a responder plus the specialists that contributed to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponderOutput {
    pub text: String,
    /// Empty when the responder answered on its own.
    pub contributors: BTreeSet<String>,
}

impl ResponderOutput {
    pub fn direct(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            contributors: BTreeSet::new(),
        }
    }

    pub fn with_contributor(mut self, name: impl Into<String>) -> Self {
        self.contributors.insert(name.into());
        self
    }

    pub fn delegated(&self) -> bool {
        !self.contributors.is_empty()
    }
}

pub type RespondFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResponderOutput, ResponderError>> + Send + 'a>>;

/// The layer that actually answers the user; treated as untrusted by the
/// guardian on both sides.
pub trait Responder: Send + Sync {
    fn name(&self) -> &str;

    fn respond<'a>(&'a self, prompt: &'a str) -> RespondFuture<'a>;
}
