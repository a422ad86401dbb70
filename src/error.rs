use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `wardgate`.
///
/// Each pipeline collaborator defines its own error variant. Library callers
/// can match on these to decide how to surface a failure; leaf I/O code keeps
/// using `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum GatewayError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── LLM / Provider ──────────────────────────────────────────────────
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    // ── Scanners ────────────────────────────────────────────────────────
    #[error("scan: {0}")]
    Scan(#[from] ScanError),

    // ── Contextual review ───────────────────────────────────────────────
    #[error("review: {0}")]
    Review(#[from] ReviewError),

    // ── Responder layer ─────────────────────────────────────────────────
    #[error("responder: {0}")]
    Responder(#[from] ResponderError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── LLM / Provider errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} authentication failed")]
    Auth { provider: String },

    #[error("provider {provider} returned an empty response")]
    EmptyResponse { provider: String },
}

// ─── Scanner errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scanner {scanner} failed: {message}")]
    Failed { scanner: String, message: String },
}

// ─── Contextual review errors ───────────────────────────────────────────────

/// The reasoning agent behind the contextual reviewer could not produce a
/// verdict. Never interpreted as approval.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("reviewer unavailable: {0}")]
    Unavailable(String),
}

// ─── Responder errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("responder {responder} failed: {message}")]
    Failed { responder: String, message: String },

    #[error("responder {responder} produced no output")]
    EmptyOutput { responder: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, GatewayError>;
