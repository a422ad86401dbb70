use crate::error::ConfigError;
use crate::scan::static_filter::MIN_BLOB_RUN;
use crate::session::MAX_HISTORY_LIMIT;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Default tracing level when `--verbose` is not passed.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub guardian: GuardianConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub scanners: ScannersConfig,

    #[serde(default)]
    pub static_filter: StaticFilterConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_true() -> bool {
    true
}

// ── Provider ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Model override for the contextual reviewer; falls back to `model`.
    #[serde(default)]
    pub reviewer_model: Option<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_http_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            reviewer_model: None,
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn reviewer_model(&self) -> &str {
        self.reviewer_model.as_deref().unwrap_or(&self.model)
    }
}

// ── Guardian ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianConfig {
    /// Treat reviewer failures as approval. Off by default; enabling it
    /// lets a reasoning-agent outage approve every message that passed the
    /// scanners and static filter.
    #[serde(default)]
    pub reviewer_fail_open: bool,
    /// Upper bound for one request through the delegation flow.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    180
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            reviewer_fail_open: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Idle identities older than this are evicted by `evict_idle`; 0 disables.
    #[serde(default)]
    pub idle_ttl_secs: u64,
}

fn default_history_limit() -> usize {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            idle_ttl_secs: 0,
        }
    }
}

// ── Scanners ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ScannersConfig {
    #[serde(default = "default_true")]
    pub prompt_injection: bool,
    #[serde(default = "default_true")]
    pub secrets: bool,
    #[serde(default = "default_true")]
    pub toxicity: bool,
    #[serde(default = "default_true")]
    pub sensitive: bool,
    #[serde(default = "default_toxicity_threshold")]
    pub toxicity_threshold: f32,
    /// Minimum lexical overlap between prompt and output; 0.0 disables.
    #[serde(default)]
    pub relevance_floor: f32,
    /// Base URL of an llm-guard compatible scanning API.
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default = "default_remote_timeout_secs")]
    pub remote_timeout_secs: u64,
}

fn default_toxicity_threshold() -> f32 {
    0.5
}

fn default_remote_timeout_secs() -> u64 {
    30
}

impl Default for ScannersConfig {
    fn default() -> Self {
        Self {
            prompt_injection: true,
            secrets: true,
            toxicity: true,
            sensitive: true,
            toxicity_threshold: default_toxicity_threshold(),
            relevance_floor: 0.0,
            remote_url: None,
            remote_timeout_secs: default_remote_timeout_secs(),
        }
    }
}

// ── Static filter ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticFilterConfig {
    #[serde(default = "default_min_blob_run")]
    pub min_blob_run: usize,
}

fn default_min_blob_run() -> usize {
    MIN_BLOB_RUN
}

impl Default for StaticFilterConfig {
    fn default() -> Self {
        Self {
            min_blob_run: default_min_blob_run(),
        }
    }
}

// ── Observability ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// "none" | "log"
    pub backend: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            backend: "log".into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());

        Self {
            config_path: home.join(".wardgate").join("config.toml"),
            log_level: default_log_level(),
            provider: ProviderConfig::default(),
            guardian: GuardianConfig::default(),
            session: SessionConfig::default(),
            scanners: ScannersConfig::default(),
            static_filter: StaticFilterConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_HISTORY_LIMIT).contains(&self.session.history_limit) {
            return Err(ConfigError::Validation(format!(
                "session.history_limit {} is outside 1..={MAX_HISTORY_LIMIT}",
                self.session.history_limit
            )));
        }
        if self.static_filter.min_blob_run < MIN_BLOB_RUN {
            return Err(ConfigError::Validation(format!(
                "static_filter.min_blob_run must be at least {MIN_BLOB_RUN}"
            )));
        }
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::Validation(format!(
                "provider.temperature {} is outside 0.0..=2.0",
                self.provider.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.scanners.toxicity_threshold) {
            return Err(ConfigError::Validation(format!(
                "scanners.toxicity_threshold {} is outside 0.0..=1.0",
                self.scanners.toxicity_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.scanners.relevance_floor) {
            return Err(ConfigError::Validation(format!(
                "scanners.relevance_floor {} is outside 0.0..=1.0",
                self.scanners.relevance_floor
            )));
        }
        if self.guardian.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "guardian.request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Copy of this config safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.provider.api_key.is_some() {
            copy.provider.api_key = Some("***".into());
        }
        copy
    }
}
