mod env_overrides;
mod loader;
#[cfg(test)]
mod test_env;
mod types;

pub use types::{
    Config, GuardianConfig, ObservabilityConfig, ProviderConfig, ScannersConfig, SessionConfig,
    StaticFilterConfig,
};
