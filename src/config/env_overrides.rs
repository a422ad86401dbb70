use super::Config;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("WARDGATE_API_KEY").or_else(|_| std::env::var("API_KEY"))
            && !key.is_empty()
        {
            self.provider.api_key = Some(key);
        }

        if let Ok(base_url) = std::env::var("WARDGATE_BASE_URL")
            && !base_url.is_empty()
        {
            self.provider.base_url = base_url;
        }

        if let Ok(model) = std::env::var("WARDGATE_MODEL")
            && !model.is_empty()
        {
            self.provider.model = model;
        }

        if let Ok(temp_str) = std::env::var("WARDGATE_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
            && (0.0..=2.0).contains(&temp)
        {
            self.provider.temperature = temp;
        }

        if let Ok(secs_str) = std::env::var("WARDGATE_REQUEST_TIMEOUT_SECS")
            && let Ok(secs) = secs_str.parse::<u64>()
            && secs > 0
        {
            self.guardian.request_timeout_secs = secs;
        }

        if let Ok(url) = std::env::var("WARDGATE_SCANNER_URL")
            && !url.is_empty()
        {
            self.scanners.remote_url = Some(url);
        }
    }
}
