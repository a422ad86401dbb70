use super::Config;
use crate::error::{ConfigError, Result};
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Load("could not find home directory".into()))?;
        let wardgate_dir = home.join(".wardgate");
        let config_path = wardgate_dir.join("config.toml");

        if !wardgate_dir.exists() {
            fs::create_dir_all(&wardgate_dir).map_err(ConfigError::Io)?;
        }

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    /// Load an explicit config file. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
        let mut config: Config = toml::from_str(&contents).map_err(|e| {
            ConfigError::Load(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Load(format!("failed to serialize config: {e}")))?;
        fs::write(&self.config_path, toml_str).map_err(ConfigError::Io)?;
        Ok(())
    }
}
