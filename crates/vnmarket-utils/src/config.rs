//! Configuration management utilities

use serde::{Deserialize, Serialize};

/// Environment variable selecting the deployment environment
pub const ENV_VAR: &str = "VNMARKET_ENV";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "vnmarket".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Defaults overlaid with `VNMARKET_ENV` when it is set and non-empty
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(env) = std::env::var(ENV_VAR) {
            let env = env.trim();
            if !env.is_empty() {
                config.environment = env.to_string();
            }
        }
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.app_name, "vnmarket");
        assert!(!config.is_production());
    }

    #[test]
    fn test_config_serde() {
        let config = Config {
            app_name: "vnmarket".to_string(),
            environment: "Production".to_string(),
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert!(back.is_production());
    }
}
