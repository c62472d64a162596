//! Application configuration management.
//!
//! Configuration covers the identity-provider endpoint, the API key, and
//! the auth entry route the guard and logout redirect to. It is stored at
//! `~/.config/authkeep/config.json`; the API key can also come from the
//! `AUTHKEEP_API_KEY` environment variable, which takes precedence.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/storage directory paths
const APP_NAME: &str = "authkeep";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Route the guard redirects unauthenticated navigation to
const DEFAULT_AUTH_ROUTE: &str = "/auth";

/// Environment variable overriding the configured API key
const API_KEY_ENV: &str = "AUTHKEEP_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub provider_url: Option<String>,
    pub api_key: Option<String>,
    pub auth_route: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// API key, preferring the environment override
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV).ok().or_else(|| self.api_key.clone())
    }

    /// Identity provider base URL, falling back to the client's default
    pub fn provider_url(&self) -> &str {
        self.provider_url
            .as_deref()
            .unwrap_or(crate::api::DEFAULT_PROVIDER_URL)
    }

    pub fn auth_route(&self) -> &str {
        self.auth_route.as_deref().unwrap_or(DEFAULT_AUTH_ROUTE)
    }

    /// Directory for the durable key-value store
    pub fn storage_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_route_defaults() {
        let config = Config::default();
        assert_eq!(config.auth_route(), "/auth");

        let config = Config {
            auth_route: Some("/login".into()),
            ..Config::default()
        };
        assert_eq!(config.auth_route(), "/login");
    }

    #[test]
    fn provider_url_defaults_to_the_client_endpoint() {
        let config = Config::default();
        assert_eq!(config.provider_url(), crate::api::DEFAULT_PROVIDER_URL);

        let config = Config {
            provider_url: Some("http://localhost:9099/identitytoolkit.googleapis.com/v1".into()),
            ..Config::default()
        };
        assert!(config.provider_url().starts_with("http://localhost:9099"));
    }
}
