//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which holds the hosted backend's URL and public key and the last email
//! used to sign in.
//!
//! Configuration is stored at `~/.config/heliport/config.json`. The backend
//! settings can be overridden from the environment (`HELIPORT_SERVICE_URL`,
//! `HELIPORT_ANON_KEY`), which is how `.env` files feed in.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "heliport";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const SERVICE_URL_VAR: &str = "HELIPORT_SERVICE_URL";
pub const ANON_KEY_VAR: &str = "HELIPORT_ANON_KEY";

/// Prefill for the sign-in form. Never written to the config file.
pub const EMAIL_VAR: &str = "HELIPORT_EMAIL";
pub const PASSWORD_VAR: &str = "HELIPORT_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub service_url: Option<String>,
    pub anon_key: Option<String>,
    pub last_email: Option<String>,
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
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the persisted session and log files
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir =
            dirs::cache_dir().ok_or_else(|| anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Resolve backend connection settings, environment first.
    pub fn connection(&self) -> Result<Connection> {
        Connection::resolve(self, |name| std::env::var(name).ok())
    }
}

/// Where the hosted auth and data services live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Base URL without a trailing slash
    pub service_url: String,
    /// Public API key, sent as the `apikey` header on every request
    pub anon_key: String,
}

impl Connection {
    pub fn new(service_url: &str, anon_key: &str) -> Self {
        Self {
            service_url: service_url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.trim().to_string(),
        }
    }

    /// Pick each setting from `env` when present and non-empty, else from the
    /// config file.
    pub fn resolve<F>(config: &Config, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |var: &str, fallback: &Option<String>| {
            env(var)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| fallback.clone().filter(|v| !v.trim().is_empty()))
        };

        let service_url = pick(SERVICE_URL_VAR, &config.service_url).ok_or_else(|| {
            anyhow!("No service URL configured. Set {} or service_url in config.json", SERVICE_URL_VAR)
        })?;
        let anon_key = pick(ANON_KEY_VAR, &config.anon_key).ok_or_else(|| {
            anyhow!("No API key configured. Set {} or anon_key in config.json", ANON_KEY_VAR)
        })?;

        Ok(Self::new(&service_url, &anon_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_connection_from_config() {
        let config = Config {
            service_url: Some("https://example.supabase.co/".to_string()),
            anon_key: Some(" public-key ".to_string()),
            last_email: None,
        };
        let connection = Connection::resolve(&config, no_env).expect("resolve");
        assert_eq!(connection.service_url, "https://example.supabase.co");
        assert_eq!(connection.anon_key, "public-key");
    }

    #[test]
    fn test_environment_overrides_config() {
        let config = Config {
            service_url: Some("https://from-config".to_string()),
            anon_key: Some("config-key".to_string()),
            last_email: None,
        };
        let env = |name: &str| match name {
            SERVICE_URL_VAR => Some("https://from-env".to_string()),
            ANON_KEY_VAR => Some("   ".to_string()),
            _ => None,
        };
        let connection = Connection::resolve(&config, env).expect("resolve");
        assert_eq!(connection.service_url, "https://from-env");
        // Blank env values fall back to the file
        assert_eq!(connection.anon_key, "config-key");
    }

    #[test]
    fn test_missing_settings_name_the_variable() {
        let err = Connection::resolve(&Config::default(), no_env).unwrap_err();
        assert!(err.to_string().contains(SERVICE_URL_VAR));

        let config = Config {
            service_url: Some("https://x".to_string()),
            ..Default::default()
        };
        let err = Connection::resolve(&config, no_env).unwrap_err();
        assert!(err.to_string().contains(ANON_KEY_VAR));
    }

    #[test]
    fn test_config_json_defaults_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"last_email":"a@b.com"}"#).expect("parse");
        assert_eq!(config.last_email.as_deref(), Some("a@b.com"));
        assert!(config.service_url.is_none());
    }
}
