use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::env;

use crate::forms::PluginSettingsForm;
use crate::payments::providers::GovukPayConfig;
use crate::plugin::{PluginSettings, DEFAULT_API_URL, DEFAULT_METHOD_NAME};

/// Name of the optional plugin settings file, without extension
pub const PLUGIN_SETTINGS_FILE: &str = "govukpay";
pub const PLUGIN_SETTINGS_ENV_PREFIX: &str = "GOVUKPAY";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub govukpay: GovukPayConfig,
    pub plugin: PluginSettings,
}

#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// Absolute base of the URLs handed to GOV.UK Pay and the registrant
    pub public_base_url: String,
    pub internal_api_key: String,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("public_base_url", &self.public_base_url)
            .field("internal_api_key", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .context("PORT not set")?
                .parse()
                .context("PORT must be a valid number")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL").context("PUBLIC_BASE_URL not set")?,
            internal_api_key: env::var("INTERNAL_API_KEY").unwrap_or_default(),
        };
        server.validate()?;

        let govukpay = GovukPayConfig::from_env();
        if govukpay.timeout_secs == 0 {
            return Err(anyhow!("GOVUKPAY_TIMEOUT_SECS must be greater than 0"));
        }

        let plugin = load_plugin_settings()?;

        Ok(Config {
            server,
            govukpay,
            plugin,
        })
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        // Validate port range
        if self.port < 1024 {
            return Err(anyhow!("Port must be at least 1024, got {}", self.port));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.environment.as_str()) {
            return Err(anyhow!(
                "Environment must be one of: {:?}, got {}",
                valid_environments,
                self.environment
            ));
        }

        let base = Url::parse(&self.public_base_url)
            .with_context(|| format!("PUBLIC_BASE_URL is not a URL: {}", self.public_base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(anyhow!(
                "PUBLIC_BASE_URL must be an http(s) URL, got {}",
                self.public_base_url
            ));
        }

        if self.environment == "production" && self.internal_api_key.trim().is_empty() {
            return Err(anyhow!("INTERNAL_API_KEY cannot be empty in production"));
        }

        Ok(())
    }
}

/// Plugin settings seed: defaults, then `govukpay.toml`, then `GOVUKPAY__*` variables
pub fn load_plugin_settings() -> Result<PluginSettings> {
    plugin_settings_from(::config::File::with_name(PLUGIN_SETTINGS_FILE).required(false))
}

fn plugin_settings_from<S>(file: S) -> Result<PluginSettings>
where
    S: ::config::Source + Send + Sync + 'static,
{
    let settings: PluginSettings = ::config::Config::builder()
        .set_default("method_name", DEFAULT_METHOD_NAME)?
        .set_default("url", DEFAULT_API_URL)?
        .add_source(file)
        .add_source(
            ::config::Environment::with_prefix(PLUGIN_SETTINGS_ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .context("Failed to load plugin settings")?
        .try_deserialize()
        .context("Invalid plugin settings")?;

    PluginSettingsForm {
        method_name: settings.method_name.clone(),
        url: settings.url.clone(),
    }
    .validate()
    .context("Invalid plugin settings")?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::config::{File, FileFormat};

    fn server() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            public_base_url: "https://events.example.org/".to_string(),
            internal_api_key: String::new(),
        }
    }

    #[test]
    fn test_valid_server_config() {
        assert!(server().validate().is_ok());
    }

    #[test]
    fn test_rejects_privileged_port() {
        let config = ServerConfig {
            port: 80,
            ..server()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least 1024"));
    }

    #[test]
    fn test_rejects_unknown_environment() {
        let config = ServerConfig {
            environment: "qa".to_string(),
            ..server()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_relative_base_url() {
        let config = ServerConfig {
            public_base_url: "/indico".to_string(),
            ..server()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            public_base_url: "ftp://events.example.org/".to_string(),
            ..server()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_requires_api_key() {
        let config = ServerConfig {
            environment: "production".to_string(),
            ..server()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            environment: "production".to_string(),
            internal_api_key: "secret".to_string(),
            ..server()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ServerConfig {
            internal_api_key: "hunter2".to_string(),
            ..server()
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_plugin_settings_defaults() {
        let settings = plugin_settings_from(File::from_str("", FileFormat::Toml)).unwrap();
        assert_eq!(settings, PluginSettings::default());
    }

    #[test]
    fn test_plugin_settings_from_file() {
        let file = File::from_str(
            "url = \"https://pay.example.org/api/\"\nmethod_name = \"Card\"",
            FileFormat::Toml,
        );
        let settings = plugin_settings_from(file).unwrap();
        assert_eq!(settings.url, "https://pay.example.org/api/");
        assert_eq!(settings.method_name, "Card");
    }

    #[test]
    fn test_plugin_settings_rejects_bad_url() {
        let file = File::from_str("url = \"not a url\"", FileFormat::Toml);
        assert!(plugin_settings_from(file).is_err());
    }
}
