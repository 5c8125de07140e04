// src/config.rs
use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";

/// Relay server settings, read from the environment. Only the API key
/// is required; everything else has a deploy-friendly default.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub port: u16,
    pub openai_api_key: String,
    pub openai_api_url: String,
    pub openai_model: String,
    pub allowed_origin: String,
}

impl RelayConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests do not have to
    /// mutate process-wide environment variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT value '{}'", raw))?,
            None => DEFAULT_PORT,
        };

        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .context("OPENAI_API_KEY environment variable not set")?;

        let openai_api_url =
            lookup("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let openai_model = lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let allowed_origin = lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string());

        Ok(Self {
            port,
            openai_api_key,
            openai_api_url,
            openai_model,
            allowed_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn test_defaults_apply() {
        let config =
            RelayConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.openai_api_url, "https://api.openai.com/v1");
        assert_eq!(config.allowed_origin, "*");
        assert_eq!(config.openai_api_key, "sk-test");
    }

    #[test]
    fn test_overrides_apply() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PORT", "8080"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_API_URL", "http://localhost:9000/v1"),
            ("CLIENT_ORIGIN", "https://careerhive.example"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.openai_api_url, "http://localhost:9000/v1");
        assert_eq!(config.allowed_origin, "https://careerhive.example");
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let err = RelayConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let err =
            RelayConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let err = RelayConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
