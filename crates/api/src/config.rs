use anyhow::{Context, Result};
use extract::GeminiConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gemini: GeminiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_image_bytes: usize,
}

/// Backend settings without the credential, safe to log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSettings {
    pub model: String,
    pub base_url: String,
    /// None disables the request timeout
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                max_image_bytes: 10 * 1024 * 1024,
            },
            gemini: GeminiSettings {
                model: extract::gemini::DEFAULT_MODEL.to_string(),
                base_url: extract::gemini::DEFAULT_BASE_URL.to_string(),
                request_timeout_secs: Some(120),
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay defaults with whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.server.port = port
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{port}'"))?;
        }
        if let Some(limit) = lookup("MAX_IMAGE_BYTES") {
            config.server.max_image_bytes = limit
                .parse()
                .with_context(|| format!("MAX_IMAGE_BYTES must be a byte count, got '{limit}'"))?;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            config.gemini.model = model;
        }
        if let Some(base_url) = lookup("GEMINI_BASE_URL") {
            config.gemini.base_url = base_url;
        }
        if let Some(timeout) = lookup("GEMINI_TIMEOUT_SECS") {
            let secs: u64 = timeout
                .parse()
                .with_context(|| format!("GEMINI_TIMEOUT_SECS must be whole seconds, got '{timeout}'"))?;
            config.gemini.request_timeout_secs = (secs > 0).then_some(secs);
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Combine settings with the credential into the extractor's config.
    pub fn gemini_config(&self, api_key: String) -> GeminiConfig {
        GeminiConfig::new(api_key)
            .with_model(&self.gemini.model)
            .with_base_url(&self.gemini.base_url)
            .with_timeout(self.gemini.request_timeout_secs.map(Duration::from_secs))
    }
}

/// Read the backend credential: `GEMINI_API_KEY`, falling back to `API_KEY`.
pub fn api_key_from<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup("GEMINI_API_KEY")
        .or_else(|| lookup("API_KEY"))
        .filter(|key| !key.trim().is_empty())
        .context("GEMINI_API_KEY (or API_KEY) environment variable not set")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.gemini.model, "gemini-3-flash-preview");
        assert_eq!(config.gemini.request_timeout_secs, Some(120));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("GEMINI_MODEL", "gemini-2.5-flash"),
            ("GEMINI_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.request_timeout_secs, None);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_api_key_fallback() {
        assert_eq!(api_key_from(lookup(&[("API_KEY", "k1")])).unwrap(), "k1");
        assert_eq!(
            api_key_from(lookup(&[("API_KEY", "k1"), ("GEMINI_API_KEY", "k2")])).unwrap(),
            "k2"
        );
        assert!(api_key_from(lookup(&[("GEMINI_API_KEY", " ")])).is_err());
    }

    #[test]
    fn test_gemini_config_carries_settings() {
        let config = AppConfig::from_lookup(lookup(&[("GEMINI_TIMEOUT_SECS", "30")])).unwrap();
        let gemini = config.gemini_config("key".to_string());

        assert_eq!(gemini.api_key, "key");
        assert_eq!(gemini.timeout, Some(Duration::from_secs(30)));
    }
}
