//! Process-level gateway settings
//!
//! Read from the environment (after loading `.env` if present) and then
//! overridden by command-line flags. Parsing takes an injectable lookup so
//! tests never mutate the real environment.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::upstream::DEFAULT_TIMEOUT;

/// Default port the gateway listens on
pub const DEFAULT_PORT: u16 = 3000;

/// Origins allowed to call the gateway from a browser
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "https://ryanocc.github.io",
    "https://onecompiler.com",
    "https://app.onecompiler.com",
];

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port to bind on all interfaces
    pub listen_port: u16,
    /// Credential for the BODS SIRI-SX feed; never logged
    pub bods_api_key: Option<SecretString>,
    /// Browser origins granted CORS access
    pub allowed_origins: Vec<String>,
    /// Transport timeout for upstream requests
    pub upstream_timeout: Duration,
    /// Serve an expired entry when a refresh fails
    pub serve_stale_on_error: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_PORT,
            bods_api_key: None,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|origin| origin.to_string())
                .collect(),
            upstream_timeout: DEFAULT_TIMEOUT,
            serve_stale_on_error: false,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from `.env` and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from a variable lookup
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of a named variable, if set
    ///
    /// # Returns
    /// * `Err(ConfigError::InvalidValue)` if a numeric setting does not parse
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.listen_port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name: "PORT", value: port.clone() })?;
        }

        config.bods_api_key = lookup("BODS_API_KEY")
            .filter(|key| !key.is_empty())
            .map(SecretString::from);

        if let Some(origins) = lookup("CORS_ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(secs) = lookup("UPSTREAM_TIMEOUT_SECS") {
            let parsed: u64 = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "UPSTREAM_TIMEOUT_SECS",
                value: secs.clone(),
            })?;
            config.upstream_timeout = Duration::from_secs(parsed);
        }

        if let Some(flag) = lookup("SERVE_STALE_ON_ERROR") {
            config.serve_stale_on_error = matches!(flag.trim(), "true" | "1");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = GatewayConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.listen_port, 3000);
        assert!(config.bods_api_key.is_none());
        assert_eq!(config.allowed_origins.len(), 3);
        assert_eq!(config.upstream_timeout, DEFAULT_TIMEOUT);
        assert!(!config.serve_stale_on_error);
    }

    #[test]
    fn test_port_and_key_from_lookup() {
        let config =
            GatewayConfig::from_lookup(lookup_from(&[("PORT", "8080"), ("BODS_API_KEY", "abc")]))
                .unwrap();

        assert_eq!(config.listen_port, 8080);
        assert_eq!(
            config.bods_api_key.as_ref().map(|k| k.expose_secret()),
            Some("abc")
        );
    }

    #[test]
    fn test_invalid_port_is_error() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();

        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_empty_api_key_counts_as_absent() {
        let config = GatewayConfig::from_lookup(lookup_from(&[("BODS_API_KEY", "")])).unwrap();

        assert!(config.bods_api_key.is_none());
    }

    #[test]
    fn test_allowed_origins_are_split_and_trimmed() {
        let config = GatewayConfig::from_lookup(lookup_from(&[(
            "CORS_ALLOWED_ORIGINS",
            "https://a.example, https://b.example,,",
        )]))
        .unwrap();

        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_timeout_and_stale_flag() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("UPSTREAM_TIMEOUT_SECS", "5"),
            ("SERVE_STALE_ON_ERROR", "true"),
        ]))
        .unwrap();

        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
        assert!(config.serve_stale_on_error);
    }

    #[test]
    fn test_invalid_timeout_is_error() {
        let result = GatewayConfig::from_lookup(lookup_from(&[("UPSTREAM_TIMEOUT_SECS", "soon")]));

        assert!(result.is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config =
            GatewayConfig::from_lookup(lookup_from(&[("BODS_API_KEY", "hunter2")])).unwrap();

        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
