use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::DEFAULT_CACHE_TTL_SECS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
///
/// Every credential is optional; methods that need one are skipped when it is absent.
#[derive(Debug, Clone)]
pub struct Config {
    // Web Server
    pub web_host: String,
    pub web_port: u16,

    // Cache
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,

    // Upstream requests
    pub request_timeout: Duration,
    pub instagram_base_url: String,
    pub mirrors_enabled: bool,

    // Graph API (privileged method)
    pub graph_api_token: Option<String>,
    pub graph_api_user_id: Option<String>,
    pub graph_api_base_url: String,

    // Image host
    pub imgbb_api_key: Option<String>,
    pub imgbb_upload_url: String,

    // Nifty Images
    pub nifty_api_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms set PORT; WEB_PORT is kept for local setups.
        let web_port = match optional_env("PORT") {
            Some(_) => parse_env_u16("PORT", 5000)?,
            None => parse_env_u16("WEB_PORT", 5000)?,
        };

        Ok(Self {
            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port,

            // Cache
            cache_dir: PathBuf::from(env_or_default("CACHE_DIR", "./cache")),
            cache_ttl: Duration::from_secs(parse_env_u64(
                "CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )?),

            // Upstream requests
            request_timeout: Duration::from_secs(parse_env_u64("REQUEST_TIMEOUT_SECS", 10)?),
            instagram_base_url: env_or_default("INSTAGRAM_BASE_URL", "https://www.instagram.com"),
            mirrors_enabled: parse_env_bool("MIRRORS_ENABLED", true)?,

            // Graph API
            graph_api_token: optional_env("GRAPH_API_TOKEN"),
            graph_api_user_id: optional_env("GRAPH_API_USER_ID"),
            graph_api_base_url: env_or_default(
                "GRAPH_API_BASE_URL",
                "https://graph.facebook.com/v19.0",
            ),

            // Image host
            imgbb_api_key: optional_env("IMGBB_API_KEY"),
            imgbb_upload_url: env_or_default("IMGBB_UPLOAD_URL", "https://api.imgbb.com/1/upload"),

            // Nifty Images
            nifty_api_url: env_or_default("NIFTY_API_URL", "https://api.niftyimages.com/render"),
        })
    }

    /// Configuration with production defaults and no credentials, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
            cache_dir: PathBuf::from("./cache"),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(5),
            instagram_base_url: "https://www.instagram.com".to_string(),
            mirrors_enabled: false,
            graph_api_token: None,
            graph_api_user_id: None,
            graph_api_base_url: "https://graph.facebook.com/v19.0".to_string(),
            imgbb_api_key: None,
            imgbb_upload_url: "https://api.imgbb.com/1/upload".to_string(),
            nifty_api_url: "https://api.niftyimages.com/render".to_string(),
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "REQUEST_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        for (name, value) in [
            ("INSTAGRAM_BASE_URL", &self.instagram_base_url),
            ("GRAPH_API_BASE_URL", &self.graph_api_base_url),
            ("IMGBB_UPLOAD_URL", &self.imgbb_upload_url),
            ("NIFTY_API_URL", &self.nifty_api_url),
        ] {
            if let Err(e) = url::Url::parse(value) {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("not a valid URL: {e}"),
                });
            }
        }
        Ok(())
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => parse_bool(name, &val),
        _ => Ok(default),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ParseBool {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(parse_bool("X", "on").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
        assert!(parse_env_bool("NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    #[serial]
    fn test_port_prefers_port_over_web_port() {
        std::env::set_var("PORT", "7001");
        std::env::set_var("WEB_PORT", "7002");
        let config = Config::from_env().unwrap();
        assert_eq!(config.web_port, 7001);

        std::env::remove_var("PORT");
        let config = Config::from_env().unwrap();
        assert_eq!(config.web_port, 7002);

        std::env::remove_var("WEB_PORT");
        let config = Config::from_env().unwrap();
        assert_eq!(config.web_port, 5000);
    }

    #[test]
    #[serial]
    fn test_credentials_are_optional() {
        std::env::remove_var("GRAPH_API_TOKEN");
        std::env::set_var("IMGBB_API_KEY", "");
        let config = Config::from_env().unwrap();
        assert!(config.graph_api_token.is_none());
        assert!(config.imgbb_api_key.is_none());
        assert_eq!(config.cache_ttl, Duration::from_secs(86_400));
        std::env::remove_var("IMGBB_API_KEY");
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            request_timeout: Duration::ZERO,
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
        assert!(Config::for_testing().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = Config {
            instagram_base_url: "not a url".to_string(),
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
    }
}
