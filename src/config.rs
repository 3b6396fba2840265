//! Configuration management for Tollgate.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;

/// Main configuration for the Tollgate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TollgateConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Global per-client rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Per-category endpoint limiter configuration
    #[serde(default)]
    pub endpoints: EndpointLimitsConfig,
}

impl Default for TollgateConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limiting: RateLimitingConfig::default(),
            endpoints: EndpointLimitsConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "127.0.0.1:8080".parse().unwrap()
}

/// Global per-client rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Maximum admitted requests per client within a trailing minute
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: usize,

    /// Maximum admitted requests per client within a trailing hour
    #[serde(default = "default_requests_per_hour")]
    pub requests_per_hour: usize,

    /// Whether the global limiter gates traffic at all; typically true only
    /// in production deployments
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Request paths that skip the limiter regardless of load
    #[serde(default = "default_bypass_paths")]
    pub bypass_paths: HashSet<String>,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            requests_per_hour: default_requests_per_hour(),
            enabled: default_enabled(),
            bypass_paths: default_bypass_paths(),
        }
    }
}

fn default_requests_per_minute() -> usize {
    60
}

fn default_requests_per_hour() -> usize {
    1000
}

fn default_enabled() -> bool {
    true
}

fn default_bypass_paths() -> HashSet<String> {
    ["/", "/health"].into_iter().map(String::from).collect()
}

/// Per-category endpoint limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointLimitsConfig {
    /// Acquisitions per minute per user for AI-cost-bearing endpoints
    #[serde(default = "default_ai_requests_per_minute")]
    pub ai_requests_per_minute: usize,

    /// Acquisitions per minute per client for authentication endpoints
    #[serde(default = "default_auth_requests_per_minute")]
    pub auth_requests_per_minute: usize,
}

impl Default for EndpointLimitsConfig {
    fn default() -> Self {
        Self {
            ai_requests_per_minute: default_ai_requests_per_minute(),
            auth_requests_per_minute: default_auth_requests_per_minute(),
        }
    }
}

fn default_ai_requests_per_minute() -> usize {
    20
}

fn default_auth_requests_per_minute() -> usize {
    5
}

impl TollgateConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| crate::error::TollgateError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TollgateConfig::default();
        assert_eq!(config.rate_limiting.requests_per_minute, 60);
        assert_eq!(config.rate_limiting.requests_per_hour, 1000);
        assert!(config.rate_limiting.enabled);
        assert!(config.rate_limiting.bypass_paths.contains("/health"));
        assert!(config.rate_limiting.bypass_paths.contains("/"));
        assert_eq!(config.endpoints.ai_requests_per_minute, 20);
        assert_eq!(config.endpoints.auth_requests_per_minute, 5);
    }

    #[test]
    fn test_parse_partial_yaml_fills_defaults() {
        let yaml = r#"
rate_limiting:
  requests_per_minute: 10
"#;
        let config = TollgateConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.rate_limiting.requests_per_minute, 10);
        assert_eq!(config.rate_limiting.requests_per_hour, 1000);
        assert!(config.rate_limiting.bypass_paths.contains("/health"));
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
server:
  listen_addr: "0.0.0.0:9000"
rate_limiting:
  requests_per_minute: 30
  requests_per_hour: 500
  enabled: false
  bypass_paths: ["/livez"]
endpoints:
  ai_requests_per_minute: 10
  auth_requests_per_minute: 3
"#;
        let config = TollgateConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.listen_addr.port(), 9000);
        assert_eq!(config.rate_limiting.requests_per_minute, 30);
        assert_eq!(config.rate_limiting.requests_per_hour, 500);
        assert!(!config.rate_limiting.enabled);
        assert!(config.rate_limiting.bypass_paths.contains("/livez"));
        assert!(!config.rate_limiting.bypass_paths.contains("/health"));
        assert_eq!(config.endpoints.auth_requests_per_minute, 3);
    }

    #[test]
    fn test_invalid_yaml_is_a_config_error() {
        let result = TollgateConfig::from_yaml("rate_limiting: [not, a, map]");
        assert!(result.is_err());
    }
}
