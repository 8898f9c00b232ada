//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the filter
//! gateway. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::filter::FilterConfig;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request filter rules and flags.
    pub filter: FilterSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration. Requests on a TLS listener count as secure.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Filter settings as written in the config file.
///
/// A missing rule list disables that dimension; an empty list is kept as-is.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Regex rules matched against the client IP.
    pub ip_filters: Option<Vec<String>>,

    /// Regex rules matched against the User-Agent header.
    pub user_agent_filters: Option<Vec<String>>,

    /// Reject requests carrying `X-Requested-With: XMLHttpRequest`.
    pub disallow_xhr: bool,

    /// Reject requests that did not arrive over TLS.
    pub disallow_insecure: bool,

    /// Path prefixes that bypass the filter entirely.
    pub skip_paths: Vec<String>,

    /// Header holding the client IP when behind a proxy.
    pub client_ip_header: Option<String>,

    /// Compile every rule when the config is loaded and refuse bad configs.
    pub validate_on_load: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            ip_filters: None,
            user_agent_filters: None,
            disallow_xhr: false,
            disallow_insecure: false,
            skip_paths: Vec::new(),
            client_ip_header: None,
            validate_on_load: true,
        }
    }
}

impl FilterSettings {
    /// Build the runtime filter configuration.
    pub fn to_filter_config(&self) -> FilterConfig {
        let mut builder = FilterConfig::builder()
            .disallow_xhr(self.disallow_xhr)
            .disallow_insecure(self.disallow_insecure);

        if let Some(rules) = &self.ip_filters {
            builder = builder.ip_filters(rules.iter().cloned());
        }
        if let Some(rules) = &self.user_agent_filters {
            builder = builder.user_agent_filters(rules.iter().cloned());
        }
        if !self.skip_paths.is_empty() {
            let prefixes = self.skip_paths.clone();
            builder = builder.skip(move |ctx| prefixes.iter().any(|p| path_within(&ctx.path, p)));
        }

        builder.build()
    }
}

/// True when `path` is `prefix` or lies below it, segment-wise.
fn path_within(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Decision, RequestContext};

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.filter.ip_filters.is_none());
        assert!(config.filter.user_agent_filters.is_none());
        assert!(!config.filter.disallow_xhr);
        assert!(config.filter.validate_on_load);
    }

    #[test]
    fn test_empty_list_differs_from_missing() {
        let config: AppConfig = toml::from_str(
            r#"
            [filter]
            ip_filters = []
            "#,
        )
        .unwrap();
        assert_eq!(config.filter.ip_filters, Some(Vec::new()));
        assert!(config.filter.user_agent_filters.is_none());
    }

    #[test]
    fn test_skip_paths_become_predicate() {
        let settings = FilterSettings {
            ip_filters: Some(vec!["127.0.0.1".into()]),
            skip_paths: vec!["/health".into()],
            ..Default::default()
        };
        let config = settings.to_filter_config();

        let mut ctx = RequestContext {
            source_address: "127.0.0.1".into(),
            path: "/health/live".into(),
            ..Default::default()
        };
        assert_eq!(crate::filter::evaluate(&config, &ctx), Decision::Continue);

        ctx.path = "/api".into();
        assert!(!crate::filter::evaluate(&config, &ctx).is_continue());
    }

    #[test]
    fn test_skip_paths_match_whole_segments() {
        assert!(path_within("/health", "/health"));
        assert!(path_within("/health/live", "/health"));
        assert!(path_within("/health/live", "/health/"));
        assert!(!path_within("/healthcare/admin", "/health"));
        assert!(!path_within("/api/health", "/health"));
        assert!(path_within("/anything", "/"));

        let config = FilterSettings {
            disallow_xhr: true,
            skip_paths: vec!["/health".into()],
            ..Default::default()
        }
        .to_filter_config();
        let ctx = RequestContext {
            is_xhr: true,
            path: "/healthcare/admin".into(),
            ..Default::default()
        };
        assert!(!crate::filter::evaluate(&config, &ctx).is_continue());
    }
}
