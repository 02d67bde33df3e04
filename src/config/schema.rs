//! Configuration schema definitions.
//!
//! `LoggingConfig` is the live configuration the pipeline reads on every
//! call. `LoggingSettings` is the serializable toggle subset loaded from
//! settings files.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::hooks::{
    DefaultRequestLoggingHook, DefaultResponseLoggingHook, RequestHook, ResponseHook,
};
use crate::observability::logging::LogLevel;
use crate::observability::obscurer::LogRecordObscurer;

/// Supplies the value stamped into `x-correlation-id`.
pub trait CorrelationIdProvider: Send + Sync {
    fn correlation_id(&self) -> String;
}

impl<F> CorrelationIdProvider for F
where
    F: Fn() -> String + Send + Sync,
{
    fn correlation_id(&self) -> String {
        self()
    }
}

/// Wrap a closure as a shareable correlation id provider.
pub fn correlation_id_provider<F>(f: F) -> Arc<dyn CorrelationIdProvider>
where
    F: Fn() -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Where `response_source` comes from when the response has no `x-source`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSourcePolicy {
    /// Use `host[:port]` of the request URL.
    #[default]
    RequestUrlHost,
    /// Leave the field unset.
    HeaderOnly,
}

impl ResponseSourcePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseSourcePolicy::RequestUrlHost => "request_url_host",
            ResponseSourcePolicy::HeaderOnly => "header_only",
        }
    }
}

impl fmt::Display for ResponseSourcePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown response source policy: {0}")]
pub struct ParsePolicyError(pub String);

impl FromStr for ResponseSourcePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "request_url_host" => Ok(ResponseSourcePolicy::RequestUrlHost),
            "header_only" => Ok(ResponseSourcePolicy::HeaderOnly),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Live logging configuration.
///
/// Cloning is cheap: hooks, obscurers and the provider are shared handles.
#[derive(Clone)]
pub struct LoggingConfig {
    pub request_logging_enabled: bool,
    pub response_logging_enabled: bool,
    pub request_body_logging_enabled: bool,
    pub response_body_logging_enabled: bool,
    pub request_logging_hooks: Vec<Arc<dyn RequestHook>>,
    pub response_logging_hooks: Vec<Arc<dyn ResponseHook>>,
    pub request_log_record_obscurers: Vec<Arc<dyn LogRecordObscurer>>,
    pub response_log_record_obscurers: Vec<Arc<dyn LogRecordObscurer>>,
    pub correlation_id_provider: Option<Arc<dyn CorrelationIdProvider>>,
    pub default_hook_log_level: LogLevel,
    pub response_source_policy: ResponseSourcePolicy,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            request_logging_enabled: true,
            response_logging_enabled: true,
            request_body_logging_enabled: false,
            response_body_logging_enabled: false,
            request_logging_hooks: vec![Arc::new(DefaultRequestLoggingHook)],
            response_logging_hooks: vec![Arc::new(DefaultResponseLoggingHook)],
            request_log_record_obscurers: Vec::new(),
            response_log_record_obscurers: Vec::new(),
            correlation_id_provider: None,
            default_hook_log_level: LogLevel::Info,
            response_source_policy: ResponseSourcePolicy::default(),
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let request_hooks: Vec<&str> = self.request_logging_hooks.iter().map(|h| h.name()).collect();
        let response_hooks: Vec<&str> =
            self.response_logging_hooks.iter().map(|h| h.name()).collect();
        let request_obscurers: Vec<&str> = self
            .request_log_record_obscurers
            .iter()
            .map(|o| o.name())
            .collect();
        let response_obscurers: Vec<&str> = self
            .response_log_record_obscurers
            .iter()
            .map(|o| o.name())
            .collect();

        f.debug_struct("LoggingConfig")
            .field("request_logging_enabled", &self.request_logging_enabled)
            .field("response_logging_enabled", &self.response_logging_enabled)
            .field("request_body_logging_enabled", &self.request_body_logging_enabled)
            .field("response_body_logging_enabled", &self.response_body_logging_enabled)
            .field("request_logging_hooks", &request_hooks)
            .field("response_logging_hooks", &response_hooks)
            .field("request_log_record_obscurers", &request_obscurers)
            .field("response_log_record_obscurers", &response_obscurers)
            .field("correlation_id_provider", &self.correlation_id_provider.is_some())
            .field("default_hook_log_level", &self.default_hook_log_level)
            .field("response_source_policy", &self.response_source_policy)
            .finish()
    }
}

/// Toggle subset of the configuration, as written in a settings file.
///
/// ```toml
/// request_logging = true
/// response_logging = true
/// request_body_logging = false
/// response_body_logging = true
/// default_hook_log_level = "DEBUG"
/// response_source = "header_only"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub request_logging: bool,
    pub response_logging: bool,
    pub request_body_logging: bool,
    pub response_body_logging: bool,
    /// Level name; unknown names fall back to INFO.
    pub default_hook_log_level: String,
    /// Policy name; unknown names fall back to `request_url_host`.
    pub response_source: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            request_logging: true,
            response_logging: true,
            request_body_logging: false,
            response_body_logging: false,
            default_hook_log_level: LogLevel::Info.name().to_string(),
            response_source: ResponseSourcePolicy::default().as_str().to_string(),
        }
    }
}

impl From<&LoggingConfig> for LoggingSettings {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            request_logging: config.request_logging_enabled,
            response_logging: config.response_logging_enabled,
            request_body_logging: config.request_body_logging_enabled,
            response_body_logging: config.response_body_logging_enabled,
            default_hook_log_level: config.default_hook_log_level.name().to_string(),
            response_source: config.response_source_policy.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert!(config.request_logging_enabled);
        assert!(config.response_logging_enabled);
        assert!(!config.request_body_logging_enabled);
        assert!(!config.response_body_logging_enabled);
        assert!(config.request_log_record_obscurers.is_empty());
        assert!(config.response_log_record_obscurers.is_empty());
        assert!(config.correlation_id_provider.is_none());
        assert_eq!(config.default_hook_log_level, LogLevel::Info);
        assert_eq!(config.response_source_policy, ResponseSourcePolicy::RequestUrlHost);
    }

    #[test]
    fn test_debug_lists_hook_names() {
        let rendered = format!("{:?}", LoggingConfig::default());
        assert!(rendered.contains("default_request_logging_hook"));
        assert!(rendered.contains("default_response_logging_hook"));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "header_only".parse::<ResponseSourcePolicy>().unwrap(),
            ResponseSourcePolicy::HeaderOnly
        );
        assert_eq!(
            " Request-URL-Host ".parse::<ResponseSourcePolicy>().unwrap(),
            ResponseSourcePolicy::RequestUrlHost
        );
        assert!("hostname".parse::<ResponseSourcePolicy>().is_err());
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: LoggingSettings = toml::from_str("response_body_logging = true").unwrap();
        assert!(settings.request_logging);
        assert!(settings.response_body_logging);
        assert_eq!(settings.default_hook_log_level, "INFO");
        assert_eq!(settings.response_source, "request_url_host");
    }

    #[test]
    fn test_settings_from_config() {
        let config = LoggingConfig {
            request_body_logging_enabled: true,
            default_hook_log_level: LogLevel::Warning,
            response_source_policy: ResponseSourcePolicy::HeaderOnly,
            ..LoggingConfig::default()
        };
        let settings = LoggingSettings::from(&config);
        assert!(settings.request_body_logging);
        assert_eq!(settings.default_hook_log_level, "WARNING");
        assert_eq!(settings.response_source, "header_only");
    }

    #[test]
    fn test_provider_closure() {
        let provider = correlation_id_provider(|| "abc".to_string());
        assert_eq!(provider.correlation_id(), "abc");
    }
}
