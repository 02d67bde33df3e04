//! Settings validation.
//!
//! # Responsibilities
//! - Turn textual settings (level name, policy name) into typed values
//! - Report every value that had to fall back, not just the first
//!
//! # Design Decisions
//! - Lenient: invalid input never rejects a settings file, it falls back to
//!   the default and yields a warning
//! - Pure function: `LoggingSettings -> (ResolvedSettings, Vec<SettingsWarning>)`

use std::fmt;

use crate::config::schema::{LoggingSettings, ResponseSourcePolicy};
use crate::observability::logging::LogLevel;

/// Settings with every textual field parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub request_logging_enabled: bool,
    pub response_logging_enabled: bool,
    pub request_body_logging_enabled: bool,
    pub response_body_logging_enabled: bool,
    pub default_hook_log_level: LogLevel,
    pub response_source_policy: ResponseSourcePolicy,
}

/// A settings value that was replaced by its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsWarning {
    pub field: &'static str,
    pub value: String,
    pub fallback: String,
}

impl fmt::Display for SettingsWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: unrecognized value {:?}, using {}",
            self.field, self.value, self.fallback
        )
    }
}

pub fn resolve_settings(settings: &LoggingSettings) -> (ResolvedSettings, Vec<SettingsWarning>) {
    let mut warnings = Vec::new();

    let default_hook_log_level = settings
        .default_hook_log_level
        .parse::<LogLevel>()
        .unwrap_or_else(|_| {
            let fallback = LogLevel::default();
            warnings.push(SettingsWarning {
                field: "default_hook_log_level",
                value: settings.default_hook_log_level.clone(),
                fallback: fallback.to_string(),
            });
            fallback
        });

    let response_source_policy = settings
        .response_source
        .parse::<ResponseSourcePolicy>()
        .unwrap_or_else(|_| {
            let fallback = ResponseSourcePolicy::default();
            warnings.push(SettingsWarning {
                field: "response_source",
                value: settings.response_source.clone(),
                fallback: fallback.to_string(),
            });
            fallback
        });

    let resolved = ResolvedSettings {
        request_logging_enabled: settings.request_logging,
        response_logging_enabled: settings.response_logging,
        request_body_logging_enabled: settings.request_body_logging,
        response_body_logging_enabled: settings.response_body_logging,
        default_hook_log_level,
        response_source_policy,
    };
    (resolved, warnings)
}
