//! Shared, atomically swapped logging configuration.
//!
//! # Design Decisions
//! - Readers take a whole snapshot with one atomic load and never observe
//!   a half-applied update
//! - Writers clone the current config, change it and publish the clone
//!   (`ArcSwap::rcu`), so concurrent setters do not lose each other's writes
//! - Setters are total: invalid level or policy input falls back to the default

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use crate::config::schema::{CorrelationIdProvider, LoggingConfig, LoggingSettings, ResponseSourcePolicy};
use crate::config::validation::{resolve_settings, SettingsWarning};
use crate::observability::hooks::{RequestHook, ResponseHook};
use crate::observability::logging::LogLevel;
use crate::observability::obscurer::LogRecordObscurer;

static GLOBAL: OnceLock<Arc<ConfigStore>> = OnceLock::new();

macro_rules! toggle {
    ($field:ident, $getter:ident, $setter:ident) => {
        pub fn $getter(&self) -> bool {
            self.inner.load().$field
        }

        pub fn $setter(&self, enabled: bool) {
            self.update(|config| config.$field = enabled);
        }
    };
}

/// Holder of the live [`LoggingConfig`].
#[derive(Debug)]
pub struct ConfigStore {
    inner: ArcSwap<LoggingConfig>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Store holding the default configuration.
    pub fn new() -> Self {
        Self::with_config(LoggingConfig::default())
    }

    pub fn with_config(config: LoggingConfig) -> Self {
        Self {
            inner: ArcSwap::from_pointee(config),
        }
    }

    /// Process-wide store, created on first use.
    pub fn global() -> Arc<ConfigStore> {
        GLOBAL.get_or_init(|| Arc::new(ConfigStore::new())).clone()
    }

    /// Consistent view of the configuration at this instant.
    pub fn snapshot(&self) -> Arc<LoggingConfig> {
        self.inner.load_full()
    }

    /// Publish `config` as a whole.
    pub fn replace(&self, config: LoggingConfig) {
        self.inner.store(Arc::new(config));
    }

    /// Restore the default configuration.
    pub fn reset(&self) {
        self.replace(LoggingConfig::default());
    }

    /// Apply `change` to a copy of the current config and publish the copy.
    pub fn update<F>(&self, change: F)
    where
        F: Fn(&mut LoggingConfig),
    {
        self.inner.rcu(|current| {
            let mut next = LoggingConfig::clone(current);
            change(&mut next);
            next
        });
    }

    toggle!(request_logging_enabled, is_request_logging_enabled, set_request_logging_enabled);
    toggle!(response_logging_enabled, is_response_logging_enabled, set_response_logging_enabled);
    toggle!(
        request_body_logging_enabled,
        is_request_body_logging_enabled,
        set_request_body_logging_enabled
    );
    toggle!(
        response_body_logging_enabled,
        is_response_body_logging_enabled,
        set_response_body_logging_enabled
    );

    pub fn request_logging_hooks(&self) -> Vec<Arc<dyn RequestHook>> {
        self.inner.load().request_logging_hooks.clone()
    }

    pub fn set_request_logging_hooks(&self, hooks: Vec<Arc<dyn RequestHook>>) {
        self.update(|config| config.request_logging_hooks = hooks.clone());
    }

    pub fn response_logging_hooks(&self) -> Vec<Arc<dyn ResponseHook>> {
        self.inner.load().response_logging_hooks.clone()
    }

    pub fn set_response_logging_hooks(&self, hooks: Vec<Arc<dyn ResponseHook>>) {
        self.update(|config| config.response_logging_hooks = hooks.clone());
    }

    pub fn request_log_record_obscurers(&self) -> Vec<Arc<dyn LogRecordObscurer>> {
        self.inner.load().request_log_record_obscurers.clone()
    }

    pub fn set_request_log_record_obscurers(&self, obscurers: Vec<Arc<dyn LogRecordObscurer>>) {
        self.update(|config| config.request_log_record_obscurers = obscurers.clone());
    }

    pub fn response_log_record_obscurers(&self) -> Vec<Arc<dyn LogRecordObscurer>> {
        self.inner.load().response_log_record_obscurers.clone()
    }

    pub fn set_response_log_record_obscurers(&self, obscurers: Vec<Arc<dyn LogRecordObscurer>>) {
        self.update(|config| config.response_log_record_obscurers = obscurers.clone());
    }

    #[deprecated(note = "use set_request_logging_hooks")]
    pub fn set_custom_request_logging_hook(&self, hook: Arc<dyn RequestHook>) {
        self.set_request_logging_hooks(vec![hook]);
    }

    #[deprecated(note = "use set_response_logging_hooks")]
    pub fn set_custom_response_logging_hook(&self, hook: Arc<dyn ResponseHook>) {
        self.set_response_logging_hooks(vec![hook]);
    }

    #[deprecated(note = "use set_request_log_record_obscurers")]
    pub fn set_request_log_record_obscurer(&self, obscurer: Arc<dyn LogRecordObscurer>) {
        self.set_request_log_record_obscurers(vec![obscurer]);
    }

    #[deprecated(note = "use set_response_log_record_obscurers")]
    pub fn set_response_log_record_obscurer(&self, obscurer: Arc<dyn LogRecordObscurer>) {
        self.set_response_log_record_obscurers(vec![obscurer]);
    }

    pub fn correlation_id_provider(&self) -> Option<Arc<dyn CorrelationIdProvider>> {
        self.inner.load().correlation_id_provider.clone()
    }

    /// Install or clear (`None`) the correlation id provider.
    pub fn set_correlation_id_provider(&self, provider: Option<Arc<dyn CorrelationIdProvider>>) {
        self.update(|config| config.correlation_id_provider = provider.clone());
    }

    pub fn default_hook_log_level(&self) -> LogLevel {
        self.inner.load().default_hook_log_level
    }

    pub fn set_default_hook_log_level(&self, level: LogLevel) {
        self.update(|config| config.default_hook_log_level = level);
    }

    /// Set the level by name; unknown names select INFO.
    pub fn set_default_hook_log_level_named(&self, name: &str) {
        self.set_default_hook_log_level(LogLevel::from_name_or_default(name));
    }

    /// Set the level by numeric value; unknown values select INFO.
    pub fn set_default_hook_log_level_value(&self, value: i64) {
        self.set_default_hook_log_level(LogLevel::from_value_or_default(value));
    }

    pub fn response_source_policy(&self) -> ResponseSourcePolicy {
        self.inner.load().response_source_policy
    }

    pub fn set_response_source_policy(&self, policy: ResponseSourcePolicy) {
        self.update(|config| config.response_source_policy = policy);
    }

    /// Set the policy by name; unknown names select the default policy.
    pub fn set_response_source_policy_named(&self, name: &str) {
        let policy = name.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default response source policy");
            ResponseSourcePolicy::default()
        });
        self.set_response_source_policy(policy);
    }

    /// Publish the toggles of `settings` in one swap.
    ///
    /// Hooks, obscurers and the correlation id provider are left as they are.
    pub fn apply_settings(&self, settings: &LoggingSettings) -> Vec<SettingsWarning> {
        let (resolved, warnings) = resolve_settings(settings);
        for warning in &warnings {
            tracing::warn!(field = warning.field, value = %warning.value, fallback = %warning.fallback,
                "Invalid logging setting, using default");
        }

        self.update(|config| {
            config.request_logging_enabled = resolved.request_logging_enabled;
            config.response_logging_enabled = resolved.response_logging_enabled;
            config.request_body_logging_enabled = resolved.request_body_logging_enabled;
            config.response_body_logging_enabled = resolved.response_body_logging_enabled;
            config.default_hook_log_level = resolved.default_hook_log_level;
            config.response_source_policy = resolved.response_source_policy;
        });
        warnings
    }
}
