//! Settings file watcher for hot reload.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::loader::{load_settings, ConfigError};
use crate::config::store::ConfigStore;

type Overrides = Arc<dyn Fn(&ConfigStore) + Send + Sync>;

/// Re-applies a settings file to a [`ConfigStore`] whenever the file changes.
#[derive(Clone)]
pub struct ConfigWatcher {
    path: PathBuf,
    store: Arc<ConfigStore>,
    overrides: Option<Overrides>,
}

impl fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigWatcher")
            .field("path", &self.path)
            .field("overrides", &self.overrides.is_some())
            .finish()
    }
}

impl ConfigWatcher {
    pub fn new(path: &Path, store: Arc<ConfigStore>) -> Self {
        Self {
            path: path.to_path_buf(),
            store,
            overrides: None,
        }
    }

    /// Settings applied after every load of the file, so they survive reloads.
    pub fn with_overrides(
        mut self,
        overrides: impl Fn(&ConfigStore) + Send + Sync + 'static,
    ) -> Self {
        self.overrides = Some(Arc::new(overrides));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file now and apply it to the store.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let settings = load_settings(&self.path)?;
        self.store.apply_settings(&settings);
        if let Some(overrides) = &self.overrides {
            overrides(&self.store);
        }
        Ok(())
    }

    /// Start watching the file in a background thread.
    ///
    /// Watching stops when the returned watcher is dropped. A file that fails
    /// to load leaves the current configuration in place.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let reloader = self.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Logging settings change detected, reloading...");
                        if let Err(e) = reloader.reload() {
                            tracing::error!(
                                "Failed to reload logging settings: {}. Keeping current configuration.",
                                e
                            );
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Logging settings watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::logging::LogLevel;
    use std::fs;
    use std::time::Instant;

    fn temp_settings(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "logging-http-client-watch-{}.toml",
            uuid::Uuid::new_v4()
        ));
        fs::write(&path, content).unwrap();
        path
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        condition()
    }

    #[test]
    fn test_reload_applies_file() {
        let path = temp_settings("request_logging = false\ndefault_hook_log_level = \"DEBUG\"\n");
        let store = Arc::new(ConfigStore::new());

        ConfigWatcher::new(&path, store.clone()).reload().unwrap();
        fs::remove_file(&path).unwrap();

        assert!(!store.is_request_logging_enabled());
        assert_eq!(store.default_hook_log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_overrides_survive_reload() {
        let path = temp_settings("request_body_logging = false\nresponse_body_logging = false\n");
        let store = Arc::new(ConfigStore::new());
        let watcher = ConfigWatcher::new(&path, store.clone()).with_overrides(|store| {
            store.set_request_body_logging_enabled(true);
        });

        watcher.reload().unwrap();
        store.set_request_body_logging_enabled(false);
        watcher.reload().unwrap();
        fs::remove_file(&path).unwrap();

        assert!(store.is_request_body_logging_enabled());
        assert!(!store.is_response_body_logging_enabled());
    }

    #[test]
    fn test_reload_failure_keeps_config() {
        let path = temp_settings("request_logging = 12\n");
        let store = Arc::new(ConfigStore::new());

        assert!(ConfigWatcher::new(&path, store.clone()).reload().is_err());
        fs::remove_file(&path).unwrap();

        assert!(store.is_request_logging_enabled());
    }

    #[test]
    fn test_file_change_is_picked_up() {
        let path = temp_settings("response_body_logging = false\n");
        let store = Arc::new(ConfigStore::new());
        let _watcher = ConfigWatcher::new(&path, store.clone()).run().unwrap();

        fs::write(&path, "response_body_logging = true\n").unwrap();

        let reloaded = wait_until(|| store.is_response_body_logging_enabled());
        fs::remove_file(&path).unwrap();
        assert!(reloaded);
    }
}
