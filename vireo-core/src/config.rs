//! Runtime Configuration
//!
//! The runtime is strictly single-threaded, so configuration is held per
//! thread: each thread that drives a component tree has its own settings.
//! This also keeps tests that install handlers from leaking into each other.
//!
//! The plain fields serialize with serde so a host can ship them as JSON;
//! the handler closures are installed programmatically.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::error::{Error, Result};

/// Default bound on how many times one unit may re-queue itself within a
/// single flush before the scheduler gives up on it.
pub const MAX_UPDATE_COUNT: usize = 100;

/// Global error handler, consulted when no `error_captured` hook stops an
/// error.
pub type ErrorHandler = Rc<dyn Fn(&Error, Option<&Component>, &str) -> Result<()>>;

/// Replacement sink for usage warnings. Receives the message, the instance
/// the warning concerns (if any) and a formatted component trace.
pub type WarnHandler = Rc<dyn Fn(&str, Option<&Component>, &str)>;

/// Runtime settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Suppress usage warnings.
    pub silent: bool,

    /// Batch unit re-evaluation until the next tick. When false, the queue
    /// flushes synchronously on the first enqueue.
    #[serde(rename = "async")]
    pub async_mode: bool,

    /// Cycle-guard bound for a single unit within one flush.
    pub max_update_count: usize,

    /// Enable development diagnostics (duplicate keys, prop mutation, ...).
    pub dev_mode: bool,

    #[serde(skip)]
    pub error_handler: Option<ErrorHandler>,

    #[serde(skip)]
    pub warn_handler: Option<WarnHandler>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            silent: false,
            async_mode: true,
            max_update_count: MAX_UPDATE_COUNT,
            dev_mode: true,
            error_handler: None,
            warn_handler: None,
        }
    }
}

impl Config {
    /// Parse the serializable settings from JSON. Missing keys keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        if config.max_update_count == 0 {
            return Err(Error::Config("max_update_count must be at least 1".into()));
        }
        Ok(config)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("silent", &self.silent)
            .field("async_mode", &self.async_mode)
            .field("max_update_count", &self.max_update_count)
            .field("dev_mode", &self.dev_mode)
            .field("error_handler", &self.error_handler.is_some())
            .field("warn_handler", &self.warn_handler.is_some())
            .finish()
    }
}

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::default());
}

/// Read the current settings without cloning them.
pub fn with<R>(f: impl FnOnce(&Config) -> R) -> R {
    CONFIG.with(|config| f(&config.borrow()))
}

/// Snapshot of the current settings.
pub fn get() -> Config {
    with(Config::clone)
}

/// Replace the current settings.
pub fn set(config: Config) {
    CONFIG.with(|slot| *slot.borrow_mut() = config);
}

/// Modify the current settings in place.
pub fn update(f: impl FnOnce(&mut Config)) {
    CONFIG.with(|config| f(&mut config.borrow_mut()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_batching() {
        let config = Config::default();
        assert!(config.async_mode);
        assert!(!config.silent);
        assert_eq!(config.max_update_count, 100);
    }

    #[test]
    fn from_json_keeps_defaults_for_missing_keys() {
        let config = Config::from_json(r#"{ "async": false, "silent": true }"#).unwrap();
        assert!(!config.async_mode);
        assert!(config.silent);
        assert_eq!(config.max_update_count, MAX_UPDATE_COUNT);
        assert!(config.dev_mode);
    }

    #[test]
    fn from_json_rejects_zero_bound() {
        let err = Config::from_json(r#"{ "max_update_count": 0 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn update_is_visible_through_with() {
        update(|c| c.max_update_count = 7);
        assert_eq!(with(|c| c.max_update_count), 7);
        set(Config::default());
        assert_eq!(get().max_update_count, MAX_UPDATE_COUNT);
    }
}
