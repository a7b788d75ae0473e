//! Error Types and Centralized Error Routing
//!
//! User code (render functions, watcher getters and callbacks, lifecycle
//! hooks, event listeners, data factories) returns [`Result`]. Failures are
//! isolated per invocation and routed through [`handle_error`]:
//!
//! 1. Starting at the failing instance's parent, every `error_captured` hook
//!    up the component tree gets a chance to swallow the error by returning
//!    [`ErrorFlow::Stop`].
//! 2. If nothing captured it, the configured global error handler runs.
//! 3. As a last resort the error is logged through `tracing`.
//!
//! Nothing in this module panics or re-raises: one failing render must not
//! prevent sibling components from updating in the same flush.

use std::future::Future;
use std::rc::Rc;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::component::Component;
use crate::config;
use crate::reactive::ReactiveContext;

/// Errors produced by the runtime or returned from user code.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A plain message, usually raised by user code.
    #[error("{0}")]
    Message(String),

    /// A watch expression that is not a simple dot-delimited path.
    #[error("invalid watch path `{0}`")]
    InvalidPath(String),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Any other error type raised by user code.
    #[error("{0}")]
    Other(Rc<dyn std::error::Error>),
}

impl Error {
    /// Build a message error.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wrap an arbitrary error value.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::Other(Rc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// What an `error_captured` hook wants to happen after it has seen an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorFlow {
    /// Keep walking up the component tree.
    #[default]
    Continue,
    /// The error is handled; stop propagation.
    Stop,
}

/// Route an error raised by user code.
///
/// `info` names the invocation site, e.g. `render` or
/// `callback for watcher "a.b"`.
pub fn handle_error(err: Error, vm: Option<&Component>, info: &str) {
    // Hooks run here must not register dependencies on whatever unit is
    // currently evaluating.
    let _ctx = ReactiveContext::untracked();

    if let Some(vm) = vm {
        let mut current = vm.parent();
        while let Some(ancestor) = current {
            for hook in ancestor.def().error_captured_hooks() {
                match hook(&err, vm, info) {
                    Ok(ErrorFlow::Stop) => return,
                    Ok(ErrorFlow::Continue) => {}
                    Err(hook_err) => {
                        global_handle_error(hook_err, Some(&ancestor), "errorCaptured hook")
                    }
                }
            }
            current = ancestor.parent();
        }
    }

    global_handle_error(err, vm, info);
}

/// Run a single fallible invocation, routing any failure.
///
/// Returns the value on success, `None` if the invocation failed.
pub fn invoke_with_error_handling<T>(
    f: impl FnOnce() -> Result<T>,
    vm: Option<&Component>,
    info: &str,
) -> Option<T> {
    match f() {
        Ok(value) => Some(value),
        Err(err) => {
            handle_error(err, vm, info);
            None
        }
    }
}

/// Run a user future on the current `LocalSet` and route an `Err` outcome
/// through [`handle_error`].
///
/// Must be called from within a `tokio::task::LocalSet`.
pub fn spawn_monitored<F>(vm: Option<&Component>, info: &str, future: F) -> JoinHandle<()>
where
    F: Future<Output = Result<()>> + 'static,
{
    let vm = vm.map(Component::downgrade);
    let info = format!("{info} (Promise/async)");
    tokio::task::spawn_local(async move {
        if let Err(err) = future.await {
            let vm = vm.and_then(|weak| weak.upgrade());
            handle_error(err, vm.as_ref(), &info);
        }
    })
}

fn global_handle_error(err: Error, vm: Option<&Component>, info: &str) {
    let handler = config::with(|c| c.error_handler.clone());
    if let Some(handler) = handler {
        match handler(&err, vm, info) {
            Ok(()) => return,
            Err(handler_err) => {
                // Avoid logging the same error twice if the handler re-raised it.
                if handler_err.to_string() != err.to_string() {
                    log_error(&handler_err, vm, "config.error_handler");
                }
            }
        }
    }
    log_error(&err, vm, info);
}

fn log_error(err: &Error, vm: Option<&Component>, info: &str) {
    let component = vm.map(crate::debug::format_component_name).unwrap_or_default();
    tracing::error!(target: "vireo", component = %component, "Error in {}: \"{}\"", info, err);
}
