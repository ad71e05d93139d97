//! Explicit logger handle.
//!
//! A [`Logger`] wraps a fully built [`tracing::Dispatch`]. It is constructed
//! once at startup from the log configuration and then only cloned; nothing
//! mutates it afterwards. The middleware pipeline binds it to every request
//! future, and components holding a request context can scope events to it
//! explicitly with [`Logger::in_scope`].

use tracing::dispatcher::{self, Dispatch, SetGlobalDefaultError};

/// Shared, immutable logger.
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Wraps an already configured dispatcher.
    #[must_use]
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// A logger that discards everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Dispatch::none())
    }

    /// The underlying dispatcher.
    #[must_use]
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Runs `f` with this logger as the current default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, f)
    }

    /// Makes this logger the fallback for events emitted outside any request.
    ///
    /// Can succeed at most once per process.
    pub fn install_as_process_default(&self) -> Result<(), SetGlobalDefaultError> {
        dispatcher::set_global_default(self.dispatch.clone())
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::disabled()
    }
}
