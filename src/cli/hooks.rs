//! Error override hooks
//!
//! Maps each [`ErrorKind`] to a handler deciding the final status code.

use crate::error::{CliError, ErrorKind};
use std::{collections::HashMap, fmt, io::Write};
use tracing::warn;

/// Handler for one error kind; returns the process status
pub type ErrorHandler = Box<dyn Fn(&CliError, &mut dyn Write) -> i32 + Send + Sync>;

/// Status returned when no hook handles an error
pub const DEFAULT_ERROR_STATUS: i32 = 1;

/// Registered error handlers
#[derive(Default)]
pub struct ErrorHooks {
    handlers: HashMap<ErrorKind, ErrorHandler>,
    fallback: Option<ErrorHandler>,
}

impl ErrorHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle errors of one kind; replaces an earlier handler for that kind
    pub fn on<F>(&mut self, kind: ErrorKind, handler: F)
    where
        F: Fn(&CliError, &mut dyn Write) -> i32 + Send + Sync + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
    }

    /// Handle every kind without a specific handler
    pub fn on_any<F>(&mut self, handler: F)
    where
        F: Fn(&CliError, &mut dyn Write) -> i32 + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(handler));
    }

    /// Resolve an error to a status: specific hook, then catch-all, then default
    pub fn handle(&self, error: &CliError, stderr: &mut dyn Write) -> i32 {
        match self.handlers.get(&error.kind()).or(self.fallback.as_ref()) {
            Some(handler) => handler(error, stderr),
            None => report(error, stderr),
        }
    }
}

impl fmt::Debug for ErrorHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&ErrorKind> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("ErrorHooks")
            .field("kinds", &kinds)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Print `<Kind>: <message>` and return the default status
pub fn report(error: &CliError, stderr: &mut dyn Write) -> i32 {
    if let Err(e) = writeln!(stderr, "{}: {}", error.kind(), error) {
        warn!("Could not write error report: {e}");
    }
    DEFAULT_ERROR_STATUS
}
