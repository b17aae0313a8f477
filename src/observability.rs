//! Error reporting for background refreshes.
//!
//! Refresh failures never reach callers of `value()`; they are handed to an
//! [`ErrorReporter`]. By default that is [`LogReporter`], which writes through
//! the `log` facade. A different process-wide reporter can be installed once
//! at startup with [`set_reporter`], or a reporter can be given to a single
//! instance through [`RefreshableBuilder::with_reporter`](crate::RefreshableBuilder::with_reporter).

use crate::error::{Error, Result};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// Sink for non-fatal refresh errors.
///
/// Called from the refresh task: implementations must return quickly and
/// must not block on the refresh loop itself.
pub trait ErrorReporter: Send + Sync {
    /// Record an error raised while refreshing under `ctx`.
    fn report(&self, ctx: &CancellationToken, message: fmt::Arguments<'_>);
}

/// Default reporter: emits `error!` records via the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, _ctx: &CancellationToken, message: fmt::Arguments<'_>) {
        error!("{}", message);
    }
}

impl<R: ErrorReporter + ?Sized> ErrorReporter for Arc<R> {
    fn report(&self, ctx: &CancellationToken, message: fmt::Arguments<'_>) {
        (**self).report(ctx, message)
    }
}

static GLOBAL_REPORTER: OnceLock<Box<dyn ErrorReporter>> = OnceLock::new();
static DEFAULT_REPORTER: LogReporter = LogReporter;

/// Install the process-wide reporter.
///
/// Meant to be called once at startup. The global slot is looked up on every
/// report, so instances built earlier also switch to the installed reporter.
/// Can only succeed once.
///
/// # Errors
///
/// Returns `Error::ConfigError` if a reporter was already installed.
pub fn set_reporter(reporter: impl ErrorReporter + 'static) -> Result<()> {
    GLOBAL_REPORTER
        .set(Box::new(reporter))
        .map_err(|_| Error::ConfigError("error reporter already installed".to_string()))
}

/// The process-wide reporter, or [`LogReporter`] when none was installed.
pub fn reporter() -> &'static dyn ErrorReporter {
    match GLOBAL_REPORTER.get() {
        Some(reporter) => reporter.as_ref(),
        None => &DEFAULT_REPORTER,
    }
}

/// Reporter bound to one refreshable instance.
#[derive(Clone)]
pub(crate) enum ReporterSlot {
    Global,
    Custom(Arc<dyn ErrorReporter>),
}

impl ReporterSlot {
    pub(crate) fn report(&self, ctx: &CancellationToken, message: fmt::Arguments<'_>) {
        match self {
            ReporterSlot::Global => reporter().report(ctx, message),
            ReporterSlot::Custom(reporter) => reporter.report(ctx, message),
        }
    }
}

impl fmt::Debug for ReporterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReporterSlot::Global => f.write_str("Global"),
            ReporterSlot::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Reporter that keeps every message in memory.
///
/// Supported as a public testing helper: hand a clone to
/// [`RefreshableBuilder::with_reporter`](crate::RefreshableBuilder::with_reporter)
/// and assert on [`messages`](Self::messages) afterwards. Messages are never
/// evicted, so it is not meant for long-running production instances.
#[derive(Clone, Debug, Default)]
pub struct CollectingReporter {
    messages: Arc<parking_lot::Mutex<Vec<String>>>,
}

impl CollectingReporter {
    /// Create an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages reported so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Number of messages reported so far.
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Whether nothing was reported yet.
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, _ctx: &CancellationToken, message: fmt::Arguments<'_>) {
        self.messages.lock().push(message.to_string());
    }
}
