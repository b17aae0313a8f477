//! Builder pattern for configuring a refreshable value.

use crate::config::RefreshConfig;
use crate::error::Result;
use crate::observability::{ErrorReporter, ReporterSlot};
use crate::refreshable::Refreshable;
use crate::source::SourceReader;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fluent builder for a [`Refreshable`].
///
/// Provides chainable methods to set the refresh interval and the reporter
/// that receives refresh errors for this instance only.
///
/// # Example
///
/// ```ignore
/// use refresh_kit::{Refreshable, observability::LogReporter};
/// use std::time::Duration;
///
/// // source is a SourceReader<Flags> implementation
/// let flags = Refreshable::builder(source)
///     .with_interval(Duration::from_secs(15))
///     .with_reporter(LogReporter)
///     .build(&ctx)
///     .await?;
/// ```
pub struct RefreshableBuilder<S, T> {
    source: S,
    interval: Duration,
    reporter: ReporterSlot,
    _value: PhantomData<fn() -> T>,
}

impl<S, T> RefreshableBuilder<S, T>
where
    S: SourceReader<T>,
    T: Send + Sync + 'static,
{
    /// Create a new builder with default settings.
    pub(crate) fn new(source: S) -> Self {
        Self {
            source,
            interval: RefreshConfig::default().interval(),
            reporter: ReporterSlot::Global,
            _value: PhantomData,
        }
    }

    /// Set the refresh interval.
    ///
    /// # Example
    ///
    /// ```ignore
    /// builder.with_interval(Duration::from_secs(60))
    /// ```
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Take settings from a [`RefreshConfig`], e.g. one loaded with
    /// [`RefreshConfig::from_env`].
    pub fn with_config(mut self, config: RefreshConfig) -> Self {
        self.interval = config.interval();
        self
    }

    /// Report refresh errors of this instance to `reporter` instead of the
    /// process-wide one.
    pub fn with_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = ReporterSlot::Custom(Arc::new(reporter));
        self
    }

    /// Perform the initial load and start the background refresh.
    ///
    /// # Errors
    ///
    /// - `Error::ConfigError`: interval is zero
    /// - `Error::InitialLoad`: the first read failed
    pub async fn build(self, ctx: &CancellationToken) -> Result<Refreshable<T>> {
        Refreshable::start(ctx, self.interval, self.source, self.reporter).await
    }
}
