//! Refreshable value - a typed value kept up to date in the background.

use crate::config::validate_interval;
use crate::error::{Error, Result};
use crate::observability::ReporterSlot;
use crate::source::SourceReader;
use futures::FutureExt;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Read access to a value that may change over time.
///
/// Lets consumers depend on the capability instead of on [`Refreshable`].
pub trait FeatureFlag<T>: Send + Sync {
    /// Current value. Safe to call concurrently.
    fn value(&self) -> T;
}

/// A value loaded from a [`SourceReader`] and refreshed at a fixed interval.
///
/// The first read happens during construction and must succeed. A background
/// task then re-reads the source every `interval`, measured from the end of
/// the previous attempt. Failed refreshes keep the previous value and are
/// sent to the error reporter; they never surface through [`value`](Self::value).
///
/// The background task lives until the [`CancellationToken`] passed at
/// construction is cancelled. Dropping every handle does **not** stop it.
///
/// Whether the value has gone stale is not observable here. Sources that
/// need it should carry freshness metadata inside `T`.
///
/// # Example
///
/// ```no_run
/// use refresh_kit::map::BytesReaderExt;
/// use refresh_kit::{FileReader, Refreshable};
/// use serde::Deserialize;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// #[derive(Clone, Deserialize)]
/// struct Flags {
///     new_checkout: bool,
/// }
///
/// # async fn example() -> refresh_kit::Result<()> {
/// let ctx = CancellationToken::new();
/// let flags = Refreshable::new(
///     &ctx,
///     Duration::from_secs(10),
///     FileReader::new("flags.json").json::<Flags>(),
/// )
/// .await?;
///
/// if flags.value().new_checkout {
///     // ...
/// }
///
/// ctx.cancel(); // stops the background refresh
/// # Ok(())
/// # }
/// ```
pub struct Refreshable<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    value: RwLock<Arc<T>>,
    interval: Duration,
}

impl<T> Clone for Refreshable<T> {
    fn clone(&self) -> Self {
        Refreshable {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Refreshable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refreshable")
            .field("value", &*self.shared.value.read())
            .field("interval", &self.shared.interval)
            .finish()
    }
}

impl<T: Send + Sync + 'static> Refreshable<T> {
    /// Load the initial value and start refreshing it every `interval`.
    ///
    /// Refresh errors go to the process-wide reporter
    /// (see [`set_reporter`](crate::observability::set_reporter)).
    ///
    /// # Errors
    ///
    /// - `Error::ConfigError`: `interval` is zero
    /// - `Error::InitialLoad`: the first read failed or panicked; no background
    ///   task is started
    pub async fn new<S>(ctx: &CancellationToken, interval: Duration, source: S) -> Result<Self>
    where
        S: SourceReader<T>,
    {
        Self::start(ctx, interval, source, ReporterSlot::Global).await
    }

    /// Create a builder for configuring interval and reporter.
    pub fn builder<S>(source: S) -> crate::builder::RefreshableBuilder<S, T>
    where
        S: SourceReader<T>,
    {
        crate::builder::RefreshableBuilder::new(source)
    }

    pub(crate) async fn start<S>(
        ctx: &CancellationToken,
        interval: Duration,
        source: S,
        reporter: ReporterSlot,
    ) -> Result<Self>
    where
        S: SourceReader<T>,
    {
        validate_interval(interval)?;

        let initial = attempt(&source, ctx)
            .await
            .map_err(|e| Error::InitialLoad(Box::new(e)))?;

        let shared = Arc::new(Shared {
            value: RwLock::new(Arc::new(initial)),
            interval,
        });

        let worker = RefreshLoop {
            shared: Arc::clone(&shared),
            source,
            reporter,
            ctx: ctx.clone(),
        };
        tokio::spawn(worker.run());

        debug!("✓ Refreshable started (interval: {:?})", interval);
        Ok(Refreshable { shared })
    }

    /// Shared pointer to the current value, without cloning `T`.
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.shared.value.read())
    }

    /// Refresh interval.
    pub fn interval(&self) -> Duration {
        self.shared.interval
    }
}

impl<T: Clone + Send + Sync + 'static> Refreshable<T> {
    /// Current value: the result of the most recent successful read.
    pub fn value(&self) -> T {
        T::clone(&self.load())
    }
}

impl<T: Clone + Send + Sync + 'static> FeatureFlag<T> for Refreshable<T> {
    fn value(&self) -> T {
        Refreshable::value(self)
    }
}

struct RefreshLoop<T, S> {
    shared: Arc<Shared<T>>,
    source: S,
    reporter: ReporterSlot,
    ctx: CancellationToken,
}

impl<T, S> RefreshLoop<T, S>
where
    T: Send + Sync + 'static,
    S: SourceReader<T>,
{
    async fn run(self) {
        loop {
            tokio::select! {
                biased;
                _ = self.ctx.cancelled() => break,
                _ = tokio::time::sleep(self.shared.interval) => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = self.ctx.cancelled() => break,
                outcome = attempt(&self.source, &self.ctx) => outcome,
            };

            match outcome {
                Ok(value) => {
                    let previous =
                        std::mem::replace(&mut *self.shared.value.write(), Arc::new(value));
                    drop(previous);
                    debug!("✓ Refreshed value");
                }
                Err(e) => {
                    self.reporter.report(
                        &self.ctx,
                        format_args!("Refreshing the value failed because: {}.", e),
                    );
                }
            }
        }

        info!("Refresh loop stopped: context cancelled");
    }
}

/// One read, with panics turned into `Error::Panicked`.
async fn attempt<T, S>(source: &S, ctx: &CancellationToken) -> Result<T>
where
    S: SourceReader<T>,
{
    // The call happens inside the async block so a panic raised before the
    // first poll is caught as well.
    let read = async { source.read(ctx).await };

    match AssertUnwindSafe(read).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(Error::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::CollectingReporter;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::time::{sleep, Instant};

    const INTERVAL: Duration = Duration::from_millis(100);

    #[derive(Clone, Copy, Debug)]
    enum Step {
        Value(u32),
        Fail,
        Panic,
    }

    /// Plays `steps` in order, repeating the last one once exhausted.
    #[derive(Clone)]
    struct ScriptedSource {
        steps: Arc<Vec<Step>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>) -> Self {
            ScriptedSource {
                steps: Arc::new(steps),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SourceReader<u32> for ScriptedSource {
        async fn read(&self, _ctx: &CancellationToken) -> Result<u32> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self
                .steps
                .get(n)
                .or_else(|| self.steps.last())
                .copied()
                .unwrap_or(Step::Fail);

            match step {
                Step::Value(v) => Ok(v),
                Step::Fail => Err(Error::source_failed(format!("scripted failure #{}", n))),
                Step::Panic => panic!("scripted panic #{}", n),
            }
        }
    }

    async fn start(
        ctx: &CancellationToken,
        source: ScriptedSource,
        reporter: &CollectingReporter,
    ) -> Result<Refreshable<u32>> {
        Refreshable::start(
            ctx,
            INTERVAL,
            source,
            ReporterSlot::Custom(Arc::new(reporter.clone())),
        )
        .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_after_construction_is_first_read() {
        let ctx = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Value(7)]);
        let reporter = CollectingReporter::new();

        let flag = start(&ctx, source.clone(), &reporter)
            .await
            .expect("Failed to construct");

        assert_eq!(flag.value(), 7);
        assert_eq!(source.calls(), 1);
        ctx.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_replaces_value_each_interval() {
        let ctx = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Value(1), Step::Value(2), Step::Value(3)]);
        let reporter = CollectingReporter::new();

        let flag = start(&ctx, source.clone(), &reporter)
            .await
            .expect("Failed to construct");
        assert_eq!(flag.value(), 1);

        sleep(Duration::from_millis(150)).await;
        assert_eq!(flag.value(), 2);

        sleep(INTERVAL).await;
        assert_eq!(flag.value(), 3);
        assert_eq!(source.calls(), 3);
        assert!(reporter.is_empty());
        ctx.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_previous_value() {
        let ctx = CancellationToken::new();
        let source = ScriptedSource::new(vec![
            Step::Value(1),
            Step::Value(2),
            Step::Fail,
            Step::Value(4),
        ]);
        let reporter = CollectingReporter::new();

        let flag = start(&ctx, source.clone(), &reporter)
            .await
            .expect("Failed to construct");

        sleep(Duration::from_millis(150)).await;
        assert_eq!(flag.value(), 2);

        sleep(INTERVAL).await;
        assert_eq!(flag.value(), 2, "failed refresh must not touch the value");
        assert_eq!(reporter.len(), 1);
        assert!(reporter.messages()[0].contains("scripted failure #2"));

        sleep(INTERVAL).await;
        assert_eq!(flag.value(), 4);
        ctx.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_construction_starts_no_task() {
        let ctx = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Fail, Step::Value(9)]);
        let reporter = CollectingReporter::new();

        let result = start(&ctx, source.clone(), &reporter).await;
        match result {
            Err(Error::InitialLoad(inner)) => assert!(matches!(*inner, Error::Source(_))),
            other => panic!("Expected InitialLoad error, got {:?}", other),
        }

        sleep(INTERVAL * 5).await;
        assert_eq!(source.calls(), 1);
        assert!(reporter.is_empty());
        ctx.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_source_calls() {
        let ctx = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Value(1), Step::Value(2), Step::Value(3)]);
        let reporter = CollectingReporter::new();

        let flag = start(&ctx, source.clone(), &reporter)
            .await
            .expect("Failed to construct");

        sleep(Duration::from_millis(150)).await;
        assert_eq!(source.calls(), 2);

        ctx.cancel();
        sleep(INTERVAL * 3).await;

        assert_eq!(source.calls(), 2);
        assert_eq!(flag.value(), 2, "value stays readable after cancellation");
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_during_refresh_is_contained() {
        let ctx = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Value(1), Step::Panic, Step::Value(3)]);
        let reporter = CollectingReporter::new();

        let flag = start(&ctx, source.clone(), &reporter)
            .await
            .expect("Failed to construct");

        sleep(Duration::from_millis(150)).await;
        assert_eq!(flag.value(), 1);
        assert_eq!(reporter.len(), 1);
        assert!(reporter.messages()[0].contains("scripted panic #1"));

        sleep(INTERVAL).await;
        assert_eq!(flag.value(), 3, "loop keeps running after a panic");
        ctx.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_during_construction_fails() {
        let ctx = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Panic]);
        let reporter = CollectingReporter::new();

        let result = start(&ctx, source, &reporter).await;
        match result {
            Err(Error::InitialLoad(inner)) => assert!(matches!(*inner, Error::Panicked(_))),
            other => panic!("Expected InitialLoad(Panicked), got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_rejected_before_reading() {
        let ctx = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Value(1)]);

        let result = Refreshable::<u32>::new(&ctx, Duration::ZERO, source.clone()).await;

        assert!(matches!(result, Err(Error::ConfigError(_))));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_in_flight_read() {
        struct DropFlag(Arc<AtomicBool>);

        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        struct HangingSource {
            calls: AtomicUsize,
            dropped: Arc<AtomicBool>,
        }

        impl SourceReader<u32> for HangingSource {
            async fn read(&self, _ctx: &CancellationToken) -> Result<u32> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Ok(1);
                }
                let _guard = DropFlag(self.dropped.clone());
                sleep(Duration::from_secs(3600)).await;
                Ok(2)
            }
        }

        let ctx = CancellationToken::new();
        let dropped = Arc::new(AtomicBool::new(false));
        let source = HangingSource {
            calls: AtomicUsize::new(0),
            dropped: dropped.clone(),
        };

        let flag = Refreshable::<u32>::builder(source)
            .with_interval(INTERVAL)
            .with_reporter(CollectingReporter::new())
            .build(&ctx)
            .await
            .expect("Failed to construct");

        sleep(Duration::from_millis(150)).await;
        assert!(!dropped.load(Ordering::SeqCst), "read should be in flight");

        ctx.cancel();
        sleep(Duration::from_millis(1)).await;

        assert!(dropped.load(Ordering::SeqCst), "in-flight read must be dropped");
        assert_eq!(flag.value(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_restarts_after_slow_refresh() {
        struct SlowSource {
            starts: parking_lot::Mutex<Vec<Instant>>,
        }

        impl SourceReader<u32> for SlowSource {
            async fn read(&self, _ctx: &CancellationToken) -> Result<u32> {
                let n = {
                    let mut starts = self.starts.lock();
                    starts.push(Instant::now());
                    starts.len()
                };
                if n > 1 {
                    sleep(Duration::from_millis(50)).await;
                }
                Ok(n as u32)
            }
        }

        let ctx = CancellationToken::new();
        let source = Arc::new(SlowSource {
            starts: parking_lot::Mutex::new(Vec::new()),
        });

        let _flag = Refreshable::<u32>::builder(Arc::clone(&source))
            .with_interval(INTERVAL)
            .with_reporter(CollectingReporter::new())
            .build(&ctx)
            .await
            .expect("Failed to construct");

        sleep(Duration::from_millis(420)).await;
        ctx.cancel();

        let starts = source.starts.lock().clone();
        assert!(starts.len() >= 3, "got {} reads", starts.len());
        // Each wait begins after the previous 50ms read finished.
        assert!(starts[2] - starts[1] >= Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_one_value() {
        let ctx = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Value(1), Step::Value(2)]);
        let reporter = CollectingReporter::new();

        let flag = start(&ctx, source.clone(), &reporter)
            .await
            .expect("Failed to construct");
        let other = flag.clone();

        sleep(Duration::from_millis(150)).await;
        assert_eq!(flag.value(), 2);
        assert_eq!(other.value(), 2);
        assert!(Arc::ptr_eq(&flag.load(), &other.load()));
        ctx.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_feature_flag_trait_object() {
        let ctx = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Value(5)]);
        let reporter = CollectingReporter::new();

        let flag = start(&ctx, source, &reporter)
            .await
            .expect("Failed to construct");
        let dyn_flag: Arc<dyn FeatureFlag<u32>> = Arc::new(flag);

        assert_eq!(dyn_flag.value(), 5);
        ctx.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_debug_format_shows_value_and_interval() {
        let ctx = CancellationToken::new();
        let source = ScriptedSource::new(vec![Step::Value(42)]);
        let reporter = CollectingReporter::new();

        let flag = start(&ctx, source, &reporter)
            .await
            .expect("Failed to construct");

        let formatted = format!("{:?}", flag);
        assert!(formatted.starts_with("Refreshable"), "got {}", formatted);
        assert!(formatted.contains("value: 42"), "got {}", formatted);
        assert!(formatted.contains("interval: 100ms"), "got {}", formatted);
        ctx.cancel();
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static str"), "static str");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic payload");
    }
}
