//! Source abstraction: anything that can produce a fresh value on demand.
//!
//! A [`SourceReader`] is the only contract a [`Refreshable`](crate::Refreshable)
//! needs from the outside world. Concrete byte producers (local files, secret
//! stores, remote config services) implement it, and
//! [`SourceReaderExt`](crate::map::SourceReaderExt) layers decoding on top.

pub mod file;

pub use file::FileReader;

use crate::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Trait for reading the current value from an external source.
///
/// Implementations should apply their own timeouts: a read that never
/// completes blocks the refresh loop until the token is cancelled.
///
/// # Example
///
/// ```
/// use refresh_kit::{Error, Result, SourceReader};
/// use tokio_util::sync::CancellationToken;
///
/// struct Constant(u32);
///
/// impl SourceReader<u32> for Constant {
///     async fn read(&self, ctx: &CancellationToken) -> Result<u32> {
///         if ctx.is_cancelled() {
///             return Err(Error::source_failed("cancelled"));
///         }
///         Ok(self.0)
///     }
/// }
/// ```
pub trait SourceReader<T>: Send + Sync + 'static {
    /// Produce the current value, or fail.
    fn read(&self, ctx: &CancellationToken) -> impl Future<Output = Result<T>> + Send;
}

impl<T, S> SourceReader<T> for Arc<S>
where
    S: SourceReader<T>,
{
    fn read(&self, ctx: &CancellationToken) -> impl Future<Output = Result<T>> + Send {
        (**self).read(ctx)
    }
}

impl<T, S> SourceReader<T> for Box<S>
where
    S: SourceReader<T>,
{
    fn read(&self, ctx: &CancellationToken) -> impl Future<Output = Result<T>> + Send {
        (**self).read(ctx)
    }
}

/// Source backed by a closure returning a future.
///
/// Created with [`from_fn`].
#[derive(Clone)]
pub struct FnReader<F> {
    f: F,
}

/// Build a [`SourceReader`] from a closure.
///
/// The closure receives a clone of the cancellation token so the returned
/// future can own it.
///
/// ```
/// use refresh_kit::source::from_fn;
/// use refresh_kit::SourceReader;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> refresh_kit::Result<()> {
/// let source = from_fn(|_ctx| async { Ok(b"{\"enabled\":true}".to_vec()) });
/// let bytes = source.read(&CancellationToken::new()).await?;
/// assert!(!bytes.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn from_fn<T, F, Fut>(f: F) -> FnReader<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send,
{
    FnReader { f }
}

impl<T, F, Fut> SourceReader<T> for FnReader<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send,
{
    fn read(&self, ctx: &CancellationToken) -> impl Future<Output = Result<T>> + Send {
        (self.f)(ctx.clone())
    }
}
