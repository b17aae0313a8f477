//! Transform composition for sources.
//!
//! [`MapReader`] wraps a `SourceReader<A>` with a fallible `A -> B` function,
//! yielding a `SourceReader<B>`. Wrappers can be chained to build pipelines
//! such as bytes -> JSON record -> domain object.

use crate::decode;
use crate::error::{Error, Result};
use crate::source::SourceReader;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

/// Source that applies a conversion to the output of an inner source.
///
/// Inner source failures are wrapped in [`Error::InnerSource`]; conversion
/// failures are returned as-is.
pub struct MapReader<S, F, A> {
    source: S,
    f: F,
    _input: PhantomData<fn() -> A>,
}

impl<S, F, A> fmt::Debug for MapReader<S, F, A>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapReader")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Wrap `source` so every read is passed through `f`.
///
/// ```
/// use refresh_kit::map::map_source;
/// use refresh_kit::source::from_fn;
/// use refresh_kit::SourceReader;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> refresh_kit::Result<()> {
/// let raw = from_fn(|_ctx| async { Ok("42".to_string()) });
/// let parsed = map_source(raw, |s: String| {
///     s.parse::<u32>()
///         .map_err(refresh_kit::Error::source_failed)
/// });
/// assert_eq!(parsed.read(&CancellationToken::new()).await?, 42);
/// # Ok(())
/// # }
/// ```
pub fn map_source<S, F, A, B>(source: S, f: F) -> MapReader<S, F, A>
where
    S: SourceReader<A>,
    F: Fn(A) -> Result<B> + Send + Sync + 'static,
{
    MapReader {
        source,
        f,
        _input: PhantomData,
    }
}

impl<S, F, A, B> SourceReader<B> for MapReader<S, F, A>
where
    S: SourceReader<A>,
    F: Fn(A) -> Result<B> + Send + Sync + 'static,
    A: Send + 'static,
{
    async fn read(&self, ctx: &CancellationToken) -> Result<B> {
        let value = self
            .source
            .read(ctx)
            .await
            .map_err(|e| Error::InnerSource(Box::new(e)))?;

        (self.f)(value)
    }
}

/// Combinators available on every [`SourceReader`].
pub trait SourceReaderExt<A>: SourceReader<A> + Sized {
    /// Pass every read through `f`. See [`map_source`].
    fn map<F, B>(self, f: F) -> MapReader<Self, F, A>
    where
        F: Fn(A) -> Result<B> + Send + Sync + 'static,
    {
        map_source(self, f)
    }
}

impl<A, S: SourceReader<A>> SourceReaderExt<A> for S {}

/// Decoding combinators for byte sources.
pub trait BytesReaderExt: SourceReader<Vec<u8>> + Sized {
    /// Decode every read as JSON into `T`.
    fn json<T>(self) -> MapReader<Self, fn(Vec<u8>) -> Result<T>, Vec<u8>>
    where
        T: DeserializeOwned + 'static,
    {
        map_source(self, decode::json::<T> as fn(Vec<u8>) -> Result<T>)
    }

    /// Decode every read as XML into `T`.
    fn xml<T>(self) -> MapReader<Self, fn(Vec<u8>) -> Result<T>, Vec<u8>>
    where
        T: DeserializeOwned + 'static,
    {
        map_source(self, decode::xml::<T> as fn(Vec<u8>) -> Result<T>)
    }
}

impl<S: SourceReader<Vec<u8>>> BytesReaderExt for S {}
