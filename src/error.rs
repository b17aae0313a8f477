//! Error types for refresh-kit.

use std::fmt;
use std::path::PathBuf;

/// Boxed error raised by a user-provided source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for refresh-kit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for refresh-kit operations.
#[derive(Debug)]
pub enum Error {
    /// Opening or reading a file failed.
    Io {
        op: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// Raw bytes could not be decoded into the target type.
    DeserializationError(String),

    /// A user-provided source failed to produce a value.
    Source(BoxError),

    /// The source wrapped by a transform failed.
    InnerSource(Box<Error>),

    /// The first read performed during construction failed.
    InitialLoad(Box<Error>),

    /// A read or transform panicked during a refresh attempt.
    Panicked(String),

    /// Invalid configuration (zero interval, reporter installed twice, ...).
    ConfigError(String),
}

impl Error {
    /// Wrap any error (or message) raised by a custom [`SourceReader`](crate::SourceReader).
    ///
    /// ```
    /// use refresh_kit::Error;
    ///
    /// let err = Error::source_failed("endpoint returned 503");
    /// assert_eq!(err.to_string(), "Source error: endpoint returned 503");
    /// ```
    pub fn source_failed(err: impl Into<BoxError>) -> Self {
        Error::Source(err.into())
    }

    /// Innermost error of a wrapped chain (`InitialLoad` / `InnerSource`).
    pub fn root(&self) -> &Error {
        match self {
            Error::InnerSource(inner) | Error::InitialLoad(inner) => inner.root(),
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { op, path, source } => {
                write!(f, "{} file '{}': {}", op, path.display(), source)
            }
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::Source(err) => write!(f, "Source error: {}", err),
            Error::InnerSource(err) => write!(f, "inner source: {}", err),
            Error::InitialLoad(err) => write!(f, "retrieve value from source: {}", err),
            Error::Panicked(msg) => write!(f, "Panic while refreshing the value: {}", msg),
            Error::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Source(err) => Some(err.as_ref()),
            Error::InnerSource(err) | Error::InitialLoad(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::DeserializationError(format!("json: {}", e))
    }
}

impl From<quick_xml::de::DeError> for Error {
    fn from(e: quick_xml::de::DeError) -> Self {
        Error::DeserializationError(format!("xml: {}", e))
    }
}
