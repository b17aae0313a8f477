//! # refresh-kit
//!
//! Type-safe values that refresh themselves in the background.
//!
//! ## Features
//!
//! - **Fully Generic:** Refresh any `T` produced by a `SourceReader<T>`
//! - **Source Agnostic:** Local files, secret stores, remote config services or custom sources
//! - **Composable:** Layer JSON / XML decoding or any fallible conversion on top of a raw source
//! - **Fail Fast, Then Stay Up:** The first load must succeed; later failures keep the last good value
//! - **Concurrency Safe:** Lock-protected whole-value swaps, readers never see partial updates
//! - **Cancellable:** One `CancellationToken` stops the background refresh
//!
//! ## Quick Start
//!
//! ```ignore
//! use refresh_kit::{FileReader, Refreshable, map::BytesReaderExt};
//! use serde::Deserialize;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! // 1. Define the value
//! #[derive(Clone, Deserialize)]
//! struct Flags {
//!     dark_mode: bool,
//! }
//!
//! // 2. Describe where it comes from
//! let source = FileReader::new("flags.json").json::<Flags>();
//!
//! // 3. Load it and keep it fresh
//! let ctx = CancellationToken::new();
//! let flags = Refreshable::new(&ctx, Duration::from_secs(30), source).await?;
//!
//! // 4. Read it anywhere
//! if flags.value().dark_mode { /* ... */ }
//!
//! // 5. Stop refreshing
//! ctx.cancel();
//! ```

#[macro_use]
extern crate log;

pub mod builder;
pub mod config;
pub mod decode;
pub mod error;
pub mod map;
pub mod observability;
pub mod refreshable;
pub mod source;

// Re-exports for convenience
pub use builder::RefreshableBuilder;
pub use config::RefreshConfig;
pub use error::{Error, Result};
pub use map::{map_source, BytesReaderExt, MapReader, SourceReaderExt};
pub use observability::{set_reporter, ErrorReporter, LogReporter};
pub use refreshable::{FeatureFlag, Refreshable};
pub use source::{FileReader, SourceReader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
