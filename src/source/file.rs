//! File-based byte source.

use super::SourceReader;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

/// Reads the full content of a file on every refresh.
///
/// Pair it with [`SourceReaderExt::json`](crate::map::SourceReaderExt::json)
/// or [`SourceReaderExt::xml`](crate::map::SourceReaderExt::xml) to get a typed value.
///
/// Close failures are not reported: the file handle is released on drop and
/// the OS result of closing a read-only descriptor is not surfaced. Open and
/// read failures are hard errors.
///
/// # Example
///
/// ```no_run
/// # use refresh_kit::{FileReader, SourceReader};
/// # use tokio_util::sync::CancellationToken;
/// # async fn example() -> refresh_kit::Result<()> {
/// let reader = FileReader::new("/etc/myapp/flags.json");
/// let bytes = reader.read(&CancellationToken::new()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct FileReader {
    path: PathBuf,
}

impl FileReader {
    /// Create a reader for the file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileReader {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path this reader loads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, op: &'static str, source: std::io::Error) -> Error {
        Error::Io {
            op,
            path: self.path.clone(),
            source,
        }
    }
}

impl SourceReader<Vec<u8>> for FileReader {
    // Cancellation is ignored: a local read is short and not worth interrupting.
    async fn read(&self, _ctx: &CancellationToken) -> Result<Vec<u8>> {
        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| self.io_error("open", e))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .await
            .map_err(|e| self.io_error("read", e))?;

        debug!("✓ Read {} bytes from {}", bytes.len(), self.path.display());
        Ok(bytes)
    }
}
