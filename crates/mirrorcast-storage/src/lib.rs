//! Mirrorcast Storage -- flat-file store under one data directory.
//!
//! Files are addressed by stored name only; the pipeline never hands
//! this layer a path. Writes are streamed chunk-by-chunk so a download
//! is never buffered whole in memory.

use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid stored name: {0:?}")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Chunked byte stream fed into `write_stream`. Transport failures
/// arrive as chunk errors and abort the write.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// File store seam for the pipeline.
#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    /// Stream chunks into a file, replacing any existing content.
    /// Returns the number of bytes written. On a chunk or io error the
    /// partial file is left on disk; callers remove it via [`FileStore::remove`]
    /// to keep failed writes unaddressable.
    async fn write_stream(&self, name: &str, stream: ByteStream) -> Result<u64>;

    /// Read a stored file whole into an immutable byte block.
    async fn read(&self, name: &str) -> Result<Bytes>;

    async fn remove(&self, name: &str) -> Result<()>;

    async fn exists(&self, name: &str) -> Result<bool>;
}

/// [`FileStore`] over a single local directory.
pub struct LocalFileStore {
    dir: PathBuf,
}

impl LocalFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stored names must stay inside the data directory.
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(StorageError::InvalidName(name.into()));
        }
        Ok(self.dir.join(name))
    }
}

#[async_trait::async_trait]
impl FileStore for LocalFileStore {
    async fn write_stream(&self, name: &str, mut stream: ByteStream) -> Result<u64> {
        let path = self.resolve(name)?;
        let mut file = tokio::fs::File::create(&path).await?;
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        tracing::debug!(name, written, "file written");
        Ok(written)
    }

    async fn read(&self, name: &str) -> Result<Bytes> {
        let path = self.resolve(name)?;
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        tokio::fs::remove_file(&path).await?;
        tracing::debug!(name, "file removed");
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.resolve(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}
