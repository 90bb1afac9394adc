//! File System Abstraction
//!
//! Downloads, metadata snapshots and ingestion reads all go through
//! [`FileSystemAccess`] so the transfer pipeline can be exercised against a
//! temporary directory in tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::Result;

/// Streaming writer handed out by [`FileSystemAccess::open_write_stream`].
pub type DynAsyncWrite = dyn core_async::io::AsyncWrite + Send + Unpin;

/// File system access trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn save(fs: &dyn FileSystemAccess, dir: &Path, data: Bytes) -> Result<()> {
///     fs.create_dir_all(dir).await?;
///     fs.write_file(&dir.join("report.pdf"), data).await
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, replacing any previous contents
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// Open a file for streaming writes, truncating it first
    async fn open_write_stream(&self, path: &Path) -> Result<Box<DynAsyncWrite>>;
}
