//! The remote file system capability consumed by every operation of this crate.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::metadata::Metadata;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Status codes a remote file system reports for a failed call
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    #[error("Eof")]
    Eof = 1,
    #[error("No such file")]
    NoSuchFile = 2,
    #[error("Permission denied")]
    PermissionDenied = 3,
    #[error("Failure")]
    Failure = 4,
    #[error("Bad message")]
    BadMessage = 5,
    #[error("No connection")]
    NoConnection = 6,
    #[error("Connection lost")]
    ConnectionLost = 7,
    #[error("Operation unsupported")]
    OpUnsupported = 8,
}

impl From<u32> for StatusCode {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Eof,
            2 => Self::NoSuchFile,
            3 => Self::PermissionDenied,
            5 => Self::BadMessage,
            6 => Self::NoConnection,
            7 => Self::ConnectionLost,
            8 => Self::OpUnsupported,
            _ => Self::Failure,
        }
    }
}

/// Error returned by a single remote call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct RemoteError {
    pub code: StatusCode,
    pub message: String,
}

impl RemoteError {
    pub fn new<M: Into<String>>(code: StatusCode, message: M) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<StatusCode> for RemoteError {
    fn from(code: StatusCode) -> Self {
        Self::new(code, code.to_string())
    }
}

/// Primitive operations of a remote hierarchical file system.
///
/// Implementations are handed to the operations of this crate already
/// connected and authenticated. A handle is used by one operation at a
/// time; callers serialize access or hold one handle per operation.
#[async_trait]
pub trait RemoteFs: Send + Sync {
    /// Stream returned by [`RemoteFs::open_read`].
    type Reader: AsyncRead + Unpin + Send;
    /// Stream returned by [`RemoteFs::create`].
    type Writer: AsyncWrite + Unpin + Send;

    /// Lists the direct children of a directory as `(name, attributes)` pairs.
    ///
    /// The `.` and `..` pseudo entries may be returned; callers drop them.
    async fn list_dir(&self, path: &str) -> RemoteResult<Vec<(String, Metadata)>>;

    /// Queries attributes of a single path.
    async fn metadata(&self, path: &str) -> RemoteResult<Metadata>;

    /// Removes a file or an empty directory.
    async fn remove(&self, path: &str) -> RemoteResult<()>;

    /// Renames a file or directory.
    async fn rename(&self, old_path: &str, new_path: &str) -> RemoteResult<()>;

    /// Sets the permission bits of a path.
    async fn chmod(&self, path: &str, mode: u32) -> RemoteResult<()>;

    /// Creates a single directory.
    async fn create_dir(&self, path: &str) -> RemoteResult<()>;

    /// Opens a file read-only.
    async fn open_read(&self, path: &str) -> RemoteResult<Self::Reader>;

    /// Opens a file write-only, creating it if missing and truncating it otherwise.
    async fn create(&self, path: &str) -> RemoteResult<Self::Writer>;
}
