//! [`RemoteFs`] over an SFTP session from `russh-sftp`.
//!
//! Establishing the SSH connection and opening the `sftp` subsystem is left
//! to the caller; this adapter only maps primitives and errors.

use russh_sftp::{
    client::{error::Error as SftpError, fs::File, SftpSession},
    protocol::FileAttributes,
};

use crate::{
    fs::{RemoteError, RemoteFs, RemoteResult, StatusCode},
    metadata::{Metadata, PERMISSION_MASK},
};

impl From<SftpError> for RemoteError {
    fn from(error: SftpError) -> Self {
        match error {
            SftpError::Status(status) => Self::new(
                StatusCode::from(status.status_code as u32),
                status.error_message,
            ),
            SftpError::Timeout => Self::new(StatusCode::ConnectionLost, "Timeout"),
            other => Self::new(StatusCode::Failure, other.to_string()),
        }
    }
}

impl From<&FileAttributes> for Metadata {
    fn from(attrs: &FileAttributes) -> Self {
        Self {
            size: attrs.size,
            uid: attrs.uid,
            gid: attrs.gid,
            permissions: attrs.permissions,
            atime: attrs.atime,
            mtime: attrs.mtime,
        }
    }
}

/// Falls back to `rmdir` when unlinking was refused, which is what servers
/// report for directories. When `rmdir` fails too, the unlink error is
/// returned so a protected file keeps its original status.
async fn remove_with_fallback<R, Fut>(
    path: &str,
    unlinked: RemoteResult<()>,
    rmdir: R,
) -> RemoteResult<()>
where
    R: FnOnce() -> Fut,
    Fut: std::future::Future<Output = RemoteResult<()>>,
{
    let error = match unlinked {
        Ok(()) => return Ok(()),
        Err(error) => error,
    };

    match error.code {
        StatusCode::Failure | StatusCode::PermissionDenied => {
            trace!("remove {} failed with {}, trying rmdir", path, error);
            rmdir().await.map_err(|rmdir_error| {
                trace!("rmdir {} failed with {}", path, rmdir_error);
                error
            })
        }
        _ => Err(error),
    }
}

#[async_trait]
impl RemoteFs for SftpSession {
    type Reader = File;
    type Writer = File;

    async fn list_dir(&self, path: &str) -> RemoteResult<Vec<(String, Metadata)>> {
        Ok(self
            .read_dir(path)
            .await?
            .map(|entry| (entry.file_name(), Metadata::from(&entry.metadata())))
            .collect())
    }

    async fn metadata(&self, path: &str) -> RemoteResult<Metadata> {
        Ok(Metadata::from(&SftpSession::metadata(self, path).await?))
    }

    /// Tries `SSH_FXP_REMOVE` first, then `SSH_FXP_RMDIR`.
    async fn remove(&self, path: &str) -> RemoteResult<()> {
        let unlinked = self.remove_file(path).await.map_err(RemoteError::from);
        remove_with_fallback(path, unlinked, || async {
            self.remove_dir(path).await.map_err(RemoteError::from)
        })
        .await
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> RemoteResult<()> {
        Ok(SftpSession::rename(self, old_path, new_path).await?)
    }

    async fn chmod(&self, path: &str, mode: u32) -> RemoteResult<()> {
        let mut attrs = SftpSession::metadata(self, path).await?;
        attrs.size = None;
        attrs.uid = None;
        attrs.gid = None;
        attrs.atime = None;
        attrs.mtime = None;
        attrs.permissions = Some(mode & PERMISSION_MASK);

        Ok(self.set_metadata(path, attrs).await?)
    }

    async fn create_dir(&self, path: &str) -> RemoteResult<()> {
        Ok(SftpSession::create_dir(self, path).await?)
    }

    async fn open_read(&self, path: &str) -> RemoteResult<Self::Reader> {
        Ok(self.open(path).await?)
    }

    async fn create(&self, path: &str) -> RemoteResult<Self::Writer> {
        Ok(SftpSession::create(self, path).await?)
    }
}
