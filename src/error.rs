use std::io;
use thiserror::Error;

use crate::fs::RemoteError;

pub type TreeResult<T> = Result<T, Error>;

/// Underlying reason of an open or copy failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Cause {
    /// Reported by the remote file system
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// Local or stream I/O
    #[error("I/O: {message}")]
    Io { kind: io::ErrorKind, message: String },
    /// The cancellation token fired while copying
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<io::Error> for Cause {
    fn from(error: io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Errors of listing, bulk and transfer operations.
///
/// Every variant names the path of the call that failed and carries the
/// remote error as it was reported.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("unable to list {path}: {source}")]
    ListFailed { path: String, source: RemoteError },
    #[error("unable to remove {path}: {source}")]
    RemoveFailed { path: String, source: RemoteError },
    #[error("unable to chmod {path} to {mode:o}: {source}")]
    ChmodFailed {
        path: String,
        mode: u32,
        source: RemoteError,
    },
    #[error("unable to rename {from} to {to}: {source}")]
    RenameFailed {
        from: String,
        to: String,
        source: RemoteError,
    },
    #[error("unable to create directory {path}: {source}")]
    MkdirFailed { path: String, source: RemoteError },
    #[error("unable to open {path}: {source}")]
    OpenFailed { path: String, source: Cause },
    /// Transfer interrupted after both ends were opened
    #[error("copy from {from} to {to} failed after {bytes_copied} bytes: {source}")]
    CopyFailed {
        from: String,
        to: String,
        bytes_copied: u64,
        source: Cause,
    },
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns the remote error behind this failure, if any
    #[must_use]
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::ListFailed { source, .. }
            | Self::RemoveFailed { source, .. }
            | Self::ChmodFailed { source, .. }
            | Self::RenameFailed { source, .. }
            | Self::MkdirFailed { source, .. }
            | Self::OpenFailed {
                source: Cause::Remote(source),
                ..
            }
            | Self::CopyFailed {
                source: Cause::Remote(source),
                ..
            } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::StatusCode;

    #[test]
    fn display_names_path() {
        let error = Error::ChmodFailed {
            path: "/root/a".to_owned(),
            mode: 0o750,
            source: RemoteError::new(StatusCode::PermissionDenied, "denied"),
        };
        assert_eq!(
            error.to_string(),
            "unable to chmod /root/a to 750: Permission denied: denied"
        );
    }

    #[test]
    fn io_cause_keeps_kind() {
        let cause = Cause::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
        assert!(matches!(
            cause,
            Cause::Io {
                kind: io::ErrorKind::BrokenPipe,
                ..
            }
        ));
    }

    #[test]
    fn remote_source() {
        let source = RemoteError::from(StatusCode::NoSuchFile);
        let error = Error::OpenFailed {
            path: "/x".to_owned(),
            source: source.clone().into(),
        };
        assert_eq!(error.remote(), Some(&source));
        assert_eq!(Error::Cancelled.remote(), None);
    }
}
