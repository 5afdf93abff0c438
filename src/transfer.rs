//! Copying a single file between the local machine and the remote side.

use bytes::BytesMut;
use std::io;
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
};

use crate::{
    error::{Cause, Error, TreeResult},
    fs::RemoteFs,
    options::Options,
};

/// Downloads `remote_path` into `local_path`, creating or truncating the local file.
///
/// Returns the number of bytes copied. A failure or cancellation after both files are open
/// is reported as [`Error::CopyFailed`] with the bytes copied until then.
pub async fn download<F>(
    fs: &F,
    remote_path: &str,
    local_path: &str,
    options: &Options,
) -> TreeResult<u64>
where
    F: RemoteFs + ?Sized,
{
    debug!("downloading {} to {}", remote_path, local_path);

    options.check()?;
    let mut src = fs
        .open_read(remote_path)
        .await
        .map_err(|e| Error::OpenFailed {
            path: remote_path.to_owned(),
            source: e.into(),
        })?;

    let mut dst = File::create(local_path)
        .await
        .map_err(|e| Error::OpenFailed {
            path: local_path.to_owned(),
            source: e.into(),
        })?;

    let bytes = copy(&mut src, &mut dst, remote_path, local_path, options).await?;
    info!("downloaded {} bytes from {}", bytes, remote_path);

    Ok(bytes)
}

/// Uploads `local_path` to `remote_path`, creating or truncating the remote file.
///
/// Returns the number of bytes copied. A failure or cancellation after both files are open
/// is reported as [`Error::CopyFailed`] with the bytes copied until then.
pub async fn upload<F>(
    fs: &F,
    local_path: &str,
    remote_path: &str,
    options: &Options,
) -> TreeResult<u64>
where
    F: RemoteFs + ?Sized,
{
    debug!("uploading {} to {}", local_path, remote_path);

    options.check()?;
    let mut src = File::open(local_path)
        .await
        .map_err(|e| Error::OpenFailed {
            path: local_path.to_owned(),
            source: e.into(),
        })?;

    let mut dst = fs
        .create(remote_path)
        .await
        .map_err(|e| Error::OpenFailed {
            path: remote_path.to_owned(),
            source: e.into(),
        })?;

    let bytes = copy(&mut src, &mut dst, local_path, remote_path, options).await?;
    info!("uploaded {} bytes to {}", bytes, remote_path);

    Ok(bytes)
}

async fn copy<R, W>(
    src: &mut R,
    dst: &mut W,
    from: &str,
    to: &str,
    options: &Options,
) -> TreeResult<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut bytes_copied = 0u64;
    let mut buf = BytesMut::zeroed(options.get_chunk_size());

    let failed = |bytes_copied: u64, source: Cause| Error::CopyFailed {
        from: from.to_owned(),
        to: to.to_owned(),
        bytes_copied,
        source,
    };

    loop {
        if options.token().is_cancelled() {
            return Err(failed(bytes_copied, Cause::Cancelled));
        }

        let len = src
            .read(&mut buf[..])
            .await
            .map_err(|e| failed(bytes_copied, e.into()))?;
        if len == 0 {
            break;
        }

        let mut written = 0;
        while written < len {
            let n = dst
                .write(&buf[written..len])
                .await
                .map_err(|e| failed(bytes_copied, e.into()))?;
            if n == 0 {
                return Err(failed(
                    bytes_copied,
                    io::Error::from(io::ErrorKind::WriteZero).into(),
                ));
            }

            written += n;
            bytes_copied += n as u64;
        }
    }

    dst.flush()
        .await
        .map_err(|e| failed(bytes_copied, e.into()))?;
    dst.shutdown()
        .await
        .map_err(|e| failed(bytes_copied, e.into()))?;

    Ok(bytes_copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fs::StatusCode, mem::MemoryFs};
    use std::{
        pin::Pin,
        task::{Context, Poll},
    };
    use tokio::io::ReadBuf;
    use tokio_util::sync::CancellationToken;

    /// Accepts at most three bytes per call and fails once `limit` bytes are in
    struct ShortWriter {
        accepted: Vec<u8>,
        limit: usize,
    }

    impl AsyncWrite for ShortWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let room = self.limit - self.accepted.len();
            if room == 0 {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk full")));
            }

            let n = buf.len().min(3).min(room);
            self.accepted.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Serves its data and trips the token on the first read
    struct CancellingReader {
        data: &'static [u8],
        token: CancellationToken,
    }

    impl AsyncRead for CancellingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let n = buf.remaining().min(self.data.len());
            buf.put_slice(&self.data[..n]);
            self.data = &self.data[n..];
            self.token.cancel();
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn partial_write_counts_accepted_bytes() {
        let mut src: &[u8] = &[1u8; 40];
        let mut dst = ShortWriter {
            accepted: Vec::new(),
            limit: 10,
        };

        let err = copy(&mut src, &mut dst, "a", "b", &Options::new().chunk_size(16))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::CopyFailed { bytes_copied: 10, source: Cause::Io { .. }, .. }
        ));
        assert_eq!(dst.accepted.len(), 10);
    }

    #[tokio::test]
    async fn cancellation_mid_copy_keeps_progress() {
        let token = CancellationToken::new();
        let mut src = CancellingReader {
            data: b"0123456789",
            token: token.clone(),
        };
        let mut dst = Vec::new();

        let err = copy(
            &mut src,
            &mut dst,
            "a",
            "b",
            &Options::new().chunk_size(4).cancel(token),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            Error::CopyFailed { bytes_copied: 4, source: Cause::Cancelled, .. }
        ));
        assert_eq!(dst, b"0123");
    }

    #[tokio::test]
    async fn download_writes_local_file() {
        let fs = MemoryFs::new();
        fs.add_file("/data", b"remote bytes").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("data");
        let local = local.to_str().unwrap();

        let bytes = download(&fs, "/data", local, &Options::new().chunk_size(5))
            .await
            .unwrap();

        assert_eq!(bytes, 12);
        assert_eq!(std::fs::read(local).unwrap(), b"remote bytes");
    }

    #[tokio::test]
    async fn missing_remote_is_open_failure() {
        let fs = MemoryFs::new();
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("data");

        let err = download(&fs, "/nope", local.to_str().unwrap(), &Options::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::OpenFailed { ref path, source: Cause::Remote(ref e) }
                if path == "/nope" && e.code == StatusCode::NoSuchFile
        ));
        assert!(!local.exists());
    }

    #[tokio::test]
    async fn missing_local_is_open_failure() {
        let fs = MemoryFs::new();
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("absent");

        let err = upload(&fs, local.to_str().unwrap(), "/data", &Options::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::OpenFailed { source: Cause::Io { kind: std::io::ErrorKind::NotFound, .. }, .. }
        ));
        assert!(fs.calls_of("create").is_empty());
    }

    #[tokio::test]
    async fn interrupted_read_reports_progress() {
        let fs = MemoryFs::new();
        fs.add_file("/data", &[7u8; 100]).unwrap();
        fs.fail_read_after("/data", 40);
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("data");

        let err = download(
            &fs,
            "/data",
            local.to_str().unwrap(),
            &Options::new().chunk_size(16),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            Error::CopyFailed { bytes_copied: 40, ref from, .. } if from == "/data"
        ));
    }
}
