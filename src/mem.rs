//! In-memory [`RemoteFs`] with failure injection and a journal of calls.
//!
//! Useful for exercising bulk operations without a server: every call is
//! recorded in order, and any primitive can be made to fail for a chosen
//! path.

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use std::{
    collections::{BTreeMap, HashMap},
    io,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::{
    fs::{RemoteError, RemoteFs, RemoteResult, StatusCode},
    metadata::Metadata,
};

/// Primitive selected by [`MemoryFs::fail`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Metadata,
    Remove,
    Rename,
    Chmod,
    CreateDir,
    OpenRead,
    Create,
}

#[derive(Debug, Clone)]
struct Node {
    attrs: Metadata,
    data: BytesMut,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: BTreeMap<String, Node>,
    failures: HashMap<(Op, String), RemoteError>,
    read_failures: HashMap<String, usize>,
    calls: Vec<String>,
}

fn normalize(path: &str) -> String {
    match path.trim_end_matches('/') {
        "" => "/".to_owned(),
        trimmed => trimmed.to_owned(),
    }
}

fn parent(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) if path.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(index) => Some(&path[..index]),
    }
}

fn not_found(path: &str) -> RemoteError {
    RemoteError::new(StatusCode::NoSuchFile, path)
}

fn now() -> u32 {
    u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX)
}

impl Inner {
    fn record(&mut self, call: String) {
        self.calls.push(call);
    }

    fn injected(&self, op: Op, path: &str) -> RemoteResult<()> {
        match self.failures.get(&(op, path.to_owned())) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn node(&self, path: &str) -> RemoteResult<&Node> {
        self.nodes.get(path).ok_or_else(|| not_found(path))
    }

    fn children(&self, path: &str) -> impl Iterator<Item = (&String, &Node)> + '_ {
        let path = path.to_owned();
        self.nodes
            .iter()
            .filter(move |(key, _)| key.as_str() != path && parent(key) == Some(path.as_str()))
    }

    fn ensure_parent_dir(&self, path: &str) -> RemoteResult<()> {
        let parent = parent(path).ok_or_else(|| not_found(path))?;
        match self.nodes.get(parent) {
            Some(node) if node.attrs.is_dir() => Ok(()),
            Some(_) => Err(RemoteError::new(StatusCode::Failure, "not a directory")),
            None => Err(not_found(parent)),
        }
    }

    fn insert(&mut self, path: String, attrs: Metadata, data: &[u8]) -> RemoteResult<()> {
        self.ensure_parent_dir(&path)?;
        if self.nodes.contains_key(&path) {
            return Err(RemoteError::new(StatusCode::Failure, "file exists"));
        }

        let _ = self.nodes.insert(
            path,
            Node {
                attrs,
                data: BytesMut::from(data),
            },
        );
        Ok(())
    }
}

/// A remote file system kept entirely in memory.
///
/// Clones share the same tree. The root directory `/` always exists.
#[derive(Debug, Clone)]
pub struct MemoryFs {
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    #[must_use]
    pub fn new() -> Self {
        let mut inner = Inner::default();
        let _ = inner.nodes.insert(
            "/".to_owned(),
            Node {
                attrs: Metadata::dir(0o755).with_mtime(now()),
                data: BytesMut::new(),
            },
        );

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a directory; its parent must already exist.
    pub fn add_dir(&self, path: &str) -> RemoteResult<()> {
        self.lock()
            .insert(normalize(path), Metadata::dir(0o755).with_mtime(now()), &[])
    }

    /// Adds a file with the given contents; its parent must already exist.
    pub fn add_file(&self, path: &str, data: &[u8]) -> RemoteResult<()> {
        let attrs = Metadata::file(0o644, data.len() as u64).with_mtime(now());
        self.lock().insert(normalize(path), attrs, data)
    }

    /// Makes every later `op` call on `path` fail with `code`.
    pub fn fail(&self, op: Op, path: &str, code: StatusCode) {
        let _ = self
            .lock()
            .failures
            .insert((op, normalize(path)), RemoteError::new(code, path));
    }

    pub fn fail_list(&self, path: &str, code: StatusCode) {
        self.fail(Op::List, path, code);
    }

    pub fn fail_remove(&self, path: &str, code: StatusCode) {
        self.fail(Op::Remove, path, code);
    }

    /// Makes reads of `path` fail once `after` bytes have been returned.
    pub fn fail_read_after(&self, path: &str, after: usize) {
        let _ = self.lock().read_failures.insert(normalize(path), after);
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) {
        let mut inner = self.lock();
        inner.failures.clear();
        inner.read_failures.clear();
    }

    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.lock().nodes.contains_key(&normalize(path))
    }

    /// Contents of a file
    #[must_use]
    pub fn contents(&self, path: &str) -> Option<Bytes> {
        self.lock()
            .nodes
            .get(&normalize(path))
            .filter(|node| !node.attrs.is_dir())
            .map(|node| node.data.clone().freeze())
    }

    /// Raw mode bits of a path
    #[must_use]
    pub fn mode(&self, path: &str) -> Option<u32> {
        self.lock()
            .nodes
            .get(&normalize(path))
            .and_then(|node| node.attrs.permissions)
    }

    /// Every path in the tree, sorted
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.lock().nodes.keys().cloned().collect()
    }

    /// Calls made so far, oldest first, e.g. `"remove /root/a"`
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Calls of one primitive, with the primitive name stripped
    #[must_use]
    pub fn calls_of(&self, name: &str) -> Vec<String> {
        let prefix = format!("{name} ");
        self.lock()
            .calls
            .iter()
            .filter_map(|call| call.strip_prefix(&prefix).map(str::to_owned))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

#[async_trait]
impl RemoteFs for MemoryFs {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    async fn list_dir(&self, path: &str) -> RemoteResult<Vec<(String, Metadata)>> {
        let path = normalize(path);
        let mut inner = self.lock();
        inner.record(format!("list_dir {path}"));
        inner.injected(Op::List, &path)?;

        if !inner.node(&path)?.attrs.is_dir() {
            return Err(RemoteError::new(StatusCode::Failure, "not a directory"));
        }

        let mut files = vec![
            (".".to_owned(), inner.node(&path)?.attrs.clone()),
            ("..".to_owned(), Metadata::dir(0o755)),
        ];
        files.extend(inner.children(&path).map(|(key, node)| {
            (
                crate::path::file_name(key).to_owned(),
                node.attrs.clone(),
            )
        }));

        Ok(files)
    }

    async fn metadata(&self, path: &str) -> RemoteResult<Metadata> {
        let path = normalize(path);
        let mut inner = self.lock();
        inner.record(format!("metadata {path}"));
        inner.injected(Op::Metadata, &path)?;

        Ok(inner.node(&path)?.attrs.clone())
    }

    async fn remove(&self, path: &str) -> RemoteResult<()> {
        let path = normalize(path);
        let mut inner = self.lock();
        inner.record(format!("remove {path}"));
        inner.injected(Op::Remove, &path)?;

        let _ = inner.node(&path)?;
        if inner.children(&path).next().is_some() {
            return Err(RemoteError::new(StatusCode::Failure, "directory not empty"));
        }

        let _ = inner.nodes.remove(&path);
        Ok(())
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> RemoteResult<()> {
        let (old_path, new_path) = (normalize(old_path), normalize(new_path));
        let mut inner = self.lock();
        inner.record(format!("rename {old_path} -> {new_path}"));
        inner.injected(Op::Rename, &old_path)?;

        let _ = inner.node(&old_path)?;
        inner.ensure_parent_dir(&new_path)?;
        if inner.nodes.contains_key(&new_path) {
            return Err(RemoteError::new(StatusCode::Failure, "file exists"));
        }
        if new_path.starts_with(&format!("{old_path}/")) {
            return Err(RemoteError::new(
                StatusCode::Failure,
                "cannot move a directory into itself",
            ));
        }

        let prefix = format!("{old_path}/");
        let moved: Vec<String> = inner
            .nodes
            .keys()
            .filter(|key| **key == old_path || key.starts_with(&prefix))
            .cloned()
            .collect();

        for key in moved {
            if let Some(node) = inner.nodes.remove(&key) {
                let renamed = format!("{new_path}{}", &key[old_path.len()..]);
                let _ = inner.nodes.insert(renamed, node);
            }
        }

        Ok(())
    }

    async fn chmod(&self, path: &str, mode: u32) -> RemoteResult<()> {
        let path = normalize(path);
        let mut inner = self.lock();
        inner.record(format!("chmod {path} {mode:o}"));
        inner.injected(Op::Chmod, &path)?;

        match inner.nodes.get_mut(&path) {
            Some(node) => {
                node.attrs.set_permissions(mode);
                Ok(())
            }
            None => Err(not_found(&path)),
        }
    }

    async fn create_dir(&self, path: &str) -> RemoteResult<()> {
        let path = normalize(path);
        let mut inner = self.lock();
        inner.record(format!("create_dir {path}"));
        inner.injected(Op::CreateDir, &path)?;

        inner.insert(path, Metadata::dir(0o755).with_mtime(now()), &[])
    }

    async fn open_read(&self, path: &str) -> RemoteResult<Self::Reader> {
        let path = normalize(path);
        let mut inner = self.lock();
        inner.record(format!("open_read {path}"));
        inner.injected(Op::OpenRead, &path)?;

        let node = inner.node(&path)?;
        if node.attrs.is_dir() {
            return Err(RemoteError::new(StatusCode::Failure, "is a directory"));
        }

        Ok(MemoryReader {
            data: node.data.clone().freeze(),
            pos: 0,
            fail_after: inner.read_failures.get(&path).copied(),
        })
    }

    async fn create(&self, path: &str) -> RemoteResult<Self::Writer> {
        let path = normalize(path);
        let mut inner = self.lock();
        inner.record(format!("create {path}"));
        inner.injected(Op::Create, &path)?;

        match inner.nodes.get_mut(&path) {
            Some(node) if node.attrs.is_dir() => {
                return Err(RemoteError::new(StatusCode::Failure, "is a directory"));
            }
            Some(node) => {
                node.data.clear();
                node.attrs.size = Some(0);
                node.attrs.mtime = Some(now());
            }
            None => inner.insert(path.clone(), Metadata::file(0o644, 0).with_mtime(now()), &[])?,
        }

        Ok(MemoryWriter {
            fs: self.clone(),
            path,
        })
    }
}

/// Read half returned by [`MemoryFs::open_read`]
#[derive(Debug)]
pub struct MemoryReader {
    data: Bytes,
    pos: usize,
    fail_after: Option<usize>,
}

impl AsyncRead for MemoryReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let end = self.fail_after.map_or(self.data.len(), |limit| limit.min(self.data.len()));
        if self.pos >= end && self.fail_after.is_some() {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection lost",
            )));
        }

        let len = buf.remaining().min(end - self.pos);
        let start = self.pos;
        buf.put_slice(&self.data[start..start + len]);
        self.pos += len;

        Poll::Ready(Ok(()))
    }
}

/// Write half returned by [`MemoryFs::create`]; writes land in the tree immediately
#[derive(Debug)]
pub struct MemoryWriter {
    fs: MemoryFs,
    path: String,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        let mut inner = self.fs.lock();
        match inner.nodes.get_mut(&self.path) {
            Some(node) => {
                node.data.extend_from_slice(buf);
                node.attrs.size = Some(node.data.len() as u64);
                Poll::Ready(Ok(buf.len()))
            }
            None => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} was removed", self.path),
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}
