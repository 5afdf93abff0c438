//! Directory listing and full tree walks.

use tokio_util::sync::CancellationToken;

use crate::{
    entry::RemoteEntry,
    error::{Error, TreeResult},
    fs::{RemoteError, RemoteFs},
    options,
};

/// Lists the direct children of `dir` with a single remote call.
///
/// The `.` and `..` pseudo entries are dropped. Listing errors are returned
/// as [`Error::ListFailed`] without retrying.
pub async fn list_one_level<F>(fs: &F, dir: &str) -> TreeResult<Vec<RemoteEntry>>
where
    F: RemoteFs + ?Sized,
{
    debug!("list {}", dir);

    let files = fs.list_dir(dir).await.map_err(|source| Error::ListFailed {
        path: dir.to_owned(),
        source,
    })?;

    Ok(files
        .into_iter()
        .filter(|(name, _)| name != "." && name != "..")
        .map(|(name, attrs)| RemoteEntry::from_listing(dir, name, &attrs))
        .collect())
}

/// Full paths of the non-directory entries directly inside `dir`.
pub async fn list_file_paths<F>(fs: &F, dir: &str) -> TreeResult<Vec<String>>
where
    F: RemoteFs + ?Sized,
{
    Ok(list_one_level(fs, dir)
        .await?
        .into_iter()
        .filter(|entry| !entry.is_dir())
        .map(|entry| entry.full_path().to_owned())
        .collect())
}

/// Walks the tree under `root` and returns every entry found.
///
/// Subdirectories that cannot be listed are kept as entries without
/// children; see [`TreeWalker`] to observe or refuse such partial walks.
pub async fn walk_tree<F>(fs: &F, root: &str, include_root: bool) -> TreeResult<Vec<RemoteEntry>>
where
    F: RemoteFs + ?Sized,
{
    Ok(TreeWalker::new(fs)
        .include_root(include_root)
        .walk(root)
        .await?
        .entries)
}

/// A subdirectory whose contents are missing from a [`Walk`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDir {
    pub path: String,
    pub error: RemoteError,
}

/// Result of [`TreeWalker::walk`]
#[derive(Debug, Clone, Default)]
pub struct Walk {
    /// Entries in depth-first pre-order
    pub entries: Vec<RemoteEntry>,
    /// Subdirectories whose listing failed
    pub skipped: Vec<SkippedDir>,
}

impl Walk {
    /// Returns `true` when every discovered directory was listed
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Recursive descent over a remote tree.
///
/// Entries come out depth-first, each directory followed by its contents
/// before its next sibling. Listing is iterative so deep trees do not grow
/// the call stack.
pub struct TreeWalker<'a, F: ?Sized> {
    fs: &'a F,
    include_root: bool,
    strict: bool,
    cancel: Option<CancellationToken>,
}

impl<'a, F> TreeWalker<'a, F>
where
    F: RemoteFs + ?Sized,
{
    pub const fn new(fs: &'a F) -> Self {
        Self {
            fs,
            include_root: false,
            strict: false,
            cancel: None,
        }
    }

    /// Emit the root directory itself as the first entry.
    #[must_use]
    pub const fn include_root(mut self, include_root: bool) -> Self {
        self.include_root = include_root;
        self
    }

    /// Fail with [`Error::ListFailed`] instead of skipping unreadable subdirectories.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn check(&self) -> TreeResult<()> {
        self.cancel.as_ref().map_or(Ok(()), options::check)
    }

    pub async fn walk(&self, root: &str) -> TreeResult<Walk> {
        let mut walk = Walk::default();

        if self.include_root {
            self.check()?;
            let attrs = self
                .fs
                .metadata(root)
                .await
                .map_err(|source| Error::ListFailed {
                    path: root.to_owned(),
                    source,
                })?;
            walk.entries.push(RemoteEntry::root(root, &attrs));
        }

        self.check()?;
        let mut stack = vec![list_one_level(self.fs, root).await?.into_iter()];

        while let Some(next) = stack.last_mut().map(Iterator::next) {
            let Some(entry) = next else {
                let _ = stack.pop();
                continue;
            };

            let dir = entry.is_dir().then(|| entry.full_path().to_owned());
            walk.entries.push(entry);

            let Some(dir) = dir else {
                continue;
            };

            self.check()?;
            match list_one_level(self.fs, &dir).await {
                Ok(children) => stack.push(children.into_iter()),
                Err(Error::ListFailed { path, source }) => {
                    if self.strict {
                        return Err(Error::ListFailed { path, source });
                    }

                    warn!("skipping {}: {}", path, source);
                    walk.skipped.push(SkippedDir {
                        path,
                        error: source,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        debug!(
            "walked {}: {} entries, {} skipped",
            root,
            walk.entries.len(),
            walk.skipped.len()
        );

        Ok(walk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fs::StatusCode, mem::MemoryFs};

    fn sample() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.add_dir("/root").unwrap();
        fs.add_dir("/root/a").unwrap();
        fs.add_file("/root/a/f1", b"one").unwrap();
        fs.add_file("/root/b", b"bee").unwrap();
        fs
    }

    fn paths(entries: &[RemoteEntry]) -> Vec<&str> {
        entries.iter().map(RemoteEntry::full_path).collect()
    }

    #[tokio::test]
    async fn list_one_level_does_not_recurse() {
        let fs = sample();
        let entries = list_one_level(&fs, "/root").await.unwrap();

        assert_eq!(paths(&entries), ["/root/a", "/root/b"]);
        assert!(entries[0].is_dir());
        assert_eq!(entries[1].size(), 3);
        assert_eq!(fs.calls(), ["list_dir /root"]);
    }

    #[tokio::test]
    async fn list_one_level_propagates_error() {
        let fs = sample();
        let err = list_one_level(&fs, "/missing").await.unwrap_err();

        assert_eq!(
            err,
            Error::ListFailed {
                path: "/missing".to_owned(),
                source: RemoteError::new(StatusCode::NoSuchFile, "/missing"),
            }
        );
    }

    #[tokio::test]
    async fn list_file_paths_skips_dirs() {
        let fs = sample();
        let files = list_file_paths(&fs, "/root").await.unwrap();
        assert_eq!(files, ["/root/b"]);
    }

    #[tokio::test]
    async fn walk_is_pre_order() {
        let fs = sample();
        let entries = walk_tree(&fs, "/root", true).await.unwrap();

        assert_eq!(paths(&entries), ["/root", "/root/a", "/root/a/f1", "/root/b"]);
        let levels: Vec<_> = entries.iter().map(RemoteEntry::level).collect();
        assert_eq!(levels, [0, 1, 2, 1]);
    }

    #[tokio::test]
    async fn walk_from_filesystem_root() {
        let fs = MemoryFs::new();
        fs.add_dir("/a").unwrap();
        fs.add_file("/a/f", b"x").unwrap();
        fs.add_file("/b", b"y").unwrap();

        let entries = walk_tree(&fs, "/", true).await.unwrap();

        assert_eq!(paths(&entries), ["/", "/a", "/a/f", "/b"]);
        let levels: Vec<_> = entries.iter().map(RemoteEntry::level).collect();
        assert_eq!(levels, [0, 0, 1, 0]);
        assert!(entries[0].is_dir());
    }

    #[tokio::test]
    async fn walk_without_root() {
        let fs = sample();
        let entries = walk_tree(&fs, "/root", false).await.unwrap();
        assert_eq!(paths(&entries), ["/root/a", "/root/a/f1", "/root/b"]);
    }

    #[tokio::test]
    async fn walk_skips_unlistable_subtree() {
        let fs = sample();
        fs.fail_list("/root/a", StatusCode::PermissionDenied);

        let walk = TreeWalker::new(&fs).walk("/root").await.unwrap();

        assert_eq!(paths(&walk.entries), ["/root/a", "/root/b"]);
        assert!(!walk.is_complete());
        assert_eq!(walk.skipped[0].path, "/root/a");
        assert_eq!(walk.skipped[0].error.code, StatusCode::PermissionDenied);
    }

    #[tokio::test]
    async fn strict_walk_fails_on_subtree() {
        let fs = sample();
        fs.fail_list("/root/a", StatusCode::PermissionDenied);

        let err = TreeWalker::new(&fs)
            .strict(true)
            .walk("/root")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ListFailed { ref path, .. } if path == "/root/a"));
    }

    #[tokio::test]
    async fn root_listing_failure_is_an_error() {
        let fs = sample();
        fs.fail_list("/root", StatusCode::Failure);

        let err = walk_tree(&fs, "/root", false).await.unwrap_err();
        assert!(matches!(err, Error::ListFailed { ref path, .. } if path == "/root"));
    }

    #[tokio::test]
    async fn cancelled_walk_stops() {
        let fs = sample();
        let token = CancellationToken::new();
        token.cancel();

        let err = TreeWalker::new(&fs)
            .cancel(token)
            .walk("/root")
            .await
            .unwrap_err();
        assert_eq!(err, Error::Cancelled);
        assert!(fs.calls().is_empty());
    }
}
