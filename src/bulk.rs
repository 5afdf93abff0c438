//! Recursive deletion and permission changes, plus their single-path forms.
//!
//! Bulk operations walk the tree once, split the entries into files and
//! directories, and then issue mutating calls strictly one after another.
//! The first failing call aborts the operation; entries not yet reached are
//! left as they are and nothing is rolled back.
//!
//! The remote tree must not be modified by anyone else while a bulk
//! operation runs. Concurrent writers can make directory removal fail or
//! leave new entries untouched.

use crate::{
    entry::RemoteEntry,
    error::{Error, TreeResult},
    filter::{filter_entries, Select},
    fs::RemoteFs,
    options::Options,
    order::{order_by_level, Order},
    walk::TreeWalker,
};

async fn walk_for<F>(fs: &F, root: &str, options: &Options) -> TreeResult<Vec<RemoteEntry>>
where
    F: RemoteFs + ?Sized,
{
    let walk = TreeWalker::new(fs)
        .strict(options.is_strict_walk())
        .cancel(options.token().clone())
        .walk(root)
        .await?;

    Ok(walk.entries)
}

/// Directories in removal order.
///
/// Children of `/` sit at level 0 and are skipped by [`order_by_level`];
/// they are the shallowest entries, so they go last. The walk root itself
/// never reaches this point.
fn deepest_first(dirs: &[RemoteEntry]) -> Vec<RemoteEntry> {
    let mut ordered = order_by_level(dirs, Order::Descending);
    ordered.extend(dirs.iter().filter(|dir| dir.level() == 0).cloned());
    ordered
}

/// Removes everything below `root`, and `root` itself when `include_root` is set.
///
/// Files go first, then directories from the deepest level up, so every
/// directory is empty when its removal is attempted. The root is removed
/// last. Fails with the [`Error::RemoveFailed`] of the first removal that
/// the remote side rejects.
pub async fn delete_tree<F>(
    fs: &F,
    root: &str,
    include_root: bool,
    options: &Options,
) -> TreeResult<()>
where
    F: RemoteFs + ?Sized,
{
    let entries = walk_for(fs, root, options).await?;

    let files = filter_entries(&entries, root, Select::FILES);
    for file in &files {
        options.check()?;
        remove_path(fs, file.full_path()).await?;
        debug!("removed file {}", file.full_path());
    }

    let dirs = deepest_first(&filter_entries(&entries, root, Select::DIRS));
    for dir in &dirs {
        options.check()?;
        remove_path(fs, dir.full_path()).await?;
        debug!("removed directory {}", dir.full_path());
    }

    if include_root {
        options.check()?;
        remove_path(fs, root).await?;
        debug!("removed root {}", root);
    }

    info!(
        "deleted {} files and {} directories under {}",
        files.len(),
        dirs.len(),
        root
    );

    Ok(())
}

/// Sets `mode` on everything below `root`, and on `root` first when `include_root` is set.
///
/// Directories are changed in walk order, then files. Fails with the
/// [`Error::ChmodFailed`] of the first rejected call.
pub async fn chmod_tree<F>(
    fs: &F,
    root: &str,
    mode: u32,
    include_root: bool,
    options: &Options,
) -> TreeResult<()>
where
    F: RemoteFs + ?Sized,
{
    let entries = walk_for(fs, root, options).await?;

    if include_root {
        options.check()?;
        chmod_path(fs, root, mode).await?;
        debug!("chmod root {} {:o}", root, mode);
    }

    let dirs = filter_entries(&entries, root, Select::DIRS);
    for dir in &dirs {
        options.check()?;
        chmod_path(fs, dir.full_path(), mode).await?;
        debug!("chmod directory {} {:o}", dir.full_path(), mode);
    }

    let files = filter_entries(&entries, root, Select::FILES);
    for file in &files {
        options.check()?;
        chmod_path(fs, file.full_path(), mode).await?;
        debug!("chmod file {} {:o}", file.full_path(), mode);
    }

    info!(
        "changed mode of {} files and {} directories under {} to {:o}",
        files.len(),
        dirs.len(),
        root,
        mode
    );

    Ok(())
}

/// Removes a single file or empty directory.
pub async fn remove_path<F>(fs: &F, path: &str) -> TreeResult<()>
where
    F: RemoteFs + ?Sized,
{
    fs.remove(path).await.map_err(|source| Error::RemoveFailed {
        path: path.to_owned(),
        source,
    })
}

/// Sets the permission bits of a single path.
pub async fn chmod_path<F>(fs: &F, path: &str, mode: u32) -> TreeResult<()>
where
    F: RemoteFs + ?Sized,
{
    fs.chmod(path, mode)
        .await
        .map_err(|source| Error::ChmodFailed {
            path: path.to_owned(),
            mode,
            source,
        })
}

/// Renames a file or directory.
pub async fn rename_path<F>(fs: &F, old_path: &str, new_path: &str) -> TreeResult<()>
where
    F: RemoteFs + ?Sized,
{
    fs.rename(old_path, new_path)
        .await
        .map_err(|source| Error::RenameFailed {
            from: old_path.to_owned(),
            to: new_path.to_owned(),
            source,
        })?;

    debug!("renamed {} to {}", old_path, new_path);
    Ok(())
}

/// Creates a single directory; its parent must exist.
pub async fn create_dir<F>(fs: &F, path: &str) -> TreeResult<()>
where
    F: RemoteFs + ?Sized,
{
    fs.create_dir(path)
        .await
        .map_err(|source| Error::MkdirFailed {
            path: path.to_owned(),
            source,
        })
}
