//! Order-safe bulk operations on remote file systems.
//!
//! A remote tree is discovered one listing call at a time through the
//! [`RemoteFs`] trait. [`walk_tree`] flattens it into [`RemoteEntry`] values,
//! [`filter_entries`] and [`order_by_level`] select and reorder them, and
//! [`delete_tree`] and [`chmod_tree`] build on those to mutate whole trees in
//! an order the remote side accepts: files before directories, deeper
//! directories before their parents.
//!
//! [`download`] and [`upload`] copy single files. [`mem::MemoryFs`] is an
//! in-memory backend for tests, and the `sftp` feature implements
//! [`RemoteFs`] for `russh_sftp::client::SftpSession`.

#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate async_trait;

mod bulk;
mod entry;
mod error;
mod filter;
/// Remote file system capability
pub mod fs;
/// In-memory backend
pub mod mem;
pub mod metadata;
mod options;
mod order;
pub mod path;
#[cfg(feature = "sftp")]
mod sftp;
mod transfer;
mod walk;

pub use bulk::{chmod_path, chmod_tree, create_dir, delete_tree, remove_path, rename_path};
pub use entry::{RemoteEntry, MOD_TIME_FORMAT};
pub use error::{Cause, Error, TreeResult};
pub use filter::{filter_entries, Select};
pub use fs::{RemoteError, RemoteFs, RemoteResult, StatusCode};
pub use metadata::{FileType, Metadata};
pub use options::{Options, DEFAULT_CHUNK_SIZE};
pub use order::{order_by_level, Order};
pub use transfer::{download, upload};
pub use walk::{list_file_paths, list_one_level, walk_tree, SkippedDir, TreeWalker, Walk};

pub use tokio_util::sync::CancellationToken;
