use crate::{entry::RemoteEntry, path};

/// Which entries [`filter_entries`] keeps
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Select(u8);

bitflags! {
    impl Select: u8 {
        /// Directories
        const DIRS = 0x01;
        /// Files and every other non-directory entry
        const FILES = 0x02;
        /// The walk root itself, when `DIRS` is also selected
        const ROOT = 0x04;
    }
}

impl Select {
    /// Selection matching the three boolean switches of a bulk operation
    #[must_use]
    pub fn from_flags(dirs: bool, files: bool, include_root: bool) -> Self {
        let mut select = Self::empty();
        select.set(Self::DIRS, dirs);
        select.set(Self::FILES, files);
        select.set(Self::ROOT, include_root);
        select
    }
}

/// Keeps the entries matching `select`, in their original order.
///
/// The directory whose path equals `root` is only kept with [`Select::ROOT`].
/// Files are never subject to root exclusion.
#[must_use]
pub fn filter_entries(entries: &[RemoteEntry], root: &str, select: Select) -> Vec<RemoteEntry> {
    entries
        .iter()
        .filter(|entry| {
            if entry.is_dir() {
                select.contains(Select::DIRS)
                    && (select.contains(Select::ROOT) || !path::same_path(entry.full_path(), root))
            } else {
                select.contains(Select::FILES)
            }
        })
        .cloned()
        .collect()
}
