use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// File type bits of a unix mode
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileType(u32);

bitflags! {
    impl FileType: u32 {
        const FIFO = 0x1000;
        const CHR = 0x2000;
        const DIR = 0x4000;
        const BLK = 0x6000;
        const REG = 0x8000;
        const LNK = 0xA000;
        const SOCK = 0xC000;
    }
}

/// Mask selecting the type bits (`S_IFMT`) of a mode.
const TYPE_MASK: u32 = 0xF000;

/// Mask selecting the permission bits of a mode, setuid/setgid/sticky included.
pub const PERMISSION_MASK: u32 = 0o7777;

/// Attributes reported by a remote listing or stat call.
///
/// Every field is optional because servers are free to omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub size: Option<u64>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub permissions: Option<u32>,
    pub atime: Option<u32>,
    pub mtime: Option<u32>,
}

macro_rules! impl_fn_type {
    ($get_name:ident, $doc_name:expr, $flag:ident) => {
        #[doc = "Returns `true` if is a "]
        #[doc = $doc_name]
        #[must_use]
        pub fn $get_name(&self) -> bool {
            self.type_bits() == FileType::$flag.bits()
        }
    };
}

impl Metadata {
    impl_fn_type!(is_dir, "dir", DIR);
    impl_fn_type!(is_regular, "regular", REG);
    impl_fn_type!(is_symlink, "symlink", LNK);

    /// Attributes of a directory with the given permission bits
    #[must_use]
    pub fn dir(permissions: u32) -> Self {
        Self {
            permissions: Some(FileType::DIR.bits() | (permissions & PERMISSION_MASK)),
            ..Default::default()
        }
    }

    /// Attributes of a regular file with the given permission bits and size
    #[must_use]
    pub fn file(permissions: u32, size: u64) -> Self {
        Self {
            size: Some(size),
            permissions: Some(FileType::REG.bits() | (permissions & PERMISSION_MASK)),
            ..Default::default()
        }
    }

    /// Sets the modification time in seconds since the unix epoch
    #[must_use]
    pub const fn with_mtime(mut self, mtime: u32) -> Self {
        self.mtime = Some(mtime);
        self
    }

    fn type_bits(&self) -> u32 {
        self.permissions.unwrap_or(0) & TYPE_MASK
    }

    /// Returns the type portion of the mode
    #[must_use]
    pub fn file_type(&self) -> FileType {
        FileType::from_bits_retain(self.type_bits())
    }

    /// Replaces the permission bits and keeps the type bits
    pub fn set_permissions(&mut self, mode: u32) {
        self.permissions = Some(self.type_bits() | (mode & PERMISSION_MASK));
    }

    /// Returns the size of the file
    #[must_use]
    pub fn len(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    /// Returns `true` when the size is unknown or zero
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the last modification time
    #[must_use]
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.mtime
            .map(|time| DateTime::<Utc>::from(UNIX_EPOCH + Duration::from_secs(u64::from(time))))
    }

    /// Returns the last access time
    #[must_use]
    pub fn accessed(&self) -> Option<SystemTime> {
        self.atime
            .map(|time| UNIX_EPOCH + Duration::from_secs(u64::from(time)))
    }
}
