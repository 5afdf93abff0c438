use chrono::{DateTime, Utc};
use serde::{ser::SerializeStruct, Serialize, Serializer};
use std::fmt;

use crate::{metadata::Metadata, path};

/// Format of [`RemoteEntry::mod_time`]
pub const MOD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One node discovered by a remote listing.
///
/// Entries are built fresh from each listing response and never change
/// afterwards. The depth is derived from [`RemoteEntry::full_path`] on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    name: String,
    full_path: String,
    is_dir: bool,
    mtime: Option<DateTime<Utc>>,
    size: u64,
    mode: u32,
}

impl RemoteEntry {
    pub(crate) fn from_listing(parent: &str, name: String, attrs: &Metadata) -> Self {
        let full_path = path::join(parent, &name);
        Self::with_attrs(name, full_path, attrs)
    }

    pub(crate) fn root(full_path: &str, attrs: &Metadata) -> Self {
        Self::with_attrs(
            path::file_name(full_path).to_owned(),
            full_path.to_owned(),
            attrs,
        )
    }

    fn with_attrs(name: String, full_path: String, attrs: &Metadata) -> Self {
        Self {
            name,
            full_path,
            is_dir: attrs.is_dir(),
            mtime: attrs.modified(),
            size: attrs.len(),
            mode: attrs.permissions.unwrap_or(0),
        }
    }

    /// Leaf name as reported by the listing
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute remote path of this entry
    #[must_use]
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Depth of [`RemoteEntry::full_path`], see [`path::level`]
    #[must_use]
    pub fn level(&self) -> usize {
        path::level(&self.full_path)
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Raw mode bits, type included
    #[must_use]
    pub const fn mode(&self) -> u32 {
        self.mode
    }

    #[must_use]
    pub const fn modified(&self) -> Option<DateTime<Utc>> {
        self.mtime
    }

    /// Modification time as `YYYY-MM-DD HH:MM:SS`, empty when the server did not report one
    #[must_use]
    pub fn mod_time(&self) -> String {
        self.mtime
            .map(|time| time.format(MOD_TIME_FORMAT).to_string())
            .unwrap_or_default()
    }

    fn permission(bits: u32) -> String {
        let read = if bits & 0o4 != 0 { "r" } else { "-" };
        let write = if bits & 0o2 != 0 { "w" } else { "-" };
        let execute = if bits & 0o1 != 0 { "x" } else { "-" };

        format!("{read}{write}{execute}")
    }

    /// Mode rendered the way `ls -l` does, e.g. `drwxr-xr-x`
    #[must_use]
    pub fn permissions(&self) -> String {
        let directory = if self.is_dir { "d" } else { "-" };

        format!(
            "{}{}{}{}",
            directory,
            Self::permission((self.mode >> 6) & 0o7),
            Self::permission((self.mode >> 3) & 0o7),
            Self::permission(self.mode & 0o7),
        )
    }
}

/// Long listing line: permissions, size, modification time and path
impl fmt::Display for RemoteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>12} {:<19} {}",
            self.permissions(),
            self.size,
            self.mod_time(),
            self.full_path
        )
    }
}

impl Serialize for RemoteEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("RemoteEntry", 7)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("full_path", &self.full_path)?;
        s.serialize_field("is_dir", &self.is_dir)?;
        s.serialize_field("mod_time", &self.mod_time())?;
        s.serialize_field("size", &self.size)?;
        s.serialize_field("mode", &self.mode)?;
        s.serialize_field("level", &self.level())?;
        s.end()
    }
}
