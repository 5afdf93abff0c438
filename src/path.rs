//! POSIX-style remote path helpers.
//!
//! Remote paths are plain `/`-joined strings. Nothing here touches the
//! local file system or normalizes `.`/`..` segments.

/// Depth of a path, counted in non-empty `/` segments minus one.
///
/// `"/a"` is level 0 and `"/a/b/c"` is level 2. Repeated or trailing
/// separators do not change the result, and `"/"` is level 0.
#[must_use]
pub fn level(path: &str) -> usize {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .count()
        .saturating_sub(1)
}

/// Joins a directory path and a leaf name with exactly one separator.
#[must_use]
pub fn join(parent: &str, name: &str) -> String {
    let name = name.trim_start_matches('/');
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Returns the last non-empty segment of a path, or the path itself when it has none.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

/// Compares two paths ignoring a trailing separator.
pub(crate) fn same_path(a: &str, b: &str) -> bool {
    fn trim(path: &str) -> &str {
        match path.trim_end_matches('/') {
            "" => path,
            trimmed => trimmed,
        }
    }

    trim(a) == trim(b)
}
