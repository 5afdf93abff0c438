use tokio_util::sync::CancellationToken;

use crate::error::{Error, TreeResult};

/// Default size of the buffer used to copy file contents.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Settings shared by bulk operations and transfers.
///
/// The cancellation token is checked between remote calls; once it is
/// cancelled the running operation stops with [`Error::Cancelled`] and
/// leaves the remaining entries untouched.
#[derive(Debug, Clone)]
pub struct Options {
    chunk_size: usize,
    strict_walk: bool,
    cancel: CancellationToken,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            strict_walk: false,
            cancel: CancellationToken::new(),
        }
    }
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of a single read during transfers. Zero is raised to one.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Fail the walk when any subdirectory cannot be listed.
    #[must_use]
    pub const fn strict_walk(mut self, strict: bool) -> Self {
        self.strict_walk = strict;
        self
    }

    /// Token used to abort operations running with these options.
    #[must_use]
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub const fn get_chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub const fn is_strict_walk(&self) -> bool {
        self.strict_walk
    }

    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn check(&self) -> TreeResult<()> {
        check(&self.cancel)
    }
}

pub(crate) fn check(token: &CancellationToken) -> TreeResult<()> {
    if token.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}
