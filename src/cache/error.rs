//! Errors surfaced by the cache store

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`CacheStore`](super::CacheStore) lookups
///
/// `E` is the error type of the caller's fetch function. The store never
/// recovers from any of these locally.
#[derive(Debug, Error)]
pub enum CacheError<E> {
    /// Creating the cache directory, or reading or writing an entry, failed
    #[error("cache storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry exists on disk but is not valid JSON
    #[error("corrupt cache entry at {}: {source}", path.display())]
    CorruptEntry {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The fetch function failed; nothing was written
    #[error("fetch failed: {0}")]
    Fetch(#[source] E),
}

impl<E> CacheError<E> {
    /// Returns the fetch error if this is a [`CacheError::Fetch`]
    pub fn into_fetch_error(self) -> Option<E> {
        match self {
            CacheError::Fetch(e) => Some(e),
            _ => None,
        }
    }
}
