//! Disk-backed request cache
//!
//! Provides a `CacheStore` that memoizes the result of a fetch function on disk,
//! one JSON file per request identifier. Entries never expire; the only way to
//! replace one is an explicit overwrite.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use directories::ProjectDirs;
use serde_json::Value;
use tracing::{debug, info};

use super::error::CacheError;
use super::key::KeyEncoding;

/// Directory used when no other location is configured
pub const DEFAULT_CACHE_DIR: &str = "cache";

/// Suffix source for temporary files written before an entry is renamed in
static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(0);

type KeyLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Per-call switches for [`CacheStore::get_or_fetch`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Always call the fetch function and replace any stored entry
    pub overwrite: bool,
    /// Log hit/miss/overwrite notices at `info` instead of `debug`
    pub verbose: bool,
}

impl FetchOptions {
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// What a lookup found before any fetch happens
enum Lookup {
    Hit(Value),
    Miss { had_entry: bool },
}

#[derive(Debug, Clone, Copy)]
enum Notice {
    Hit,
    Miss,
    Overwrite,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Hit => f.write_str("Cache hit"),
            Notice::Miss => f.write_str("Cache miss"),
            Notice::Overwrite => f.write_str("Overwriting cache"),
        }
    }
}

fn notice(verbose: bool, kind: Notice, request_id: &str) {
    if verbose {
        info!("{kind} for {request_id}");
    } else {
        debug!("{kind} for {request_id}");
    }
}

/// Memoizes fetch results on disk, keyed by request identifier
///
/// Each entry lives at `<dir>/<key>.json`, where the key is derived from the
/// request identifier by the store's [`KeyEncoding`]. The directory is created
/// on first use. Stores are cheap to clone; clones share the same per-key
/// locks used by [`CacheStore::get_or_fetch_async`].
///
/// No cross-process locking is done: two processes that miss on the same
/// identifier at the same time will both fetch, and the last write wins.
/// Entries are written to a temporary file and renamed into place, so readers
/// never see a partially written entry.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Directory where entry files are stored
    cache_dir: PathBuf,
    encoding: KeyEncoding,
    /// Per-key locks, only present while a call for that key is in flight
    locks: Arc<KeyLocks>,
}

/// Holds the async lock for one key and drops the key from the lock map once
/// no other caller is waiting on it
struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: String,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Release first so the map holds the only remaining reference when idle
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&self.key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.key);
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

impl CacheStore {
    /// Creates a store rooted at `cache_dir` using the default key encoding
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_encoding(cache_dir, KeyEncoding::default())
    }

    /// Creates a store rooted at `cache_dir` using `encoding` for filenames
    ///
    /// Use [`KeyEncoding::Substitute`] to read a cache directory written with
    /// the `:`/`/`/`?` substitution scheme.
    pub fn with_encoding(cache_dir: impl Into<PathBuf>, encoding: KeyEncoding) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            encoding,
            locks: Arc::default(),
        }
    }

    /// Returns the platform cache directory for this tool
    ///
    /// Uses `~/.cache/hockeystats/` on Linux, or the equivalent on other
    /// platforms. Returns `None` if no home directory can be determined.
    pub fn user_cache_dir() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "hockeystats")?;
        Some(project_dirs.cache_dir().to_path_buf())
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// Returns the cache key for a request identifier
    pub fn key(&self, request_id: &str) -> String {
        self.encoding.encode(request_id)
    }

    /// Returns the path of the entry file for a request identifier
    pub fn entry_path(&self, request_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", self.key(request_id)))
    }

    /// Returns true if an entry is stored for `request_id`
    pub fn contains(&self, request_id: &str) -> bool {
        self.entry_path(request_id).is_file()
    }

    /// Returns the stored entry for `request_id`, or calls `fetch` and stores
    /// its result
    ///
    /// With `overwrite` unset, an existing entry is decoded and returned and
    /// `fetch` is never called. With `overwrite` set, `fetch` is always called
    /// and its result replaces whatever was stored.
    ///
    /// # Errors
    /// * [`CacheError::Storage`] if the directory or entry cannot be created,
    ///   read or written
    /// * [`CacheError::CorruptEntry`] if a stored entry is not valid JSON
    /// * [`CacheError::Fetch`] if `fetch` fails; the cache is left untouched
    pub fn get_or_fetch<F, E>(
        &self,
        request_id: &str,
        fetch: F,
        options: FetchOptions,
    ) -> Result<Value, CacheError<E>>
    where
        F: FnOnce() -> Result<Value, E>,
    {
        let path = self.entry_path(request_id);
        match self.lookup::<E>(&path, request_id, options)? {
            Lookup::Hit(value) => Ok(value),
            Lookup::Miss { had_entry } => {
                let value = fetch().map_err(CacheError::Fetch)?;
                self.persist::<E>(&path, request_id, &value, options, had_entry)?;
                Ok(value)
            }
        }
    }

    /// Async counterpart of [`CacheStore::get_or_fetch`]
    ///
    /// Calls for the same key on this store (or its clones) are serialized, so
    /// concurrent callers fetch at most once and later callers see the entry
    /// the first one wrote. Calls for different keys run concurrently.
    pub async fn get_or_fetch_async<F, Fut, E>(
        &self,
        request_id: &str,
        fetch: F,
        options: FetchOptions,
    ) -> Result<Value, CacheError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        let key = self.key(request_id);
        let _guard = self.lock_key(key.clone()).await;

        let path = self.cache_dir.join(format!("{key}.json"));
        match self.lookup::<E>(&path, request_id, options)? {
            Lookup::Hit(value) => Ok(value),
            Lookup::Miss { had_entry } => {
                let value = fetch().await.map_err(CacheError::Fetch)?;
                self.persist::<E>(&path, request_id, &value, options, had_entry)?;
                Ok(value)
            }
        }
    }

    async fn lock_key(&self, key: String) -> KeyGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        let guard = lock.lock_owned().await;
        KeyGuard {
            locks: &self.locks,
            key,
            guard: Some(guard),
        }
    }

    /// Ensures the cache directory exists
    fn ensure_dir<E>(&self) -> Result<(), CacheError<E>> {
        // create_dir_all already treats a concurrently created directory as success
        fs::create_dir_all(&self.cache_dir).map_err(|source| CacheError::Storage {
            path: self.cache_dir.clone(),
            source,
        })
    }

    fn lookup<E>(
        &self,
        path: &Path,
        request_id: &str,
        options: FetchOptions,
    ) -> Result<Lookup, CacheError<E>> {
        self.ensure_dir::<E>()?;

        let had_entry = path.is_file();
        if !had_entry || options.overwrite {
            return Ok(Lookup::Miss { had_entry });
        }

        let bytes = fs::read(path).map_err(|source| CacheError::<E>::Storage {
            path: path.to_path_buf(),
            source,
        })?;
        let value = serde_json::from_slice(&bytes).map_err(|source| CacheError::<E>::CorruptEntry {
            path: path.to_path_buf(),
            source,
        })?;

        notice(options.verbose, Notice::Hit, request_id);
        Ok(Lookup::Hit(value))
    }

    fn persist<E>(
        &self,
        path: &Path,
        request_id: &str,
        value: &Value,
        options: FetchOptions,
        had_entry: bool,
    ) -> Result<(), CacheError<E>> {
        let kind = if options.overwrite && had_entry {
            Notice::Overwrite
        } else {
            Notice::Miss
        };
        notice(options.verbose, kind, request_id);

        let storage_error = |source: io::Error| -> CacheError<E> {
            CacheError::Storage {
                path: path.to_path_buf(),
                source,
            }
        };
        let json = serde_json::to_vec(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            .map_err(storage_error)?;

        let temp_id = NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed);
        let temp_path = path.with_extension(format!("json.{}.{temp_id}.tmp", std::process::id()));
        fs::write(&temp_path, json).map_err(storage_error)?;
        if let Err(source) = fs::rename(&temp_path, path) {
            fs::remove_file(&temp_path).ok();
            return Err(storage_error(source));
        }
        Ok(())
    }
}
