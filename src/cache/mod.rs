//! Cache module for memoizing API responses on disk
//!
//! Every request identifier maps to one JSON file in the cache directory. The
//! first request for an identifier fetches and stores the response; later
//! requests are served from disk until the caller asks for an overwrite.
//! Nothing here expires entries.

mod error;
mod key;
mod store;

pub use error::CacheError;
pub use key::{encode, encode_escaped, encode_hashed, KeyEncoding, UnknownEncoding};
pub use store::{CacheStore, FetchOptions, DEFAULT_CACHE_DIR};
