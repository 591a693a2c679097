//! hockeystats library
//!
//! A client for the NHL stats API that caches every distinct request on disk
//! and reshapes responses into flat rows. The cache in [`cache`] is usable on
//! its own with any fetch function.

pub mod cache;
pub mod cli;
pub mod data;
