//! NHL stats API client and table shaping
//!
//! Every request goes through the disk cache in [`crate::cache`]. Responses are
//! reshaped into flat rows: [`Record`] where the upstream schema is open-ended
//! (team and player statistics), typed structs where it is fixed ([`Game`]).

pub mod client;
pub mod endpoints;
pub mod games;
pub mod players;
pub mod teams;

pub use client::{NhlClient, NHL_API_BASE_URL};
pub use games::Game;

use std::fmt;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::cache::CacheError;

/// One row of a table: column name to cell value
pub type Record = Map<String, Value>;

/// First NHL season (1917-1918)
pub const FIRST_SEASON: i32 = 1917;

/// Errors that can occur when fetching or shaping API data
#[derive(Debug, Error)]
pub enum ApiError {
    /// Cache lookup, storage or the HTTP fetch behind it failed
    #[error(transparent)]
    Cache(#[from] CacheError<reqwest::Error>),

    /// Failed to decode a response into the expected shape
    #[error("Failed to parse API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// The API has no statistics for this player in this season
    #[error("No statistics available for player {player_id} for season {season}")]
    UnknownPlayer { player_id: u32, season: Season },

    /// No single team matched a name lookup
    #[error("Unique team not found for '{0}'")]
    TeamNotFound(String),

    /// A season schedule contained no games
    #[error("No games found for season {0}")]
    NoGames(Season),
}

/// An NHL season, identified by the year it starts in
///
/// Renders the way the API expects it in query strings: the 2018-2019
/// season is `20182019`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Season(pub i32);

impl Season {
    pub fn start_year(self) -> i32 {
        self.0
    }

    /// The season in progress (or most recently started) on `date`
    ///
    /// Seasons start in the autumn, so dates before September belong to the
    /// season that started the previous year.
    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= 9 {
            Season(date.year())
        } else {
            Season(date.year() - 1)
        }
    }

    /// The season containing today's local date
    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }
}

impl From<i32> for Season {
    fn from(start_year: i32) -> Self {
        Season(start_year)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0, self.0 + 1)
    }
}

/// Looks up a JSON pointer, failing with `MissingField` if absent
pub(crate) fn pointer<'a>(value: &'a Value, path: &str) -> Result<&'a Value, ApiError> {
    value
        .pointer(path)
        .ok_or_else(|| ApiError::MissingField(path.to_string()))
}

/// Clones the object at `path`
pub(crate) fn object(value: &Value, path: &str) -> Result<Record, ApiError> {
    pointer(value, path)?
        .as_object()
        .cloned()
        .ok_or_else(|| ApiError::MissingField(path.to_string()))
}

/// Clones every object of the array at `path` into a row
pub(crate) fn records(value: &Value, path: &str) -> Result<Vec<Record>, ApiError> {
    pointer(value, path)?
        .as_array()
        .ok_or_else(|| ApiError::MissingField(path.to_string()))?
        .iter()
        .map(|item| {
            item.as_object()
                .cloned()
                .ok_or_else(|| ApiError::MissingField(format!("{path}[]")))
        })
        .collect()
}

/// Renames a column if present
pub(crate) fn rename(record: &mut Record, from: &str, to: &str) {
    if let Some(value) = record.remove(from) {
        record.insert(to.to_string(), value);
    }
}

/// Reads an id column as `u32`
pub(crate) fn id_column(record: &Record, column: &str) -> Result<u32, ApiError> {
    record
        .get(column)
        .and_then(Value::as_u64)
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| ApiError::MissingField(column.to_string()))
}
