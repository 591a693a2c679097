//! Command-line interface parsing for hockeystats
//!
//! This module handles parsing of CLI arguments using clap, turning them into a
//! [`ClientConfig`] and running the selected command against an [`NhlClient`].

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::cache::{CacheStore, FetchOptions, KeyEncoding, UnknownEncoding, DEFAULT_CACHE_DIR};
use crate::data::{ApiError, NhlClient, Season, FIRST_SEASON, NHL_API_BASE_URL};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The season argument is not a valid start year
    #[error("Invalid season: '{0}'. Expected a start year from 1917 on, e.g. 2018 for 2018-2019")]
    InvalidSeason(String),

    /// The encoding argument names no known key encoding
    #[error(transparent)]
    InvalidEncoding(#[from] UnknownEncoding),

    /// `--user-cache` was given but the platform has no cache directory
    #[error("Could not determine a user cache directory; use --cache-dir instead")]
    NoUserCacheDir,
}

/// NHL statistics with an on-disk request cache
#[derive(Parser, Debug)]
#[command(name = "hockeystats")]
#[command(about = "Fetch NHL statistics as JSON tables, caching every request on disk")]
#[command(version)]
pub struct Cli {
    /// Directory holding cached responses
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CACHE_DIR, global = true)]
    pub cache_dir: PathBuf,

    /// Use the platform cache directory instead of --cache-dir
    #[arg(long, global = true)]
    pub user_cache: bool,

    /// How request URLs are turned into cache filenames
    ///
    /// `substitute` maps `:` `/` `?` to `;` `#` `$`, matching existing
    /// `cache/` directories; it can collide on URLs containing `;` `#` `$`.
    /// `escaped` (the default) never collides, `hashed` uses SHA-256 names.
    #[arg(
        long,
        value_name = "substitute|escaped|hashed",
        value_parser = parse_encoding_arg,
        default_value_t = KeyEncoding::Escaped,
        global = true
    )]
    pub encoding: KeyEncoding,

    /// Root URL of the stats API
    #[arg(long, value_name = "URL", default_value = NHL_API_BASE_URL, global = true)]
    pub base_url: String,

    /// Refetch and replace cached responses
    #[arg(long, global = true)]
    pub overwrite: bool,

    /// Log cache hits and misses
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Commands; each prints a JSON document on stdout
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the cache key and entry path for a request URL
    Key {
        /// Request URL (or any identifier)
        request_id: String,
    },
    /// All teams in a season
    Teams {
        #[arg(long, value_parser = parse_season_arg)]
        season: Season,
    },
    /// Information about one team
    Team {
        #[arg(long)]
        id: u32,
    },
    /// Season statistics for one team, or all teams without --team
    TeamStats {
        #[arg(long)]
        team: Option<u32>,
        #[arg(long, value_parser = parse_season_arg)]
        season: Season,
    },
    /// Statistics rankings for one team, or all teams without --team
    TeamRankings {
        #[arg(long)]
        team: Option<u32>,
        #[arg(long, value_parser = parse_season_arg)]
        season: Season,
    },
    /// Roster of one team, or of all teams without --team
    Roster {
        #[arg(long)]
        team: Option<u32>,
        #[arg(long, value_parser = parse_season_arg)]
        season: Season,
    },
    /// Look up a team id by (partial) name
    TeamId {
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_season_arg)]
        season: Season,
    },
    /// Games of one team, or of all teams without --team
    Schedule {
        #[arg(long)]
        team: Option<u32>,
        #[arg(long, value_parser = parse_season_arg)]
        season: Season,
    },
    /// Team id of the Stanley Cup champion
    Champion {
        #[arg(long, value_parser = parse_season_arg)]
        season: Season,
    },
    /// Information about one player
    Player {
        #[arg(long)]
        id: u32,
    },
    /// Season statistics for one player
    PlayerStats {
        #[arg(long)]
        id: u32,
        #[arg(long, value_parser = parse_season_arg)]
        season: Season,
    },
    /// Game-level statistics for one player
    GameLog {
        #[arg(long)]
        id: u32,
        #[arg(long, value_parser = parse_season_arg)]
        season: Season,
    },
    /// Seasons in which a player has statistics
    ActiveYears {
        #[arg(long)]
        id: u32,
    },
    /// Season statistics for a player's whole career
    History {
        #[arg(long)]
        id: u32,
    },
    /// Game-level statistics for a player's whole career
    GameLogHistory {
        #[arg(long)]
        id: u32,
    },
}

/// Client settings derived from CLI arguments
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub cache_dir: PathBuf,
    pub encoding: KeyEncoding,
    pub base_url: String,
    /// Applied to every request the command makes
    pub fetch: FetchOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            encoding: KeyEncoding::default(),
            base_url: NHL_API_BASE_URL.to_string(),
            fetch: FetchOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a ClientConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ClientConfig)` with the selected cache location and options
    /// * `Err(CliError::NoUserCacheDir)` if `--user-cache` cannot be honored
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let cache_dir = if cli.user_cache {
            CacheStore::user_cache_dir().ok_or(CliError::NoUserCacheDir)?
        } else {
            cli.cache_dir.clone()
        };

        Ok(Self {
            cache_dir,
            encoding: cli.encoding,
            base_url: cli.base_url.clone(),
            fetch: FetchOptions::default()
                .overwrite(cli.overwrite)
                .verbose(cli.verbose),
        })
    }

    pub fn build_client(&self) -> NhlClient {
        let cache = CacheStore::with_encoding(&self.cache_dir, self.encoding);
        NhlClient::new(cache).with_base_url(&self.base_url)
    }
}

/// Parses a season start year argument.
///
/// Accepts a start year (`2018`) or the API's two-year form (`20182019`).
pub fn parse_season_arg(s: &str) -> Result<Season, CliError> {
    let invalid = || CliError::InvalidSeason(s.to_string());
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let start = match s.len() {
        4 => s.parse::<i32>().map_err(|_| invalid())?,
        8 => {
            let start: i32 = s[..4].parse().map_err(|_| invalid())?;
            let end: i32 = s[4..].parse().map_err(|_| invalid())?;
            if end != start + 1 {
                return Err(invalid());
            }
            start
        }
        _ => return Err(invalid()),
    };
    if start < FIRST_SEASON {
        return Err(invalid());
    }
    Ok(Season(start))
}

/// Parses a key encoding name, case-insensitively
pub fn parse_encoding_arg(s: &str) -> Result<KeyEncoding, CliError> {
    Ok(s.parse::<KeyEncoding>()?)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(value)?)
}

impl Command {
    /// Runs the command and returns its output as JSON
    pub async fn execute(&self, client: &NhlClient, options: FetchOptions) -> Result<Value, ApiError> {
        match self {
            Command::Key { request_id } => {
                let cache = client.cache();
                Ok(json!({
                    "requestId": request_id,
                    "key": cache.key(request_id),
                    "path": cache.entry_path(request_id).display().to_string(),
                    "cached": cache.contains(request_id),
                }))
            }
            Command::Teams { season } => to_json(&client.teams_by_year(*season, options).await?),
            Command::Team { id } => to_json(&client.team_information(*id, options).await?),
            Command::TeamStats { team: Some(id), season } => {
                to_json(&client.team_statistics_by_year(*id, *season, options).await?)
            }
            Command::TeamStats { team: None, season } => {
                to_json(&client.all_team_statistics_by_year(*season, options).await?)
            }
            Command::TeamRankings { team: Some(id), season } => {
                to_json(&client.team_statistics_rankings_by_year(*id, *season, options).await?)
            }
            Command::TeamRankings { team: None, season } => {
                to_json(&client.all_team_statistics_rankings_by_year(*season, options).await?)
            }
            Command::Roster { team: Some(id), season } => {
                to_json(&client.team_roster_by_year(*id, *season, options).await?)
            }
            Command::Roster { team: None, season } => {
                to_json(&client.all_team_roster_by_year(*season, options).await?)
            }
            Command::TeamId { name, season } => {
                to_json(&client.team_id_by_name_and_year(name, *season, options).await?)
            }
            Command::Schedule { team: Some(id), season } => {
                to_json(&client.games_for_team_by_year(*id, *season, options).await?)
            }
            Command::Schedule { team: None, season } => {
                to_json(&client.games_by_year(*season, options).await?)
            }
            Command::Champion { season } => {
                to_json(&client.stanley_cup_winner_by_year(*season, options).await?)
            }
            Command::Player { id } => to_json(&client.player_info(*id, options).await?),
            Command::PlayerStats { id, season } => {
                to_json(&client.player_statistics_by_year(*id, *season, options).await?)
            }
            Command::GameLog { id, season } => {
                to_json(&client.player_game_log_by_year(*id, *season, options).await?)
            }
            Command::ActiveYears { id } => {
                let seasons = client.player_active_years(*id, options).await?;
                to_json(&seasons.iter().map(|s| s.start_year()).collect::<Vec<_>>())
            }
            Command::History { id } => {
                to_json(&client.player_statistics_complete_history(*id, options).await?)
            }
            Command::GameLogHistory { id } => {
                to_json(&client.player_game_log_complete_history(*id, options).await?)
            }
        }
    }
}
