//! Player endpoints: biography, season statistics and game logs
//!
//! The API has no endpoint listing the seasons a player was active in, so
//! [`NhlClient::player_active_years`] asks for season statistics for every
//! season in the client's range and keeps the ones that have data. With the
//! disk cache, that scan costs one request per season only the first time.

use serde_json::Value;
use tracing::debug;

use super::{endpoints, object, pointer, records, rename, ApiError, NhlClient, Record, Season};
use crate::cache::FetchOptions;

impl NhlClient {
    /// Biographical information for one player, `id` as `playerId`
    pub async fn player_info(
        &self,
        player_id: u32,
        options: FetchOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let response = self.get(&endpoints::person(player_id), options).await?;
        let mut rows = records(&response, "/people")?;
        for row in &mut rows {
            rename(row, "id", "playerId");
        }
        Ok(rows)
    }

    /// Statistics for one player in one season as a single row
    ///
    /// # Errors
    /// [`ApiError::UnknownPlayer`] if the player has no statistics for that
    /// season.
    pub async fn player_statistics_by_year(
        &self,
        player_id: u32,
        season: Season,
        options: FetchOptions,
    ) -> Result<Record, ApiError> {
        let response = self
            .get(&endpoints::player_season_stats(player_id, season), options)
            .await?;
        ensure_splits(&response, player_id, season)?;

        let mut row = object(&response, "/stats/0/splits/0/stat")?;
        row.insert("playerId".to_string(), Value::from(player_id));
        row.insert("season".to_string(), Value::from(season.to_string()));
        Ok(row)
    }

    /// Per-game statistics for one player in one season
    ///
    /// The columns are the split's own fields (date, home/away, result, ...)
    /// plus `gameId`, `teamId` and `opponentTeamId`, plus one column per
    /// season statistic so every row has the same shape. Per-game averages
    /// are left out; statistics missing from a game are `null`.
    ///
    /// # Errors
    /// [`ApiError::UnknownPlayer`] if the player has no games that season.
    pub async fn player_game_log_by_year(
        &self,
        player_id: u32,
        season: Season,
        options: FetchOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let response = self
            .get(&endpoints::player_game_log(player_id, season), options)
            .await?;
        ensure_splits(&response, player_id, season)?;
        let splits = records(&response, "/stats/0/splits")?;

        let season_stats = self.player_statistics_by_year(player_id, season, options).await?;
        let stat_types: Vec<&String> = season_stats
            .keys()
            .filter(|name| !name.contains("PerGame") && *name != "playerId" && *name != "season")
            .collect();

        splits
            .into_iter()
            .map(|split| game_log_row(split, player_id, &stat_types))
            .collect()
    }

    /// Seasons in which the player has statistics
    ///
    /// Scans every season in the client's range, oldest first. Seasons without
    /// statistics are skipped; any other error ends the scan.
    pub async fn player_active_years(
        &self,
        player_id: u32,
        options: FetchOptions,
    ) -> Result<Vec<Season>, ApiError> {
        let mut seasons = Vec::new();
        for season in self.season_range() {
            match self.player_statistics_by_year(player_id, season, options).await {
                Ok(_) => seasons.push(season),
                Err(ApiError::UnknownPlayer { .. }) => {
                    debug!("player {player_id} inactive in {season}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(seasons)
    }

    /// Season statistics for every season the player was active
    ///
    /// Active seasons are discovered without overwriting cached entries;
    /// `options` applies to the statistics requests themselves.
    pub async fn player_statistics_complete_history(
        &self,
        player_id: u32,
        options: FetchOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let mut rows = Vec::new();
        for season in self.player_active_years(player_id, FetchOptions::default()).await? {
            rows.push(self.player_statistics_by_year(player_id, season, options).await?);
        }
        Ok(rows)
    }

    /// Game logs for every season the player was active, concatenated
    pub async fn player_game_log_complete_history(
        &self,
        player_id: u32,
        options: FetchOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let mut rows = Vec::new();
        for season in self.player_active_years(player_id, FetchOptions::default()).await? {
            rows.extend(self.player_game_log_by_year(player_id, season, options).await?);
        }
        Ok(rows)
    }
}

/// Fails with `UnknownPlayer` unless `stats[0].splits` has at least one entry
fn ensure_splits(response: &Value, player_id: u32, season: Season) -> Result<(), ApiError> {
    let has_splits = response
        .pointer("/stats/0/splits")
        .and_then(Value::as_array)
        .is_some_and(|splits| !splits.is_empty());
    if has_splits {
        Ok(())
    } else {
        Err(ApiError::UnknownPlayer { player_id, season })
    }
}

fn game_log_row(mut split: Record, player_id: u32, stat_types: &[&String]) -> Result<Record, ApiError> {
    let game = split.remove("game").unwrap_or(Value::Null);
    let team = split.remove("team").unwrap_or(Value::Null);
    let opponent = split.remove("opponent").unwrap_or(Value::Null);
    let stat = split.remove("stat").unwrap_or(Value::Null);

    split.insert("gameId".to_string(), pointer(&game, "/gamePk")?.clone());
    split.insert("teamId".to_string(), pointer(&team, "/id")?.clone());
    split.insert("opponentTeamId".to_string(), pointer(&opponent, "/id")?.clone());
    for &name in stat_types {
        let value = stat.get(name).cloned().unwrap_or(Value::Null);
        split.insert(name.clone(), value);
    }
    split.insert("playerId".to_string(), Value::from(player_id));
    Ok(split)
}
