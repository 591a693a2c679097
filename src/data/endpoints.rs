//! Request paths for the NHL stats API, relative to the API base URL
//!
//! Join with [`NhlClient::url`](super::NhlClient::url) to get the full request
//! identifier used as the cache key. The query parameter order here is part of
//! the cache key, so changing it invalidates existing entries.

use super::Season;

pub fn teams(season: Season) -> String {
    format!("teams?season={season}")
}

pub fn team(team_id: u32) -> String {
    format!("teams/{team_id}")
}

/// Season statistics and league rankings for one team (`stats[0]` and `stats[1]`)
pub fn team_stats(team_id: u32, season: Season) -> String {
    format!("teams/{team_id}/stats?season={season}")
}

pub fn team_roster(team_id: u32, season: Season) -> String {
    format!("teams/{team_id}/roster?season={season}")
}

pub fn schedule(team_id: u32, season: Season) -> String {
    format!("schedule?teamId={team_id}&season={season}")
}

pub fn person(player_id: u32) -> String {
    format!("people/{player_id}")
}

pub fn player_season_stats(player_id: u32, season: Season) -> String {
    format!("people/{player_id}/stats?stats=statsSingleSeason&season={season}")
}

pub fn player_game_log(player_id: u32, season: Season) -> String {
    format!("people/{player_id}/stats?stats=gameLog&season={season}")
}
