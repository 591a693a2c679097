//! Schedule endpoints: games per team and season, and the Stanley Cup winner

use std::collections::HashSet;

use chrono::NaiveDate;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

use super::{endpoints, ApiError, NhlClient, Season};
use crate::cache::FetchOptions;

/// One scheduled or played game, from the point of view of `team_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Team whose schedule this row came from
    pub team_id: u32,
    pub date: NaiveDate,
    pub game_id: u64,
    /// `PR` preseason, `R` regular season, `P` playoffs, `A` all-star
    pub game_type: String,
    pub season: String,
    pub home_id: u32,
    pub away_id: u32,
    pub home_score: u32,
    pub away_score: u32,
    /// API path for the game feed
    pub link: String,
}

impl Game {
    /// Id of the team with more goals, or the away team on a tie
    pub fn winner_id(&self) -> u32 {
        if self.home_score > self.away_score {
            self.home_id
        } else {
            self.away_id
        }
    }
}

/// Response from the schedule endpoint
#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    #[serde(default)]
    dates: Vec<ScheduleDate>,
}

#[derive(Debug, Deserialize)]
struct ScheduleDate {
    date: NaiveDate,
    #[serde(default)]
    games: Vec<ScheduledGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduledGame {
    game_pk: u64,
    game_type: String,
    season: String,
    teams: Matchup,
    link: String,
}

#[derive(Debug, Deserialize)]
struct Matchup {
    home: Side,
    away: Side,
}

#[derive(Debug, Deserialize)]
struct Side {
    team: TeamRef,
    /// Absent for games that have not been played
    #[serde(default)]
    score: u32,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    id: u32,
}

impl NhlClient {
    /// All games of one team in `season`
    ///
    /// Each schedule date contributes its first game; dates with no games are
    /// skipped.
    pub async fn games_for_team_by_year(
        &self,
        team_id: u32,
        season: Season,
        options: FetchOptions,
    ) -> Result<Vec<Game>, ApiError> {
        let response = self.get(&endpoints::schedule(team_id, season), options).await?;
        let schedule: ScheduleResponse = serde_json::from_value(response)?;
        Ok(parse_schedule(team_id, schedule))
    }

    /// All games of all teams in `season`, each game once
    ///
    /// A game appears in both teams' schedules; the first occurrence (in team
    /// order) is kept.
    pub async fn games_by_year(
        &self,
        season: Season,
        options: FetchOptions,
    ) -> Result<Vec<Game>, ApiError> {
        let team_ids = self.team_ids(season, options).await?;
        let schedules = try_join_all(
            team_ids
                .into_iter()
                .map(|team_id| self.games_for_team_by_year(team_id, season, options)),
        )
        .await?;
        Ok(dedup_games(schedules.into_iter().flatten()))
    }

    /// Team id of the Stanley Cup champion of `season`
    ///
    /// The champion is the winner of the last game of the season.
    pub async fn stanley_cup_winner_by_year(
        &self,
        season: Season,
        options: FetchOptions,
    ) -> Result<u32, ApiError> {
        let games = self.games_by_year(season, options).await?;
        last_game(games)
            .map(|game| game.winner_id())
            .ok_or(ApiError::NoGames(season))
    }
}

fn parse_schedule(team_id: u32, schedule: ScheduleResponse) -> Vec<Game> {
    schedule
        .dates
        .into_iter()
        .filter_map(|day| {
            let date = day.date;
            day.games.into_iter().next().map(|game| Game {
                team_id,
                date,
                game_id: game.game_pk,
                game_type: game.game_type,
                season: game.season,
                home_id: game.teams.home.team.id,
                away_id: game.teams.away.team.id,
                home_score: game.teams.home.score,
                away_score: game.teams.away.score,
                link: game.link,
            })
        })
        .collect()
}

fn dedup_games(games: impl IntoIterator<Item = Game>) -> Vec<Game> {
    let mut seen = HashSet::new();
    games
        .into_iter()
        .filter(|game| seen.insert(game.game_id))
        .collect()
}

/// Latest game by date; among games on the same date, the last one listed
fn last_game(mut games: Vec<Game>) -> Option<Game> {
    games.sort_by_key(|game| game.date);
    games.pop()
}
