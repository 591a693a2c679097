//! Team endpoints: season team lists, team statistics and rosters

use futures::future::try_join_all;
use serde_json::Value;

use super::{endpoints, id_column, object, pointer, records, rename, ApiError, NhlClient, Record, Season};
use crate::cache::FetchOptions;

impl NhlClient {
    /// All teams that played in `season`, one row per team with `id` as `teamId`
    pub async fn teams_by_year(
        &self,
        season: Season,
        options: FetchOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let response = self.get(&endpoints::teams(season), options).await?;
        team_rows(&response)
    }

    /// Franchise information for one team
    pub async fn team_information(
        &self,
        team_id: u32,
        options: FetchOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let response = self.get(&endpoints::team(team_id), options).await?;
        team_rows(&response)
    }

    /// Season statistics for one team as a single row
    pub async fn team_statistics_by_year(
        &self,
        team_id: u32,
        season: Season,
        options: FetchOptions,
    ) -> Result<Record, ApiError> {
        let response = self.get(&endpoints::team_stats(team_id, season), options).await?;
        team_stat_row(&response, 0, team_id)
    }

    /// League rankings for one team's season statistics as a single row
    ///
    /// Shares its request (and cache entry) with
    /// [`NhlClient::team_statistics_by_year`].
    pub async fn team_statistics_rankings_by_year(
        &self,
        team_id: u32,
        season: Season,
        options: FetchOptions,
    ) -> Result<Record, ApiError> {
        let response = self.get(&endpoints::team_stats(team_id, season), options).await?;
        team_stat_row(&response, 1, team_id)
    }

    /// Season statistics for every team in `season`
    pub async fn all_team_statistics_by_year(
        &self,
        season: Season,
        options: FetchOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let team_ids = self.team_ids(season, options).await?;
        try_join_all(
            team_ids
                .into_iter()
                .map(|team_id| self.team_statistics_by_year(team_id, season, options)),
        )
        .await
    }

    /// Statistics rankings for every team in `season`
    pub async fn all_team_statistics_rankings_by_year(
        &self,
        season: Season,
        options: FetchOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let team_ids = self.team_ids(season, options).await?;
        try_join_all(
            team_ids
                .into_iter()
                .map(|team_id| self.team_statistics_rankings_by_year(team_id, season, options)),
        )
        .await
    }

    /// Roster of one team in `season`
    ///
    /// The nested `person` and `position` objects are flattened into
    /// `playerId`, `fullName`, `positionName`, `positionCode` and
    /// `positionType` columns.
    pub async fn team_roster_by_year(
        &self,
        team_id: u32,
        season: Season,
        options: FetchOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let response = self.get(&endpoints::team_roster(team_id, season), options).await?;
        let mut rows = records(&response, "/roster")?;
        for row in &mut rows {
            flatten_roster_row(row, team_id)?;
        }
        Ok(rows)
    }

    /// Rosters of every team in `season`, concatenated
    ///
    /// Players traded mid-season appear once per team.
    pub async fn all_team_roster_by_year(
        &self,
        season: Season,
        options: FetchOptions,
    ) -> Result<Vec<Record>, ApiError> {
        let team_ids = self.team_ids(season, options).await?;
        let rosters = try_join_all(
            team_ids
                .into_iter()
                .map(|team_id| self.team_roster_by_year(team_id, season, options)),
        )
        .await?;
        Ok(rosters.into_iter().flatten().collect())
    }

    /// Finds a team id by name, with or without the city
    ///
    /// The season matters for relocated franchises (the Winnipeg Jets of 1979
    /// and of 2019 are different teams). An exact case-insensitive match wins;
    /// otherwise the name must be a substring of exactly one team name.
    pub async fn team_id_by_name_and_year(
        &self,
        name: &str,
        season: Season,
        options: FetchOptions,
    ) -> Result<u32, ApiError> {
        let teams = self.teams_by_year(season, options).await?;
        find_team_id(&teams, name)
    }

    pub(crate) async fn team_ids(
        &self,
        season: Season,
        options: FetchOptions,
    ) -> Result<Vec<u32>, ApiError> {
        self.teams_by_year(season, options)
            .await?
            .iter()
            .map(|team| id_column(team, "teamId"))
            .collect()
    }
}

fn team_rows(response: &Value) -> Result<Vec<Record>, ApiError> {
    let mut rows = records(response, "/teams")?;
    for row in &mut rows {
        rename(row, "id", "teamId");
    }
    Ok(rows)
}

fn team_stat_row(response: &Value, index: usize, team_id: u32) -> Result<Record, ApiError> {
    let mut row = object(response, &format!("/stats/{index}/splits/0/stat"))?;
    row.insert("teamId".to_string(), Value::from(team_id));
    Ok(row)
}

fn flatten_roster_row(row: &mut Record, team_id: u32) -> Result<(), ApiError> {
    let person = row
        .remove("person")
        .ok_or_else(|| ApiError::MissingField("roster[].person".to_string()))?;
    let position = row
        .remove("position")
        .ok_or_else(|| ApiError::MissingField("roster[].position".to_string()))?;

    let columns = [
        ("playerId", &person, "/id"),
        ("fullName", &person, "/fullName"),
        ("positionName", &position, "/name"),
        ("positionCode", &position, "/code"),
        ("positionType", &position, "/type"),
    ];
    for (column, source, path) in columns {
        let value = pointer(source, path)?.clone();
        row.insert(column.to_string(), value);
    }
    row.insert("teamId".to_string(), Value::from(team_id));
    Ok(())
}

fn find_team_id(teams: &[Record], name: &str) -> Result<u32, ApiError> {
    let needle = name.to_lowercase();
    let team_name = |team: &Record| {
        team.get("name")
            .and_then(Value::as_str)
            .map(str::to_lowercase)
            .unwrap_or_default()
    };

    let exact: Vec<_> = teams.iter().filter(|t| team_name(*t) == needle).collect();
    if let [team] = exact.as_slice() {
        return id_column(team, "teamId");
    }

    let partial: Vec<_> = teams
        .iter()
        .filter(|t| team_name(*t).contains(&needle))
        .collect();
    match partial.as_slice() {
        [team] => id_column(team, "teamId"),
        _ => Err(ApiError::TeamNotFound(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::client::fixtures::{create_test_client, seed};
    use serde_json::json;

    fn teams_response() -> Value {
        json!({
            "teams": [
                {"id": 1, "name": "New Jersey Devils", "abbreviation": "NJD"},
                {"id": 2, "name": "New York Islanders", "abbreviation": "NYI"},
                {"id": 3, "name": "New York Rangers", "abbreviation": "NYR"},
                {"id": 20, "name": "Calgary Flames", "abbreviation": "CGY"}
            ]
        })
    }

    fn team_stats_response(games: u32, rank: &str) -> Value {
        json!({
            "stats": [
                {"splits": [{"stat": {"gamesPlayed": games, "wins": 40}}]},
                {"splits": [{"stat": {"wins": rank}}]}
            ]
        })
    }

    #[tokio::test]
    async fn test_teams_by_year_renames_id() {
        let (client, _temp_dir) = create_test_client();
        seed(&client, "teams?season=20182019", teams_response());

        let teams = client
            .teams_by_year(Season(2018), FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(teams.len(), 4);
        assert_eq!(teams[0].get("teamId"), Some(&json!(1)));
        assert!(teams[0].get("id").is_none());
        assert_eq!(teams[3].get("name"), Some(&json!("Calgary Flames")));
    }

    #[tokio::test]
    async fn test_team_information() {
        let (client, _temp_dir) = create_test_client();
        seed(&client, "teams/20", json!({"teams": [{"id": 20, "name": "Calgary Flames"}]}));

        let info = client.team_information(20, FetchOptions::default()).await.unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].get("teamId"), Some(&json!(20)));
    }

    #[tokio::test]
    async fn test_team_statistics_and_rankings_share_a_request() {
        let (client, _temp_dir) = create_test_client();
        seed(&client, "teams/1/stats?season=20182019", team_stats_response(82, "12th"));

        let stats = client
            .team_statistics_by_year(1, Season(2018), FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(stats.get("gamesPlayed"), Some(&json!(82)));
        assert_eq!(stats.get("teamId"), Some(&json!(1)));

        let rankings = client
            .team_statistics_rankings_by_year(1, Season(2018), FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(rankings.get("wins"), Some(&json!("12th")));
        assert_eq!(rankings.get("teamId"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_all_team_statistics_by_year() {
        let (client, _temp_dir) = create_test_client();
        seed(&client, "teams?season=20182019", teams_response());
        for id in [1, 2, 3, 20] {
            seed(
                &client,
                &format!("teams/{id}/stats?season=20182019"),
                team_stats_response(id, "1st"),
            );
        }

        let stats = client
            .all_team_statistics_by_year(Season(2018), FetchOptions::default())
            .await
            .unwrap();
        let ids: Vec<_> = stats.iter().map(|s| s["teamId"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3), json!(20)]);
        assert_eq!(stats[3].get("gamesPlayed"), Some(&json!(20)));

        let rankings = client
            .all_team_statistics_rankings_by_year(Season(2018), FetchOptions::default())
            .await
            .unwrap();
        assert!(rankings.iter().all(|r| r["wins"] == json!("1st")));
    }

    #[tokio::test]
    async fn test_team_roster_flattens_person_and_position() {
        let (client, _temp_dir) = create_test_client();
        seed(
            &client,
            "teams/20/roster?season=20182019",
            json!({
                "roster": [{
                    "jerseyNumber": "5",
                    "person": {"id": 8474590, "fullName": "Mark Giordano", "link": "/api/v1/people/8474590"},
                    "position": {"code": "D", "name": "Defenseman", "type": "Defenseman", "abbreviation": "D"}
                }]
            }),
        );

        let roster = client
            .team_roster_by_year(20, Season(2018), FetchOptions::default())
            .await
            .unwrap();
        let row = &roster[0];
        assert_eq!(row.get("playerId"), Some(&json!(8474590)));
        assert_eq!(row.get("fullName"), Some(&json!("Mark Giordano")));
        assert_eq!(row.get("positionName"), Some(&json!("Defenseman")));
        assert_eq!(row.get("positionCode"), Some(&json!("D")));
        assert_eq!(row.get("positionType"), Some(&json!("Defenseman")));
        assert_eq!(row.get("jerseyNumber"), Some(&json!("5")));
        assert_eq!(row.get("teamId"), Some(&json!(20)));
        assert!(row.get("person").is_none());
        assert!(row.get("position").is_none());
    }

    #[tokio::test]
    async fn test_all_team_roster_keeps_duplicates() {
        let (client, _temp_dir) = create_test_client();
        seed(
            &client,
            "teams?season=20182019",
            json!({"teams": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}]}),
        );
        let traded = json!({
            "roster": [{
                "person": {"id": 99, "fullName": "Traded Player"},
                "position": {"code": "C", "name": "Center", "type": "Forward"}
            }]
        });
        seed(&client, "teams/1/roster?season=20182019", traded.clone());
        seed(&client, "teams/2/roster?season=20182019", traded);

        let roster = client
            .all_team_roster_by_year(Season(2018), FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0]["teamId"], json!(1));
        assert_eq!(roster[1]["teamId"], json!(2));
    }

    #[test]
    fn test_find_team_id_exact_and_partial() {
        let teams = team_rows(&teams_response()).unwrap();

        assert_eq!(find_team_id(&teams, "calgary flames").unwrap(), 20);
        assert_eq!(find_team_id(&teams, "Flames").unwrap(), 20);
        assert_eq!(find_team_id(&teams, "islanders").unwrap(), 2);
    }

    #[test]
    fn test_find_team_id_ambiguous_or_missing() {
        let teams = team_rows(&teams_response()).unwrap();

        assert!(matches!(
            find_team_id(&teams, "New York"),
            Err(ApiError::TeamNotFound(_))
        ));
        assert!(matches!(
            find_team_id(&teams, "Nordiques"),
            Err(ApiError::TeamNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_team_id_by_name_and_year() {
        let (client, _temp_dir) = create_test_client();
        seed(&client, "teams?season=20182019", teams_response());

        let id = client
            .team_id_by_name_and_year("Devils", Season(2018), FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(id, 1);
    }
}
