//! Storage keys, load destinations and output schemas.

/// Endpoint listing the season's teams. Rosters live under `{endpoint}/{team_id}/players`.
pub const TEAMS_ENDPOINT: &str = "epl/v1/teams";

/// Schema the cleaned tables are loaded into.
pub const DEFAULT_SCHEMA: &str = "epl_datapipeline";

pub const TEAMS_TABLE: &str = "epl_teams";
pub const PLAYERS_TABLE: &str = "epl_team_players";

/// Column added to every player row naming the team it was fetched for.
pub const TEAM_ID_COLUMN: &str = "team_id";

/// Destination for cleaned teams.
pub const TEAMS_DESTINATION: &str = "epl_datapipeline.epl_teams";

/// Destination for cleaned players.
pub const PLAYERS_DESTINATION: &str = "epl_datapipeline.epl_team_players";

/// Cleaned player columns, in load order.
pub const PLAYER_COLUMNS: [&str; 11] = [
    "id",
    "position",
    "national_team",
    "height",
    "weight",
    "birth_date",
    "age",
    "name",
    "first_name",
    "last_name",
    TEAM_ID_COLUMN,
];

/// Archive key for the raw team listing of a season.
pub fn team_archive_key(season: u16) -> String {
    format!("raw/json/teams/{season}_teams.json")
}

/// Archive key for the raw roster of one team.
pub fn player_archive_key(team_id: impl std::fmt::Display) -> String {
    format!("raw/json/epl/players/{team_id}_players.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_keys_match_bucket_layout() {
        assert_eq!(team_archive_key(2024), "raw/json/teams/2024_teams.json");
        assert_eq!(player_archive_key(14), "raw/json/epl/players/14_players.json");
    }

    #[test]
    fn player_schema_ends_with_team_tag() {
        assert_eq!(PLAYER_COLUMNS.last(), Some(&TEAM_ID_COLUMN));
        assert_eq!(PLAYER_COLUMNS.first(), Some(&"id"));
    }

    #[test]
    fn destinations_are_schema_qualified_tables() {
        assert_eq!(TEAMS_DESTINATION, format!("{DEFAULT_SCHEMA}.{TEAMS_TABLE}"));
        assert_eq!(PLAYERS_DESTINATION, format!("{DEFAULT_SCHEMA}.{PLAYERS_TABLE}"));
    }
}
