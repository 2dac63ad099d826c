//! Immutable in-memory view of the league
//!
//! Standings, features and training all run over a snapshot, so a caller that
//! loads one gets a consistent read for the whole computation.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::repository::{LeagueRepository, MatchFilter, PlayerStatFilter};
use crate::{Match, MatchId, MatchMap, Player, PlayerMapStat, Result, Team, TeamId};

/// A consistent read of every league table. Also the JSON import format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub teams: Vec<Team>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub matches: Vec<Match>,
    #[serde(default)]
    pub maps: Vec<MatchMap>,
    #[serde(default)]
    pub player_stats: Vec<PlayerMapStat>,
}

impl LeagueSnapshot {
    /// Read every table from a repository
    pub fn load<R: LeagueRepository + ?Sized>(repo: &R) -> Result<Self> {
        Ok(LeagueSnapshot {
            teams: repo.list_teams()?,
            players: repo.list_players()?,
            matches: repo.list_matches(MatchFilter::all())?,
            maps: repo.list_all_match_maps()?,
            player_stats: repo.list_player_map_stats(&PlayerStatFilter::default())?,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Find a team by name or tag
    pub fn find_team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.matches_name(name))
    }

    pub fn team_name(&self, id: TeamId) -> String {
        self.team(id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("Team {}", id.0))
    }

    pub fn completed_matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(|m| m.is_completed())
    }

    /// Scheduled regular-season matches
    pub fn scheduled_regular(&self) -> Vec<Match> {
        self.matches
            .iter()
            .filter(|m| m.is_scheduled() && m.is_regular())
            .cloned()
            .collect()
    }

    /// Maps of a match, ordered by map index
    pub fn maps_for(&self, match_id: MatchId) -> Vec<&MatchMap> {
        let mut maps: Vec<&MatchMap> = self.maps.iter().filter(|m| m.match_id == match_id).collect();
        maps.sort_by_key(|m| m.map_index);
        maps
    }

    /// Highest week number among all matches
    pub fn latest_week(&self) -> Option<u32> {
        self.matches.iter().map(|m| m.week).max()
    }

    /// History as it stood before the given week: only matches from earlier
    /// weeks, and only the maps and stat lines that belong to them.
    pub fn before_week(&self, week: u32) -> LeagueSnapshot {
        let matches: Vec<Match> = self
            .matches
            .iter()
            .filter(|m| m.week < week)
            .cloned()
            .collect();
        let kept: HashSet<MatchId> = matches.iter().map(|m| m.id).collect();

        LeagueSnapshot {
            teams: self.teams.clone(),
            players: self.players.clone(),
            maps: self
                .maps
                .iter()
                .filter(|m| kept.contains(&m.match_id))
                .cloned()
                .collect(),
            player_stats: self
                .player_stats
                .iter()
                .filter(|s| kept.contains(&s.match_id))
                .cloned()
                .collect(),
            matches,
        }
    }
}

impl LeagueRepository for LeagueSnapshot {
    fn list_teams(&self) -> Result<Vec<Team>> {
        Ok(self.teams.clone())
    }

    fn list_players(&self) -> Result<Vec<Player>> {
        Ok(self.players.clone())
    }

    fn list_matches(&self, filter: MatchFilter) -> Result<Vec<Match>> {
        Ok(self
            .matches
            .iter()
            .filter(|m| filter.accepts(m))
            .cloned()
            .collect())
    }

    fn list_match_maps(&self, match_id: MatchId) -> Result<Vec<MatchMap>> {
        Ok(self.maps_for(match_id).into_iter().cloned().collect())
    }

    fn list_all_match_maps(&self) -> Result<Vec<MatchMap>> {
        Ok(self.maps.clone())
    }

    fn list_player_map_stats(&self, filter: &PlayerStatFilter) -> Result<Vec<PlayerMapStat>> {
        Ok(self
            .player_stats
            .iter()
            .filter(|s| filter.accepts(s))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatchStatus, MatchType};

    const SAMPLE: &str = r#"{
        "teams": [
            {"id": 1, "name": "Night Owls", "tag": "NOW", "group": "ALPHA"},
            {"id": 2, "name": "Red Foxes", "group": "ALPHA"}
        ],
        "matches": [
            {"id": 10, "week": 1, "team1": 1, "team2": 2, "match_type": "regular",
             "status": "completed", "score_t1": 13, "score_t2": 9, "format": "BO1"},
            {"id": 11, "week": 2, "team1": 2, "team2": 1, "match_type": "regular",
             "status": "scheduled"}
        ],
        "maps": [
            {"match_id": 10, "map_index": 0, "map_name": "Ascent",
             "team1_rounds": 13, "team2_rounds": 9, "winner": 1}
        ],
        "player_stats": [
            {"match_id": 10, "map_index": 0, "team": 1, "player": 5, "acs": 250}
        ]
    }"#;

    #[test]
    fn test_parse_snapshot_json() {
        let snapshot = LeagueSnapshot::from_json(SAMPLE).unwrap();
        assert_eq!(snapshot.teams.len(), 2);
        assert_eq!(snapshot.matches[1].status, MatchStatus::Scheduled);
        assert_eq!(snapshot.matches[1].score_t1, 0);
        assert!(!snapshot.matches[0].is_forfeit);
        assert_eq!(snapshot.find_team("now").map(|t| t.id), Some(TeamId(1)));
        assert_eq!(snapshot.latest_week(), Some(2));
    }

    #[test]
    fn test_repository_filters() {
        let snapshot = LeagueSnapshot::from_json(SAMPLE).unwrap();
        assert_eq!(snapshot.list_scheduled_matches().unwrap().len(), 1);
        let filter = MatchFilter {
            match_type: Some(MatchType::Playoff),
            status: None,
        };
        assert!(snapshot.list_matches(filter).unwrap().is_empty());
        assert_eq!(snapshot.list_match_maps(MatchId(10)).unwrap().len(), 1);
    }

    #[test]
    fn test_before_week_drops_later_rows() {
        let snapshot = LeagueSnapshot::from_json(SAMPLE).unwrap();
        let early = snapshot.before_week(1);
        assert!(early.matches.is_empty());
        assert!(early.maps.is_empty());
        assert!(early.player_stats.is_empty());
        assert_eq!(early.teams.len(), 2);

        let later = snapshot.before_week(2);
        assert_eq!(later.matches.len(), 1);
        assert_eq!(later.player_stats.len(), 1);
    }
}
