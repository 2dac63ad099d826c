//! Community esports league core
//!
//! Group standings with elimination and playoff-race detection, plus a match
//! outcome predictor backed by a small neural classifier with a heuristic fallback.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod standings;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// Unique identifier for a match (a series of one or more maps)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchId(pub i64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Match({})", self.0)
    }
}

/// Unique identifier for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player({})", self.0)
    }
}

/// Regular-season or playoff match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Regular,
    Playoff,
}

impl MatchType {
    pub fn code(&self) -> &'static str {
        match self {
            MatchType::Regular => "regular",
            MatchType::Playoff => "playoff",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "regular" => Some(MatchType::Regular),
            "playoff" | "playoffs" => Some(MatchType::Playoff),
            _ => None,
        }
    }
}

/// Lifecycle state of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Completed,
}

impl MatchStatus {
    pub fn code(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Completed => "completed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "scheduled" => Some(MatchStatus::Scheduled),
            "completed" => Some(MatchStatus::Completed),
            _ => None,
        }
    }
}

/// Best-of-N series format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesFormat {
    #[serde(rename = "BO1")]
    Bo1,
    #[serde(rename = "BO3")]
    Bo3,
    #[serde(rename = "BO5")]
    Bo5,
}

impl SeriesFormat {
    pub fn code(&self) -> &'static str {
        match self {
            SeriesFormat::Bo1 => "BO1",
            SeriesFormat::Bo3 => "BO3",
            SeriesFormat::Bo5 => "BO5",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "BO1" => Some(SeriesFormat::Bo1),
            "BO3" => Some(SeriesFormat::Bo3),
            "BO5" => Some(SeriesFormat::Bo5),
            _ => None,
        }
    }
}

/// A league team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl Team {
    /// Case-insensitive match against the display name or the short tag
    pub fn matches_name(&self, name: &str) -> bool {
        let name_lower = name.trim().to_lowercase();
        self.name.to_lowercase() == name_lower
            || self
                .tag
                .as_ref()
                .is_some_and(|t| t.to_lowercase() == name_lower)
    }
}

/// A registered player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub riot_id: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub default_team: Option<TeamId>,
}

/// A scheduled or completed series between two teams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub week: u32,
    #[serde(default)]
    pub group: Option<String>,
    pub team1: TeamId,
    pub team2: TeamId,
    pub match_type: MatchType,
    pub status: MatchStatus,
    #[serde(default)]
    pub score_t1: u32,
    #[serde(default)]
    pub score_t2: u32,
    #[serde(default)]
    pub winner: Option<TeamId>,
    #[serde(default)]
    pub format: Option<SeriesFormat>,
    #[serde(default)]
    pub maps_played: u32,
    #[serde(default)]
    pub is_forfeit: bool,
}

impl Match {
    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn is_scheduled(&self) -> bool {
        self.status == MatchStatus::Scheduled
    }

    pub fn is_regular(&self) -> bool {
        self.match_type == MatchType::Regular
    }

    /// Check whether the given team plays in this match
    pub fn involves(&self, team: TeamId) -> bool {
        self.team1 == team || self.team2 == team
    }

    /// Check whether this match is between the two given teams, in either order
    pub fn is_between(&self, a: TeamId, b: TeamId) -> bool {
        (self.team1 == a && self.team2 == b) || (self.team1 == b && self.team2 == a)
    }

    /// Get the opponent for a given team
    pub fn opponent(&self, team: TeamId) -> Option<TeamId> {
        if team == self.team1 {
            Some(self.team2)
        } else if team == self.team2 {
            Some(self.team1)
        } else {
            None
        }
    }

    /// Get the match-level score for a specific team
    pub fn score_for(&self, team: TeamId) -> Option<u32> {
        if team == self.team1 {
            Some(self.score_t1)
        } else if team == self.team2 {
            Some(self.score_t2)
        } else {
            None
        }
    }

    /// The declared winner when it is one of the two sides, otherwise the side
    /// with the higher match-level score. `None` when neither decides.
    pub fn decided_winner(&self) -> Option<TeamId> {
        if let Some(w) = self.winner.filter(|w| self.involves(*w)) {
            return Some(w);
        }
        match self.score_t1.cmp(&self.score_t2) {
            std::cmp::Ordering::Greater => Some(self.team1),
            std::cmp::Ordering::Less => Some(self.team2),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Check if the given team won this match
    pub fn did_win(&self, team: TeamId) -> Option<bool> {
        if !self.involves(team) {
            return None;
        }
        Some(self.decided_winner() == Some(team))
    }
}

/// One map of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMap {
    pub match_id: MatchId,
    pub map_index: u32,
    pub map_name: String,
    #[serde(default)]
    pub team1_rounds: u32,
    #[serde(default)]
    pub team2_rounds: u32,
    #[serde(default)]
    pub winner: Option<TeamId>,
    #[serde(default)]
    pub is_forfeit: bool,
}

/// Per-player, per-map performance line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMapStat {
    pub match_id: MatchId,
    pub map_index: u32,
    pub team: TeamId,
    #[serde(default)]
    pub player: Option<PlayerId>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub acs: Option<u32>,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub is_sub: bool,
    #[serde(default)]
    pub subbed_for: Option<PlayerId>,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown team: {0}")]
    UnknownTeamName(String),

    #[error("Team not found with ID: {0}")]
    UnknownTeam(TeamId),

    #[error("Match not found with ID: {0}")]
    UnknownMatch(MatchId),

    #[error("{match_id} declares winner {winner}, which is not one of its teams")]
    InvalidWinner { match_id: MatchId, winner: TeamId },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Stored model {version} is unreadable: {reason}")]
    CorruptModel { version: i64, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, LeagueError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub standings: StandingsConfig,
    pub predictor: PredictorConfig,
    pub training: TrainingConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StandingsConfig {
    /// Points for winning a match
    pub win_points: u32,
    /// Most points a losing side can take from a match
    pub loss_point_cap: u32,
    /// Teams per group that qualify for the playoffs
    pub playoff_spots: usize,
    /// Placeholder teams left out of every table
    pub excluded_teams: Vec<String>,
    /// Bucket for teams without a group label
    pub ungrouped_label: String,
}

impl Default for StandingsConfig {
    fn default() -> Self {
        StandingsConfig {
            win_points: 15,
            loss_point_cap: 12,
            playoff_spots: 6,
            excluded_teams: vec!["FAT1".to_string(), "FAT2".to_string()],
            ungrouped_label: "UNASSIGNED".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub recent_form_window: usize,
    pub neutral_win_rate: f64,
    pub baseline_acs: f64,
    pub heuristic: HeuristicWeights,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        PredictorConfig {
            recent_form_window: 3,
            neutral_win_rate: 0.5,
            baseline_acs: 200.0,
            heuristic: HeuristicWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    pub win_rate: f64,
    pub avg_score: f64,
    pub head_to_head: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        HeuristicWeights {
            win_rate: 40.0,
            avg_score: 2.0,
            head_to_head: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub min_matches: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub hidden_dim: usize,
    /// Build each training example only from weeks before the match
    pub walk_forward: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            min_matches: 3,
            epochs: 400,
            learning_rate: 0.1,
            hidden_dim: 16,
            walk_forward: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub database_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            database_path: "data/league.db".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LeagueError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| LeagueError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LeagueError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_match(score_t1: u32, score_t2: u32, winner: Option<i64>) -> Match {
        Match {
            id: MatchId(1),
            week: 1,
            group: Some("ALPHA".to_string()),
            team1: TeamId(1),
            team2: TeamId(2),
            match_type: MatchType::Regular,
            status: MatchStatus::Completed,
            score_t1,
            score_t2,
            winner: winner.map(TeamId),
            format: Some(SeriesFormat::Bo1),
            maps_played: 1,
            is_forfeit: false,
        }
    }

    #[test]
    fn test_decided_winner_prefers_declared() {
        assert_eq!(make_match(0, 0, Some(2)).decided_winner(), Some(TeamId(2)));
        assert_eq!(make_match(13, 7, None).decided_winner(), Some(TeamId(1)));
        assert_eq!(make_match(5, 5, None).decided_winner(), None);
        // A winner outside the pairing is ignored
        assert_eq!(make_match(2, 9, Some(7)).decided_winner(), Some(TeamId(2)));
    }

    #[test]
    fn test_opponent_and_scores() {
        let m = make_match(13, 9, None);
        assert_eq!(m.opponent(TeamId(1)), Some(TeamId(2)));
        assert_eq!(m.opponent(TeamId(3)), None);
        assert_eq!(m.score_for(TeamId(2)), Some(9));
        assert_eq!(m.did_win(TeamId(1)), Some(true));
        assert_eq!(m.did_win(TeamId(3)), None);
    }

    #[test]
    fn test_codes_round_trip() {
        assert_eq!(SeriesFormat::from_code("bo3"), Some(SeriesFormat::Bo3));
        assert_eq!(MatchType::from_code(" Playoff "), Some(MatchType::Playoff));
        assert_eq!(MatchStatus::from_code("done"), None);
    }

    #[test]
    fn test_team_name_matching() {
        let team = Team {
            id: TeamId(1),
            name: "Night Owls".to_string(),
            tag: Some("NOW".to_string()),
            group: None,
        };
        assert!(team.matches_name("night owls"));
        assert!(team.matches_name("now"));
        assert!(!team.matches_name("owls"));
    }

    #[test]
    fn test_config_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[standings]\nplayoff_spots = 4\n").unwrap();
        assert_eq!(config.standings.playoff_spots, 4);
        assert_eq!(config.standings.win_points, 15);
        assert_eq!(config.training.min_matches, 3);
        assert!((config.predictor.baseline_acs - 200.0).abs() < f64::EPSILON);
    }
}
