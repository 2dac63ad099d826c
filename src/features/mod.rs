//! Feature extraction
//!
//! Team form, head-to-head, map and player-impact signals computed from a
//! league snapshot, combined into the matchup vector the classifier consumes.

pub mod matchup;
pub mod player_impact;
pub mod team_form;

pub use matchup::{default_week, extract, MatchupFeatures, MatchupOverrides};
pub use player_impact::{average_acs, player_leaderboard, LeaderboardEntry};
pub use team_form::{head_to_head, map_win_rate, recent_form, team_record, TeamRecord};
