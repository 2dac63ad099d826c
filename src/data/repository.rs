//! Storage seam for the standings and predictor core
//!
//! Everything above this trait works on plain league records and never knows
//! which backend answered the query.

use crate::{
    Match, MatchId, MatchMap, MatchStatus, MatchType, Player, PlayerId, PlayerMapStat, Result,
    Team, TeamId,
};

/// Filter for match listings; `None` fields match everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchFilter {
    pub match_type: Option<MatchType>,
    pub status: Option<MatchStatus>,
}

impl MatchFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn completed() -> Self {
        MatchFilter {
            match_type: None,
            status: Some(MatchStatus::Completed),
        }
    }

    pub fn scheduled() -> Self {
        MatchFilter {
            match_type: None,
            status: Some(MatchStatus::Scheduled),
        }
    }

    pub fn regular() -> Self {
        MatchFilter {
            match_type: Some(MatchType::Regular),
            status: None,
        }
    }

    pub fn accepts(&self, m: &Match) -> bool {
        self.match_type.is_none_or(|t| t == m.match_type)
            && self.status.is_none_or(|s| s == m.status)
    }
}

/// Filter for per-map player stat rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerStatFilter {
    pub team: Option<TeamId>,
    pub players: Option<Vec<PlayerId>>,
    pub match_id: Option<MatchId>,
}

impl PlayerStatFilter {
    pub fn for_team(team: TeamId) -> Self {
        PlayerStatFilter {
            team: Some(team),
            ..Self::default()
        }
    }

    pub fn for_players(players: Vec<PlayerId>) -> Self {
        PlayerStatFilter {
            players: Some(players),
            ..Self::default()
        }
    }

    pub fn accepts(&self, stat: &PlayerMapStat) -> bool {
        if self.team.is_some_and(|t| t != stat.team) {
            return false;
        }
        if self.match_id.is_some_and(|m| m != stat.match_id) {
            return false;
        }
        match &self.players {
            Some(ids) => stat.player.is_some_and(|p| ids.contains(&p)),
            None => true,
        }
    }
}

/// Read access to league data
pub trait LeagueRepository {
    fn list_teams(&self) -> Result<Vec<Team>>;

    fn list_players(&self) -> Result<Vec<Player>>;

    fn list_matches(&self, filter: MatchFilter) -> Result<Vec<Match>>;

    /// Maps of one match, ordered by map index
    fn list_match_maps(&self, match_id: MatchId) -> Result<Vec<MatchMap>>;

    /// Every map row, for bulk loads
    fn list_all_match_maps(&self) -> Result<Vec<MatchMap>>;

    fn list_scheduled_matches(&self) -> Result<Vec<Match>> {
        self.list_matches(MatchFilter::scheduled())
    }

    fn list_player_map_stats(&self, filter: &PlayerStatFilter) -> Result<Vec<PlayerMapStat>>;
}
