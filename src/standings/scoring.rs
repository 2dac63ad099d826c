//! Per-match score resolution and point awards

use crate::{LeagueError, Match, MatchMap, Result, SeriesFormat, StandingsConfig, TeamId};

/// Where a resolved score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    /// Round counts of the single map of a BO1
    MapRounds,
    /// Match-level aggregate score
    MatchScore,
    /// Number of maps won by each side
    MapWins,
    /// No usable score data
    Missing,
}

/// Score of a match after picking the first usable source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedScore {
    pub team1: u32,
    pub team2: u32,
    pub source: ScoreSource,
}

/// Result of a match from the table's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won(TeamId),
    /// Equal scores and no declared winner
    Undecided,
}

/// Points awarded to each side of a played match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPoints {
    pub team1_points: u32,
    pub team2_points: u32,
    pub outcome: Outcome,
    pub score: ResolvedScore,
}

impl MatchPoints {
    /// Points earned by one side, or `None` if it did not play
    pub fn points_for(&self, m: &Match, team: TeamId) -> Option<u32> {
        if team == m.team1 {
            Some(self.team1_points)
        } else if team == m.team2 {
            Some(self.team2_points)
        } else {
            None
        }
    }
}

fn round_sum(maps: &[&MatchMap]) -> u32 {
    maps.iter().map(|m| m.team1_rounds + m.team2_rounds).sum()
}

/// Whether a match counts toward the table.
///
/// Status lags behind data entry, so a match with any recorded result counts
/// even while it is still marked scheduled.
pub fn is_played(m: &Match, maps: &[&MatchMap]) -> bool {
    m.is_completed()
        || m.score_t1 + m.score_t2 > 0
        || round_sum(maps) > 0
        || m.is_forfeit
        || m.maps_played > 0
}

/// Pick the score used for standings. `maps` must be the maps of `m`.
pub fn resolve_score(m: &Match, maps: &[&MatchMap]) -> ResolvedScore {
    let single_map = matches!(m.format, None | Some(SeriesFormat::Bo1));
    if single_map {
        if let Some(first) = maps.iter().find(|map| map.map_index == 0) {
            if first.team1_rounds + first.team2_rounds > 0 {
                return ResolvedScore {
                    team1: first.team1_rounds,
                    team2: first.team2_rounds,
                    source: ScoreSource::MapRounds,
                };
            }
        }
    }

    if m.score_t1 + m.score_t2 > 0 {
        return ResolvedScore {
            team1: m.score_t1,
            team2: m.score_t2,
            source: ScoreSource::MatchScore,
        };
    }

    let wins = |team: TeamId| maps.iter().filter(|map| map.winner == Some(team)).count() as u32;
    let (w1, w2) = (wins(m.team1), wins(m.team2));
    if w1 + w2 > 0 {
        return ResolvedScore {
            team1: w1,
            team2: w2,
            source: ScoreSource::MapWins,
        };
    }

    ResolvedScore {
        team1: 0,
        team2: 0,
        source: ScoreSource::Missing,
    }
}

/// Award table points for a played match.
///
/// Fails when the declared winner is not one of the two sides.
pub fn award_points(m: &Match, maps: &[&MatchMap], cfg: &StandingsConfig) -> Result<MatchPoints> {
    if let Some(w) = m.winner {
        if !m.involves(w) {
            return Err(LeagueError::InvalidWinner {
                match_id: m.id,
                winner: w,
            });
        }
    }

    let score = resolve_score(m, maps);
    let outcome = match score.team1.cmp(&score.team2) {
        std::cmp::Ordering::Greater => Outcome::Won(m.team1),
        std::cmp::Ordering::Less => Outcome::Won(m.team2),
        std::cmp::Ordering::Equal => match m.winner {
            Some(w) => Outcome::Won(w),
            None => Outcome::Undecided,
        },
    };

    let loser_points = |loser_score: u32| {
        if m.is_forfeit {
            0
        } else {
            loser_score.min(cfg.loss_point_cap)
        }
    };

    let (team1_points, team2_points) = match outcome {
        Outcome::Won(w) if w == m.team1 => (cfg.win_points, loser_points(score.team2)),
        Outcome::Won(_) => (loser_points(score.team1), cfg.win_points),
        Outcome::Undecided => (0, 0),
    };

    Ok(MatchPoints {
        team1_points,
        team2_points,
        outcome,
        score,
    })
}
