//! Player combat-score features and the leaderboard

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::data::{LeagueSnapshot, PlayerStatFilter};
use crate::{MatchId, PlayerId, PlayerMapStat, TeamId};

/// Mean ACS over a team's per-map stat lines.
///
/// With a non-empty roster the mean covers only those players' lines,
/// whichever team they played for. Returns `baseline` when no line has an ACS.
pub fn average_acs(
    snapshot: &LeagueSnapshot,
    team: TeamId,
    roster: &[PlayerId],
    baseline: f64,
) -> f64 {
    let filter = if roster.is_empty() {
        PlayerStatFilter::for_team(team)
    } else {
        PlayerStatFilter::for_players(roster.to_vec())
    };

    let scores: Vec<u32> = snapshot
        .player_stats
        .iter()
        .filter(|s| filter.accepts(s))
        .filter_map(|s| s.acs)
        .collect();

    if scores.is_empty() {
        baseline
    } else {
        scores.iter().map(|&a| a as f64).sum::<f64>() / scores.len() as f64
    }
}

/// One player's line on the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub player: PlayerId,
    pub name: String,
    /// Distinct matches with at least one stat line
    pub games: usize,
    pub avg_acs: f64,
    pub kills: u32,
    pub deaths: u32,
    pub kd: f64,
}

#[derive(Default)]
struct PlayerTotals {
    matches: HashSet<MatchId>,
    acs_sum: u64,
    acs_lines: usize,
    kills: u32,
    deaths: u32,
}

impl PlayerTotals {
    fn update(&mut self, stat: &PlayerMapStat) {
        self.matches.insert(stat.match_id);
        if let Some(acs) = stat.acs {
            self.acs_sum += acs as u64;
            self.acs_lines += 1;
        }
        self.kills += stat.kills;
        self.deaths += stat.deaths;
    }
}

/// Top players by average ACS over completed matches.
///
/// Players with fewer than `min_games` matches are left out. K/D divides by
/// at least one death.
pub fn player_leaderboard(
    snapshot: &LeagueSnapshot,
    min_games: usize,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let completed: HashSet<MatchId> = snapshot.completed_matches().map(|m| m.id).collect();

    let mut totals: HashMap<PlayerId, PlayerTotals> = HashMap::new();
    for stat in snapshot
        .player_stats
        .iter()
        .filter(|s| completed.contains(&s.match_id))
    {
        if let Some(player) = stat.player {
            totals.entry(player).or_default().update(stat);
        }
    }

    let names: HashMap<PlayerId, &str> = snapshot
        .players
        .iter()
        .map(|p| (p.id, p.name.as_str()))
        .collect();

    let mut entries: Vec<LeaderboardEntry> = totals
        .into_iter()
        .filter(|(_, t)| t.matches.len() >= min_games)
        .map(|(player, t)| LeaderboardEntry {
            player,
            name: names
                .get(&player)
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("Player {}", player.0)),
            games: t.matches.len(),
            avg_acs: if t.acs_lines == 0 {
                0.0
            } else {
                t.acs_sum as f64 / t.acs_lines as f64
            },
            kills: t.kills,
            deaths: t.deaths,
            kd: t.kills as f64 / t.deaths.max(1) as f64,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.avg_acs
            .total_cmp(&a.avg_acs)
            .then_with(|| a.name.cmp(&b.name))
            .then(a.player.cmp(&b.player))
    });
    entries.truncate(limit);
    entries
}
