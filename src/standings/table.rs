//! Group tables built from regular-season results

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::scoring::{award_points, is_played, MatchPoints, Outcome};
use crate::{LeagueError, Match, MatchId, MatchMap, Result, StandingsConfig, Team, TeamId};

/// One team's line in a group table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsRow {
    pub team: TeamId,
    pub name: String,
    pub tag: Option<String>,
    pub group: String,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub points: u32,
    pub points_against: u32,
    pub point_diff: i32,
    /// Scheduled regular matches still to play
    pub remaining: u32,
    pub eliminated: bool,
}

impl StandingsRow {
    fn new(team: &Team, group: String) -> Self {
        StandingsRow {
            team: team.id,
            name: team.name.clone(),
            tag: team.tag.clone(),
            group,
            played: 0,
            wins: 0,
            losses: 0,
            points: 0,
            points_against: 0,
            point_diff: 0,
            remaining: 0,
            eliminated: false,
        }
    }
}

/// Ranked rows per group, keyed by group label
pub type GroupStandings = BTreeMap<String, Vec<StandingsRow>>;

/// Group label used for a team, bucketing missing or blank labels
pub fn group_label(team: &Team, cfg: &StandingsConfig) -> String {
    match team.group.as_deref().map(str::trim) {
        Some(g) if !g.is_empty() => g.to_string(),
        _ => cfg.ungrouped_label.clone(),
    }
}

/// Whether a team is one of the configured placeholder teams, by name only
pub fn is_excluded(team: &Team, cfg: &StandingsConfig) -> bool {
    let name = team.name.trim();
    cfg.excluded_teams
        .iter()
        .any(|excluded| excluded.trim().eq_ignore_ascii_case(name))
}

/// Build ranked group tables from teams, matches and their maps.
///
/// Playoff matches and matches involving excluded teams are ignored. A match
/// naming a team that is not in `teams` is an error.
pub fn compute_standings(
    teams: &[Team],
    matches: &[Match],
    maps: &[MatchMap],
    cfg: &StandingsConfig,
) -> Result<GroupStandings> {
    let known: HashSet<TeamId> = teams.iter().map(|t| t.id).collect();
    let excluded: HashSet<TeamId> = teams
        .iter()
        .filter(|t| is_excluded(t, cfg))
        .map(|t| t.id)
        .collect();

    let mut maps_by_match: HashMap<MatchId, Vec<&MatchMap>> = HashMap::new();
    for map in maps {
        maps_by_match.entry(map.match_id).or_default().push(map);
    }

    let mut rows: HashMap<TeamId, StandingsRow> = teams
        .iter()
        .filter(|t| !excluded.contains(&t.id))
        .map(|t| (t.id, StandingsRow::new(t, group_label(t, cfg))))
        .collect();

    let mut awarded: Vec<(&Match, MatchPoints)> = Vec::new();

    for m in matches.iter().filter(|m| m.is_regular()) {
        for side in [m.team1, m.team2] {
            if !known.contains(&side) {
                return Err(LeagueError::UnknownTeam(side));
            }
        }
        if excluded.contains(&m.team1) || excluded.contains(&m.team2) {
            continue;
        }

        let match_maps = maps_by_match.get(&m.id).map(Vec::as_slice).unwrap_or(&[]);
        if !is_played(m, match_maps) {
            continue;
        }

        let points = award_points(m, match_maps, cfg)?;
        log::debug!(
            "{}: {} {} - {} {} ({:?})",
            m.id,
            m.team1,
            points.team1_points,
            points.team2_points,
            m.team2,
            points.score.source
        );

        for (team, earned, conceded) in [
            (m.team1, points.team1_points, points.team2_points),
            (m.team2, points.team2_points, points.team1_points),
        ] {
            if let Some(row) = rows.get_mut(&team) {
                row.played += 1;
                row.points += earned;
                row.points_against += conceded;
                match points.outcome {
                    Outcome::Won(w) if w == team => row.wins += 1,
                    Outcome::Won(_) => row.losses += 1,
                    Outcome::Undecided => {}
                }
            }
        }
        awarded.push((m, points));
    }

    let mut standings = GroupStandings::new();
    for mut row in rows.into_values() {
        row.point_diff = row.points as i32 - row.points_against as i32;
        standings.entry(row.group.clone()).or_default().push(row);
    }
    for rows in standings.values_mut() {
        rank_group(rows, &awarded);
    }

    Ok(standings)
}

/// Points each team earned against the other members of its tie cluster
fn head_to_head_points(
    rows: &[StandingsRow],
    awarded: &[(&Match, MatchPoints)],
) -> HashMap<TeamId, u32> {
    let mut clusters: HashMap<(u32, i32), HashSet<TeamId>> = HashMap::new();
    for row in rows {
        clusters
            .entry((row.points, row.point_diff))
            .or_default()
            .insert(row.team);
    }

    let mut h2h: HashMap<TeamId, u32> = HashMap::new();
    for row in rows {
        let cluster = &clusters[&(row.points, row.point_diff)];
        if cluster.len() < 2 {
            continue;
        }
        let earned = awarded
            .iter()
            .filter(|(m, _)| m.involves(row.team))
            .filter(|(m, _)| m.opponent(row.team).is_some_and(|o| cluster.contains(&o)))
            .filter_map(|(m, points)| points.points_for(m, row.team))
            .sum();
        h2h.insert(row.team, earned);
    }
    h2h
}

/// Sort a group: points, point differential, head-to-head, name, id
fn rank_group(rows: &mut [StandingsRow], awarded: &[(&Match, MatchPoints)]) {
    let h2h = head_to_head_points(rows, awarded);
    let h2h_of = |team: TeamId| h2h.get(&team).copied().unwrap_or(0);

    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.point_diff.cmp(&a.point_diff))
            .then(h2h_of(b.team).cmp(&h2h_of(a.team)))
            .then(a.name.cmp(&b.name))
            .then(a.team.cmp(&b.team))
    });
}
