//! Elimination and playoff-race annotations

use std::collections::HashMap;

use serde::Serialize;

use super::table::{GroupStandings, StandingsRow};
use crate::{Match, StandingsConfig, TeamId};

/// Name shown when a race candidate has no known next opponent
pub const UNKNOWN_OPPONENT: &str = "TBD";

/// A team whose last regular match decides whether it reaches the playoffs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceCandidate {
    pub group: String,
    pub team: TeamId,
    pub team_name: String,
    pub opponent: Option<TeamId>,
    pub opponent_name: String,
    /// Points the team would reach by winning its last match
    pub points_if_win: u32,
}

/// Scheduled regular matches involving a team
pub fn remaining_matches(team: TeamId, scheduled: &[Match]) -> u32 {
    scheduled
        .iter()
        .filter(|m| m.is_scheduled() && m.is_regular() && m.involves(team))
        .count() as u32
}

/// Points of the last playoff spot, 0 when the group is smaller than the
/// number of spots
pub fn playoff_cutoff(rows: &[StandingsRow], playoff_spots: usize) -> u32 {
    match playoff_spots.checked_sub(1).and_then(|i| rows.get(i)) {
        Some(row) => row.points,
        None => 0,
    }
}

/// A team is out when even winning every remaining match leaves it below the cutoff
pub fn is_eliminated(points: u32, remaining: u32, cutoff: u32, win_points: u32) -> bool {
    points + remaining * win_points < cutoff
}

/// Earliest scheduled opponent of a team: lowest week, then lowest id
fn next_opponent(team: TeamId, scheduled: &[Match]) -> Option<TeamId> {
    scheduled
        .iter()
        .filter(|m| m.involves(team))
        .min_by_key(|m| (m.week, m.id))
        .and_then(|m| m.opponent(team))
}

/// Fill in remaining-match counts and elimination flags, and list the teams
/// in a one-match playoff race.
///
/// Scheduled matches against teams missing from the table are ignored.
pub fn annotate_elimination_and_races(
    mut standings: GroupStandings,
    scheduled: &[Match],
    cfg: &StandingsConfig,
) -> (GroupStandings, Vec<RaceCandidate>) {
    let names: HashMap<TeamId, String> = standings
        .values()
        .flatten()
        .map(|r| (r.team, r.name.clone()))
        .collect();

    let pending: Vec<Match> = scheduled
        .iter()
        .filter(|m| m.is_scheduled() && m.is_regular())
        .filter(|m| names.contains_key(&m.team1) && names.contains_key(&m.team2))
        .cloned()
        .collect();

    let mut races = Vec::new();

    for (group, rows) in standings.iter_mut() {
        let cutoff = playoff_cutoff(rows, cfg.playoff_spots);

        for (index, row) in rows.iter_mut().enumerate() {
            let rank = index + 1;
            row.remaining = remaining_matches(row.team, &pending);
            row.eliminated = is_eliminated(row.points, row.remaining, cutoff, cfg.win_points);

            let points_if_win = row.points + cfg.win_points;
            if row.remaining == 1 && rank > cfg.playoff_spots && points_if_win >= cutoff {
                let opponent = next_opponent(row.team, &pending);
                let opponent_name = opponent
                    .and_then(|o| names.get(&o).cloned())
                    .unwrap_or_else(|| UNKNOWN_OPPONENT.to_string());

                log::debug!(
                    "{} ({}) in playoff race against {}",
                    row.name,
                    group,
                    opponent_name
                );
                races.push(RaceCandidate {
                    group: group.clone(),
                    team: row.team,
                    team_name: row.name.clone(),
                    opponent,
                    opponent_name,
                    points_if_win,
                });
            }
        }
    }

    (standings, races)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::table::compute_standings;
    use crate::{MatchId, MatchStatus, MatchType, SeriesFormat, Team};

    fn fixture(id: i64, week: u32, t1: i64, t2: i64) -> Match {
        Match {
            id: MatchId(id),
            week,
            group: None,
            team1: TeamId(t1),
            team2: TeamId(t2),
            match_type: MatchType::Regular,
            status: MatchStatus::Scheduled,
            score_t1: 0,
            score_t2: 0,
            winner: None,
            format: Some(SeriesFormat::Bo1),
            maps_played: 0,
            is_forfeit: false,
        }
    }

    fn row(id: i64, points: u32) -> StandingsRow {
        StandingsRow {
            team: TeamId(id),
            name: format!("Team {}", id),
            tag: None,
            group: "ALPHA".to_string(),
            played: 6,
            wins: 0,
            losses: 0,
            points,
            points_against: 0,
            point_diff: points as i32,
            remaining: 0,
            eliminated: false,
        }
    }

    /// Eight teams with points already in rank order
    fn table(points: &[u32]) -> GroupStandings {
        let rows = points
            .iter()
            .enumerate()
            .map(|(i, p)| row(i as i64 + 1, *p))
            .collect();
        GroupStandings::from([("ALPHA".to_string(), rows)])
    }

    #[test]
    fn test_not_eliminated_with_two_to_play() {
        // 83 points, two matches left, cutoff 60: max 113
        assert!(!is_eliminated(83, 2, 60, 15));
        assert!(is_eliminated(20, 2, 60, 15));
        assert!(!is_eliminated(30, 2, 60, 15));
    }

    #[test]
    fn test_cutoff_small_group() {
        let rows: Vec<StandingsRow> = (1..=4).map(|i| row(i, 50)).collect();
        assert_eq!(playoff_cutoff(&rows, 6), 0);
        assert_eq!(playoff_cutoff(&rows, 4), 50);
        assert_eq!(playoff_cutoff(&rows, 0), 0);
    }

    #[test]
    fn test_elimination_flags_and_remaining() {
        let standings = table(&[90, 80, 75, 70, 65, 60, 50, 10]);
        let scheduled = vec![
            fixture(1, 7, 7, 1),
            fixture(2, 8, 7, 2),
            fixture(3, 7, 8, 3),
        ];
        let (standings, _) =
            annotate_elimination_and_races(standings, &scheduled, &StandingsConfig::default());
        let rows = &standings["ALPHA"];

        assert_eq!(rows[6].remaining, 2);
        assert!(!rows[6].eliminated);
        // 10 + 15 < 60
        assert_eq!(rows[7].remaining, 1);
        assert!(rows[7].eliminated);
        assert!(!rows[0].eliminated);
    }

    #[test]
    fn test_race_candidate_paired_with_next_opponent() {
        let standings = table(&[90, 80, 75, 70, 65, 60, 50, 48]);
        let mut played = fixture(9, 6, 7, 3);
        played.status = MatchStatus::Completed;
        let scheduled = vec![
            fixture(4, 8, 8, 2),
            fixture(3, 7, 7, 1),
            played,
        ];
        let (_, races) =
            annotate_elimination_and_races(standings, &scheduled, &StandingsConfig::default());

        assert_eq!(races.len(), 2);
        let seventh = races.iter().find(|r| r.team == TeamId(7)).unwrap();
        assert_eq!(seventh.opponent, Some(TeamId(1)));
        assert_eq!(seventh.opponent_name, "Team 1");
        assert_eq!(seventh.points_if_win, 65);

        let eighth = races.iter().find(|r| r.team == TeamId(8)).unwrap();
        assert_eq!(eighth.opponent, Some(TeamId(2)));
    }

    #[test]
    fn test_race_requires_reaching_cutoff() {
        // 40 + 15 < 60: no race, and eliminated
        let standings = table(&[90, 80, 75, 70, 65, 60, 40, 30]);
        let scheduled = vec![fixture(1, 7, 7, 8)];
        let (standings, races) =
            annotate_elimination_and_races(standings, &scheduled, &StandingsConfig::default());
        assert!(races.is_empty());
        assert!(standings["ALPHA"][6].eliminated);
    }

    #[test]
    fn test_pipeline_from_results() {
        let teams: Vec<Team> = (1..=3)
            .map(|i| Team {
                id: TeamId(i),
                name: format!("Team {}", i),
                tag: None,
                group: Some("OMEGA".to_string()),
            })
            .collect();
        let mut done = fixture(1, 1, 1, 2);
        done.status = MatchStatus::Completed;
        done.score_t1 = 13;
        done.score_t2 = 3;
        let matches = vec![done, fixture(2, 2, 2, 3), fixture(3, 3, 1, 3)];

        let cfg = StandingsConfig::default();
        let standings = compute_standings(&teams, &matches, &[], &cfg).unwrap();
        let (standings, races) = annotate_elimination_and_races(standings, &matches, &cfg);

        // Fewer than six teams: cutoff 0, nobody eliminated, nobody ranked outside the top six
        assert!(races.is_empty());
        let rows = &standings["OMEGA"];
        assert!(rows.iter().all(|r| !r.eliminated));
        assert_eq!(rows[0].team, TeamId(1));
        assert_eq!(rows.iter().map(|r| r.remaining).sum::<u32>(), 4);
    }
}
