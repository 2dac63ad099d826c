//! Team-level statistics from the match history

use crate::data::LeagueSnapshot;
use crate::{Match, TeamId};

/// Map label meaning "no particular map"
pub const ANY_MAP: &str = "Any";

/// Win/score totals for a team over completed matches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamRecord {
    pub matches: usize,
    pub wins: usize,
    /// Sum of the team's own match-level scores
    pub score_total: u32,
}

impl TeamRecord {
    /// Update the record with a completed match
    pub fn update(&mut self, record: &Match, team: TeamId) {
        let Some(score) = record.score_for(team) else {
            return;
        };
        self.matches += 1;
        self.score_total += score;
        if record.did_win(team) == Some(true) {
            self.wins += 1;
        }
    }

    /// Win ratio, 0 with no matches
    pub fn win_rate(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.wins as f64 / self.matches as f64
        }
    }

    /// Average own score per match, 0 with no matches
    pub fn avg_score(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.score_total as f64 / self.matches as f64
        }
    }
}

/// Record over every completed match the team played
pub fn team_record(snapshot: &LeagueSnapshot, team: TeamId) -> TeamRecord {
    let mut record = TeamRecord::default();
    for m in snapshot.completed_matches().filter(|m| m.involves(team)) {
        record.update(m, team);
    }
    record
}

/// Win rate over the team's most recent completed regular matches.
///
/// Matches are ordered by week, then id, newest first. Returns `neutral`
/// when the team has no such matches.
pub fn recent_form(snapshot: &LeagueSnapshot, team: TeamId, window: usize, neutral: f64) -> f64 {
    let mut recent: Vec<&Match> = snapshot
        .completed_matches()
        .filter(|m| m.is_regular() && m.involves(team))
        .collect();
    recent.sort_by(|a, b| b.week.cmp(&a.week).then(b.id.cmp(&a.id)));
    recent.truncate(window);

    if recent.is_empty() {
        return neutral;
    }
    let wins = recent
        .iter()
        .filter(|m| m.did_win(team) == Some(true))
        .count();
    wins as f64 / recent.len() as f64
}

/// Wins of `a` over `b` and of `b` over `a` in completed matches between them
pub fn head_to_head(snapshot: &LeagueSnapshot, a: TeamId, b: TeamId) -> (u32, u32) {
    snapshot
        .completed_matches()
        .filter(|m| m.is_between(a, b))
        .fold((0, 0), |(wins_a, wins_b), m| match m.decided_winner() {
            Some(w) if w == a => (wins_a + 1, wins_b),
            Some(w) if w == b => (wins_a, wins_b + 1),
            _ => (wins_a, wins_b),
        })
}

/// Whether a map label names an actual map
pub fn is_named_map(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.eq_ignore_ascii_case(ANY_MAP)
}

/// Share of maps with this name the team won in completed matches, `None`
/// when it never played the map
pub fn map_win_rate(snapshot: &LeagueSnapshot, team: TeamId, map_name: &str) -> Option<f64> {
    let map_name = map_name.trim();
    let mut played = 0usize;
    let mut won = 0usize;

    for m in snapshot.completed_matches().filter(|m| m.involves(team)) {
        for map in snapshot
            .maps_for(m.id)
            .into_iter()
            .filter(|map| map.map_name.trim().eq_ignore_ascii_case(map_name))
        {
            played += 1;
            if map.winner == Some(team) {
                won += 1;
            }
        }
    }

    if played == 0 {
        None
    } else {
        Some(won as f64 / played as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatchId, MatchMap, MatchStatus, MatchType, SeriesFormat};

    fn completed(id: i64, week: u32, t1: i64, t2: i64, s1: u32, s2: u32) -> Match {
        Match {
            id: MatchId(id),
            week,
            group: None,
            team1: TeamId(t1),
            team2: TeamId(t2),
            match_type: MatchType::Regular,
            status: MatchStatus::Completed,
            score_t1: s1,
            score_t2: s2,
            winner: None,
            format: Some(SeriesFormat::Bo1),
            maps_played: 1,
            is_forfeit: false,
        }
    }

    fn map(match_id: i64, name: &str, winner: i64) -> MatchMap {
        MatchMap {
            match_id: MatchId(match_id),
            map_index: 0,
            map_name: name.to_string(),
            team1_rounds: 13,
            team2_rounds: 7,
            winner: Some(TeamId(winner)),
            is_forfeit: false,
        }
    }

    fn history() -> LeagueSnapshot {
        LeagueSnapshot {
            matches: vec![
                completed(1, 1, 1, 2, 13, 5),
                completed(2, 2, 3, 1, 13, 9),
                completed(3, 3, 1, 4, 13, 11),
                completed(4, 4, 2, 1, 13, 2),
                completed(5, 4, 1, 3, 13, 6),
            ],
            maps: vec![map(1, "Bind", 1), map(2, "Bind", 3), map(3, "Ascent", 1)],
            ..Default::default()
        }
    }

    #[test]
    fn test_recent_form_uses_latest_window() {
        let snapshot = history();
        // Newest three for team 1: match 5 (win), match 4 (loss), match 3 (win)
        let form = recent_form(&snapshot, TeamId(1), 3, 0.5);
        assert!((form - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(recent_form(&snapshot, TeamId(9), 3, 0.5), 0.5);
    }

    #[test]
    fn test_recent_form_skips_playoffs_and_scheduled() {
        let mut snapshot = history();
        let mut playoff = completed(6, 5, 1, 2, 0, 13);
        playoff.match_type = MatchType::Playoff;
        let mut upcoming = completed(7, 6, 1, 2, 0, 0);
        upcoming.status = MatchStatus::Scheduled;
        snapshot.matches.push(playoff);
        snapshot.matches.push(upcoming);
        let form = recent_form(&snapshot, TeamId(1), 3, 0.5);
        assert!((form - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_head_to_head_counts_both_directions() {
        let snapshot = history();
        assert_eq!(head_to_head(&snapshot, TeamId(1), TeamId(2)), (1, 1));
        assert_eq!(head_to_head(&snapshot, TeamId(1), TeamId(3)), (1, 1));
        assert_eq!(head_to_head(&snapshot, TeamId(2), TeamId(4)), (0, 0));
    }

    #[test]
    fn test_map_win_rate() {
        let snapshot = history();
        assert_eq!(map_win_rate(&snapshot, TeamId(1), "bind"), Some(0.5));
        assert_eq!(map_win_rate(&snapshot, TeamId(1), "Ascent"), Some(1.0));
        assert_eq!(map_win_rate(&snapshot, TeamId(2), "Ascent"), None);
        assert!(!is_named_map("any"));
        assert!(is_named_map("Split"));
    }

    #[test]
    fn test_team_record() {
        let record = team_record(&history(), TeamId(1));
        assert_eq!(record.matches, 5);
        assert_eq!(record.wins, 3);
        assert_eq!(record.score_total, 13 + 9 + 13 + 2 + 13);
        assert_eq!(team_record(&history(), TeamId(9)).win_rate(), 0.0);
    }
}
