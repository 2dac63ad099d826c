//! Standings engine
//!
//! Turns regular-season results into ranked group tables, then marks
//! eliminated teams and teams in a last-match playoff race.

pub mod elimination;
pub mod scoring;
pub mod table;

pub use elimination::{annotate_elimination_and_races, RaceCandidate};
pub use scoring::{award_points, is_played, resolve_score, MatchPoints, Outcome, ResolvedScore};
pub use table::{compute_standings, GroupStandings, StandingsRow};

use crate::data::LeagueSnapshot;
use crate::{Result, StandingsConfig};

/// Full standings for a snapshot: tables with elimination flags, plus race candidates
pub fn standings_for(
    snapshot: &LeagueSnapshot,
    cfg: &StandingsConfig,
) -> Result<(GroupStandings, Vec<RaceCandidate>)> {
    let standings = compute_standings(&snapshot.teams, &snapshot.matches, &snapshot.maps, cfg)?;
    Ok(annotate_elimination_and_races(
        standings,
        &snapshot.scheduled_regular(),
        cfg,
    ))
}
