//! Matchup feature vector for the win classifier

use serde::{Deserialize, Serialize};

use super::player_impact::average_acs;
use super::team_form::{head_to_head, is_named_map, map_win_rate, recent_form};
use crate::data::LeagueSnapshot;
use crate::{PlayerId, PredictorConfig, TeamId};

/// Optional roster and map context for a matchup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchupOverrides {
    /// Players expected to play for team A; empty means the team's own history
    #[serde(default)]
    pub team_a_players: Vec<PlayerId>,
    #[serde(default)]
    pub team_b_players: Vec<PlayerId>,
    /// Maps to compare the teams on
    #[serde(default)]
    pub maps: Vec<String>,
}

impl MatchupOverrides {
    /// Only a map context, as used for training examples
    pub fn with_map(map_name: Option<&str>) -> Self {
        MatchupOverrides {
            maps: map_name.map(|m| vec![m.to_string()]).unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Same context seen from the other side
    pub fn swapped(&self) -> Self {
        MatchupOverrides {
            team_a_players: self.team_b_players.clone(),
            team_b_players: self.team_a_players.clone(),
            maps: self.maps.clone(),
        }
    }
}

/// Team A minus team B on each signal, plus the week
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchupFeatures {
    pub form_diff: f64,
    pub acs_diff: f64,
    pub h2h_diff: f64,
    pub week: f64,
    pub map_diff: f64,
}

impl MatchupFeatures {
    /// Dimension of feature vector
    pub const DIM: usize = 5;

    /// Flat vector in model input order
    pub fn to_vec(&self) -> Vec<f32> {
        vec![
            self.form_diff as f32,
            self.acs_diff as f32,
            self.h2h_diff as f32,
            self.week as f32,
            self.map_diff as f32,
        ]
    }
}

/// Week used when none is given: one past the latest week on record, or 1
pub fn default_week(snapshot: &LeagueSnapshot) -> u32 {
    snapshot.latest_week().map_or(1, |w| w + 1)
}

/// Extract matchup features for team A against team B
pub fn extract(
    snapshot: &LeagueSnapshot,
    a: TeamId,
    b: TeamId,
    week: Option<u32>,
    overrides: &MatchupOverrides,
    cfg: &PredictorConfig,
) -> MatchupFeatures {
    let form = |team| recent_form(snapshot, team, cfg.recent_form_window, cfg.neutral_win_rate);
    let form_diff = form(a) - form(b);

    let acs_a = average_acs(snapshot, a, &overrides.team_a_players, cfg.baseline_acs);
    let acs_b = average_acs(snapshot, b, &overrides.team_b_players, cfg.baseline_acs);

    let (wins_a, wins_b) = head_to_head(snapshot, a, b);

    let map_diffs: Vec<f64> = overrides
        .maps
        .iter()
        .filter(|m| is_named_map(m))
        .map(|m| {
            let rate = |team| map_win_rate(snapshot, team, m).unwrap_or(cfg.neutral_win_rate);
            rate(a) - rate(b)
        })
        .collect();
    let map_diff = if map_diffs.is_empty() {
        0.0
    } else {
        map_diffs.iter().sum::<f64>() / map_diffs.len() as f64
    };

    MatchupFeatures {
        form_diff,
        acs_diff: acs_a - acs_b,
        h2h_diff: wins_a as f64 - wins_b as f64,
        week: week.unwrap_or_else(|| default_week(snapshot)) as f64,
        map_diff,
    }
}
