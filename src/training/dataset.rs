//! Training examples built from completed matches

use std::collections::HashMap;

use crate::data::LeagueSnapshot;
use crate::features::{extract, MatchupFeatures, MatchupOverrides};
use crate::{Match, MatchId, PredictorConfig};

/// One labelled matchup: team1 as A, team2 as B
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub match_id: MatchId,
    pub week: u32,
    pub features: MatchupFeatures,
    /// 1.0 if team1 won, else 0.0
    pub label: f32,
}

/// Name of the first map of a match, used as its map context
fn first_map_name(snapshot: &LeagueSnapshot, m: &Match) -> Option<String> {
    snapshot
        .maps_for(m.id)
        .into_iter()
        .find(|map| map.map_index == 0)
        .map(|map| map.map_name.clone())
}

/// Build one example per completed match with a decided winner, ordered by
/// week then id.
///
/// With `walk_forward` the features of a match only see matches from
/// earlier weeks; otherwise they see the whole snapshot.
pub fn build_examples(
    snapshot: &LeagueSnapshot,
    cfg: &PredictorConfig,
    walk_forward: bool,
) -> Vec<TrainingExample> {
    let mut completed: Vec<&Match> = snapshot.completed_matches().collect();
    completed.sort_by_key(|m| (m.week, m.id));

    let mut history_by_week: HashMap<u32, LeagueSnapshot> = HashMap::new();
    let mut examples = Vec::with_capacity(completed.len());

    for m in completed {
        let Some(winner) = m.decided_winner() else {
            log::debug!("Skipping {}: no decided winner", m.id);
            continue;
        };

        let overrides = MatchupOverrides::with_map(first_map_name(snapshot, m).as_deref());
        let history: &LeagueSnapshot = if walk_forward {
            history_by_week
                .entry(m.week)
                .or_insert_with(|| snapshot.before_week(m.week))
        } else {
            snapshot
        };

        let features = extract(history, m.team1, m.team2, Some(m.week), &overrides, cfg);
        examples.push(TrainingExample {
            match_id: m.id,
            week: m.week,
            features,
            label: if winner == m.team1 { 1.0 } else { 0.0 },
        });
    }

    examples
}
