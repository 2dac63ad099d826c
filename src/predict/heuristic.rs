//! Rule-based win probability used when no classifier is available

use crate::data::LeagueSnapshot;
use crate::features::{head_to_head, team_record};
use crate::{HeuristicWeights, TeamId};

/// Weighted strength of `team` against `opponent`
pub fn heuristic_score(
    snapshot: &LeagueSnapshot,
    team: TeamId,
    opponent: TeamId,
    weights: &HeuristicWeights,
) -> f64 {
    let record = team_record(snapshot, team);
    let (h2h_wins, _) = head_to_head(snapshot, team, opponent);

    record.win_rate() * weights.win_rate
        + record.avg_score() * weights.avg_score
        + h2h_wins as f64 * weights.head_to_head
}

/// Probability that `a` beats `b`: its share of the combined score, or 0.5
/// when neither side scores
pub fn heuristic_probability(
    snapshot: &LeagueSnapshot,
    a: TeamId,
    b: TeamId,
    weights: &HeuristicWeights,
) -> f64 {
    let score_a = heuristic_score(snapshot, a, b, weights);
    let score_b = heuristic_score(snapshot, b, a, weights);
    let total = score_a + score_b;

    if total <= 0.0 {
        0.5
    } else {
        (score_a / total).clamp(0.0, 1.0)
    }
}
