//! Scoring and ranking of cargo/vehicle pairings.

mod engine;
mod scorer;

pub use engine::{MatchEngine, MatchResult};
pub use scorer::{
    date_overlap, route_overlap, vehicle_type_score, MatchScorer, Score, ScoreBreakdown, ScoreWeights,
    WeightedScorer,
};
