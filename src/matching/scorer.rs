use serde::{Deserialize, Serialize};
use time::Date;

use crate::config::MatchingConfig;
use crate::listing::{Listing, ListingSide, RegionCode, VehicleType};

/// Named score components, each in [0.0, 1.0] before weighting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub route_overlap: f64,
    pub date_overlap: f64,
    pub vehicle_type: f64,
}

/// Weighted total together with the components it was computed from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Score {
    pub total: f64,
    pub breakdown: ScoreBreakdown,
}

/// Compatibility scoring between a query listing and one candidate.
///
/// Returns `None` when the pair can never match (same side, incompatible
/// vehicles, or a rule such as required date overlap rejects it). Otherwise
/// the total lies in [0.0, 1.0]. Thresholding is left to the caller.
pub trait MatchScorer: Send + Sync {
    fn score(&self, query: &Listing, candidate: &Listing) -> Option<Score>;
}

/// Relative importance of each component. Must sum to 1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreWeights {
    pub route: f64,
    pub date: f64,
    pub vehicle: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            route: 0.4,
            date: 0.3,
            vehicle: 0.3,
        }
    }
}

/// Deterministic, explainable weighted scorer.
#[derive(Clone, Debug)]
pub struct WeightedScorer {
    weights: ScoreWeights,
    partial_route_score: f64,
    larger_vehicle_score: f64,
    allow_larger_vehicles: bool,
    require_date_overlap: bool,
}

impl WeightedScorer {
    pub fn from_config(config: &MatchingConfig) -> Self {
        Self {
            weights: ScoreWeights {
                route: config.route_weight,
                date: config.date_weight,
                vehicle: config.vehicle_weight,
            },
            partial_route_score: config.partial_route_score,
            larger_vehicle_score: config.larger_vehicle_score,
            allow_larger_vehicles: config.allow_larger_vehicles,
            require_date_overlap: config.require_date_overlap,
        }
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    /// Combines components into a total clamped to [0.0, 1.0].
    pub fn combine(&self, breakdown: &ScoreBreakdown) -> f64 {
        let total = self.weights.route * breakdown.route_overlap
            + self.weights.date * breakdown.date_overlap
            + self.weights.vehicle * breakdown.vehicle_type;
        total.clamp(0.0, 1.0)
    }
}

impl Default for WeightedScorer {
    fn default() -> Self {
        Self::from_config(&MatchingConfig::default())
    }
}

impl MatchScorer for WeightedScorer {
    fn score(&self, query: &Listing, candidate: &Listing) -> Option<Score> {
        if query.side == candidate.side {
            return None;
        }

        let (cargo, vehicle) = match query.side {
            ListingSide::Cargo => (query, candidate),
            ListingSide::Vehicle => (candidate, query),
        };
        let vehicle_type = vehicle_type_score(
            cargo.vehicle_type,
            vehicle.vehicle_type,
            self.allow_larger_vehicles,
            self.larger_vehicle_score,
        )?;

        let date_overlap = date_overlap(
            (query.earliest_date, query.latest_date),
            (candidate.earliest_date, candidate.latest_date),
        );
        if self.require_date_overlap && date_overlap <= 0.0 {
            log::debug!(
                "Dropping {} for {}: date windows do not intersect",
                candidate.id,
                query.id
            );
            return None;
        }

        let breakdown = ScoreBreakdown {
            route_overlap: route_overlap(query, candidate, self.partial_route_score),
            date_overlap,
            vehicle_type,
        };
        let total = self.combine(&breakdown);
        log::debug!(
            "Scored {} against {}: {:.3} (route {:.2}, date {:.2}, vehicle {:.2})",
            candidate.id,
            query.id,
            total,
            breakdown.route_overlap,
            breakdown.date_overlap,
            breakdown.vehicle_type
        );
        Some(Score { total, breakdown })
    }
}

/// 1.0 when both ends match, `partial` when exactly one does, 0.0 otherwise.
///
/// A missing destination on either side matches any destination.
pub fn route_overlap(query: &Listing, candidate: &Listing, partial: f64) -> f64 {
    let origin = query.origin_region.matches(&candidate.origin_region);
    let destination = destinations_match(
        query.destination_region.as_ref(),
        candidate.destination_region.as_ref(),
    );
    match (origin, destination) {
        (true, true) => 1.0,
        (true, false) | (false, true) => partial,
        (false, false) => 0.0,
    }
}

fn destinations_match(a: Option<&RegionCode>, b: Option<&RegionCode>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.matches(b),
        _ => true,
    }
}

/// Overlapping days divided by the length of the shorter window, both inclusive.
pub fn date_overlap(a: (Date, Date), b: (Date, Date)) -> f64 {
    let start = a.0.max(b.0);
    let end = a.1.min(b.1);
    if start > end {
        return 0.0;
    }
    let overlap = (end - start).whole_days() + 1;
    let len_a = (a.1 - a.0).whole_days() + 1;
    let len_b = (b.1 - b.0).whole_days() + 1;
    let shorter = len_a.min(len_b);
    if shorter <= 0 {
        return 0.0;
    }
    (overlap as f64 / shorter as f64).min(1.0)
}

/// Exact type 1.0, a larger vehicle `larger_score` when allowed, otherwise incompatible.
pub fn vehicle_type_score(
    cargo: VehicleType,
    vehicle: VehicleType,
    allow_larger: bool,
    larger_score: f64,
) -> Option<f64> {
    if cargo == vehicle {
        Some(1.0)
    } else if allow_larger && vehicle.is_larger_than(cargo) {
        Some(larger_score)
    } else {
        None
    }
}
