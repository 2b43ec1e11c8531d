use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::MatchingConfig;
use crate::error::MatchError;
use crate::listing::{Listing, ListingId, ListingStore};
use crate::matching::scorer::{MatchScorer, ScoreBreakdown, WeightedScorer};

/// One ranked pairing. Ephemeral: the engine never stores these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub query_listing_id: ListingId,
    pub candidate_listing_id: ListingId,
    /// Normalized to [0.0, 1.0]
    pub score: f64,
    pub score_breakdown: ScoreBreakdown,
}

/// Orchestrates candidate retrieval, scoring and the business rules around them.
#[derive(Clone)]
pub struct MatchEngine {
    store: ListingStore,
    scorer: Arc<dyn MatchScorer>,
    min_score: f64,
    default_limit: usize,
    max_limit: usize,
}

impl MatchEngine {
    /// Engine using the default weighted scorer built from `config`
    pub fn new(store: ListingStore, config: &MatchingConfig) -> Self {
        Self::with_scorer(store, config, Arc::new(WeightedScorer::from_config(config)))
    }

    /// Engine using a caller-supplied scoring strategy
    pub fn with_scorer(store: ListingStore, config: &MatchingConfig, scorer: Arc<dyn MatchScorer>) -> Self {
        Self {
            store,
            scorer,
            min_score: config.min_score,
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }

    pub fn store(&self) -> &ListingStore {
        &self.store
    }

    /// Ranked opposite-side matches for an Active listing.
    ///
    /// Read-only: no listing changes state. Candidates owned by the query's
    /// owner and candidates scoring below the threshold are never returned.
    /// Ordering is score descending, then `created_at` ascending.
    pub fn find_matches(&self, listing_id: &ListingId, limit: Option<usize>) -> Result<Vec<MatchResult>, MatchError> {
        let limit = self.resolve_limit(limit)?;

        let mut ranked = self.store.with_snapshot(|snapshot| -> Result<Vec<(MatchResult, OffsetDateTime)>, MatchError> {
            let query = snapshot
                .get(listing_id)
                .ok_or_else(|| MatchError::NotFound(listing_id.to_string()))?;
            if !query.is_active() {
                return Err(MatchError::InvalidState(format!(
                    "listing {} is {:?}, only active listings can be matched",
                    listing_id, query.status
                )));
            }

            let ranked: Vec<(MatchResult, OffsetDateTime)> = snapshot
                .candidates_for(query)
                .filter(|candidate| candidate.id != query.id)
                .filter(|candidate| candidate.owner_id != query.owner_id)
                .filter_map(|candidate| self.rank(query, candidate))
                .collect();
            Ok(ranked)
        })?;

        ranked.sort_by(|(a, a_created), (b, b_created)| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a_created.cmp(b_created))
                .then_with(|| a.candidate_listing_id.cmp(&b.candidate_listing_id))
        });
        ranked.truncate(limit);

        log::info!("Found {} matches for listing {}", ranked.len(), listing_id);
        Ok(ranked.into_iter().map(|(result, _)| result).collect())
    }

    fn rank(&self, query: &Listing, candidate: &Listing) -> Option<(MatchResult, OffsetDateTime)> {
        let score = self.scorer.score(query, candidate)?;
        if score.total.is_nan() || score.total < self.min_score {
            log::debug!(
                "Candidate {} below threshold for {}: {:.3} < {:.3}",
                candidate.id,
                query.id,
                score.total,
                self.min_score
            );
            return None;
        }
        Some((
            MatchResult {
                query_listing_id: query.id.clone(),
                candidate_listing_id: candidate.id.clone(),
                score: score.total,
                score_breakdown: score.breakdown,
            },
            candidate.created_at,
        ))
    }

    fn resolve_limit(&self, limit: Option<usize>) -> Result<usize, MatchError> {
        match limit {
            None => Ok(self.default_limit),
            Some(0) => Err(MatchError::Validation("limit must be positive".to_string())),
            Some(n) if n > self.max_limit => Err(MatchError::Validation(format!(
                "limit {} exceeds maximum of {}",
                n, self.max_limit
            ))),
            Some(n) => Ok(n),
        }
    }

    /// Confirms a pairing, moving both listings to Matched atomically.
    ///
    /// The pair must be one cargo and one vehicle listing from different owners.
    /// Fails with `Conflict` when either listing stopped being Active before commit.
    pub fn confirm_match(&self, query_id: &ListingId, candidate_id: &ListingId) -> Result<(Listing, Listing), MatchError> {
        if query_id == candidate_id {
            return Err(MatchError::Validation("a listing cannot match itself".to_string()));
        }

        // Side and owner are immutable, so checking them outside the commit is safe
        self.store.with_snapshot(|snapshot| -> Result<(), MatchError> {
            let query = snapshot
                .get(query_id)
                .ok_or_else(|| MatchError::NotFound(query_id.to_string()))?;
            let candidate = snapshot
                .get(candidate_id)
                .ok_or_else(|| MatchError::NotFound(candidate_id.to_string()))?;
            if query.side == candidate.side {
                return Err(MatchError::Validation(format!(
                    "listings {} and {} are both {:?}",
                    query_id, candidate_id, query.side
                )));
            }
            if query.owner_id == candidate.owner_id {
                return Err(MatchError::Validation(format!(
                    "listings {} and {} share owner {}",
                    query_id, candidate_id, query.owner_id
                )));
            }
            Ok(())
        })?;

        self.store.confirm_pair(query_id, candidate_id)
    }
}
