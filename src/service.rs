use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use time::{Date, OffsetDateTime};
use tokio::sync::broadcast;

use crate::config::MatchingConfig;
use crate::error::MatchError;
use crate::listing::{Listing, ListingEvent, ListingEventType, ListingId, ListingSide, ListingStatus, ListingStore};
use crate::matching::MatchEngine;
use crate::models::{
    BoardStats, ConfirmMatchRequest, ConfirmMatchResponse, HealthStatus, MatchesQuery, MatchesResponse,
    NewListingRequest,
};

#[derive(Clone)]
/// Service fronting the matching core.
/// Owns the listing store and match engine, runs the periodic expiry sweep
/// and keeps counters fed by store events.
pub struct MarketService {
    store: ListingStore,
    engine: MatchEngine,
    /// Configuration for matching and sweep behavior
    config: MatchingConfig,
    /// Service start time for calculating uptime
    start_time: Arc<Instant>,
    /// Confirmed pairs
    matches_count: Arc<AtomicU64>,
    expired_count: Arc<AtomicU64>,
    withdrawn_count: Arc<AtomicU64>,
}

impl MarketService {
    /// Builds the service and starts its background tasks.
    ///
    /// Fails with `Validation` for a configuration that `validate` rejects, so a
    /// zero sweep interval can never reach the background task.
    /// Must be called from within a Tokio runtime.
    pub fn new(config: Option<MatchingConfig>) -> Result<Self, MatchError> {
        let config = config.unwrap_or_default();
        config.validate().map_err(|e| {
            log::error!("Rejected matching configuration: {}", e);
            MatchError::Validation(e)
        })?;
        let store = ListingStore::new(&config);
        let engine = MatchEngine::new(store.clone(), &config);
        let service = Self {
            store,
            engine,
            config,
            start_time: Arc::new(Instant::now()),
            matches_count: Arc::new(AtomicU64::new(0)),
            expired_count: Arc::new(AtomicU64::new(0)),
            withdrawn_count: Arc::new(AtomicU64::new(0)),
        };

        service.start_expiry_task();
        service.start_metrics_collection();

        Ok(service)
    }

    /// Counts status events as they are published
    fn start_metrics_collection(&self) {
        let mut rx = self.store.subscribe();
        let matches_count = self.matches_count.clone();
        let expired_count = self.expired_count.clone();
        let withdrawn_count = self.withdrawn_count.clone();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ListingEvent { listing, event_type }) => match event_type {
                        // Both listings of a pair publish Matched; count the pair once
                        ListingEventType::Matched(Some(_)) if listing.side == ListingSide::Cargo => {
                            matches_count.fetch_add(1, Ordering::Relaxed);
                        }
                        ListingEventType::Expired => {
                            expired_count.fetch_add(1, Ordering::Relaxed);
                        }
                        ListingEventType::Withdrawn => {
                            withdrawn_count.fetch_add(1, Ordering::Relaxed);
                        }
                        _ => {}
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("Metrics collector lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Periodically expires listings whose window ended before today (UTC)
    fn start_expiry_task(&self) {
        let store = self.store.clone();
        let interval = std::time::Duration::from_millis(self.config.expiry_interval_ms);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);
            loop {
                interval.tick().await;
                let today = OffsetDateTime::now_utc().date();
                let expired = store.expire_older_than(today);
                if expired > 0 {
                    log::info!("Expiry sweep expired {} listings", expired);
                }
            }
        });
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    /// Normalizes and stores a submitted listing.
    pub fn submit_listing(&self, request: NewListingRequest) -> Result<Listing, MatchError> {
        let listing = request.into_listing()?;
        self.store.insert(listing)
    }

    pub fn get_listing(&self, id: &ListingId) -> Result<Listing, MatchError> {
        self.store.get(id)
    }

    pub fn update_status(&self, id: &ListingId, status: ListingStatus) -> Result<Listing, MatchError> {
        self.store.update_status(id, status)
    }

    pub fn find_matches(&self, id: &ListingId, query: &MatchesQuery) -> Result<MatchesResponse, MatchError> {
        let results = self.engine.find_matches(id, query.limit()?)?;
        Ok(MatchesResponse {
            query_listing_id: id.clone(),
            results,
        })
    }

    pub fn confirm_match(&self, request: &ConfirmMatchRequest) -> Result<ConfirmMatchResponse, MatchError> {
        let (query, candidate) = self
            .engine
            .confirm_match(&request.query_id, &request.candidate_id)?;
        Ok(ConfirmMatchResponse { query, candidate })
    }

    /// Runs an expiry pass immediately, outside the periodic schedule.
    pub fn expire_older_than(&self, cutoff: Date) -> usize {
        self.store.expire_older_than(cutoff)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListingEvent> {
        self.store.subscribe()
    }

    /// Get health status information for the service
    pub fn health_status(&self) -> HealthStatus {
        let counts = self.store.counts();
        HealthStatus {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            board: BoardStats {
                total_listings: counts.total,
                active_cargo: counts.active_cargo,
                active_vehicles: counts.active_vehicles,
                matches_count: self.matches_count.load(Ordering::Relaxed),
                expired_count: self.expired_count.load(Ordering::Relaxed),
                withdrawn_count: self.withdrawn_count.load(Ordering::Relaxed),
            },
        }
    }
}
