use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use time::Date;
use tokio::sync::broadcast;

use crate::config::MatchingConfig;
use crate::error::MatchError;
use crate::listing::index::CandidateIndex;
use crate::listing::types::*;

/// Records and index guarded together so every mutation updates both atomically.
#[derive(Debug)]
struct StoreState {
    listings: HashMap<ListingId, Listing>,
    index: CandidateIndex,
}

/// Read-only view of the store taken under a single read lock.
///
/// Everything observed through one snapshot is mutually consistent: a listing
/// seen in the index is Active in the record map.
#[derive(Clone, Copy)]
pub struct Snapshot<'a> {
    listings: &'a HashMap<ListingId, Listing>,
    index: &'a CandidateIndex,
}

impl<'a> Snapshot<'a> {
    pub fn get(&self, id: &ListingId) -> Option<&'a Listing> {
        self.listings.get(id)
    }

    /// Active opposite-side listings the index offers for `query`.
    pub fn candidates_for(&self, query: &Listing) -> impl Iterator<Item = &'a Listing> + 'a {
        let listings = self.listings;
        let index = self.index;
        index
            .candidates_for(query)
            .filter_map(move |id| listings.get(id))
            .filter(|listing| listing.is_active())
    }
}

/// Counts reported by health checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub total: usize,
    pub active_cargo: usize,
    pub active_vehicles: usize,
}

/// Authoritative in-memory holder of listing records.
///
/// Characteristics:
/// - Thread-safe using Arc<RwLock<..>> shared between clones
/// - Status-change notifications using tokio::sync::broadcast
/// - Candidate index maintained under the same lock as the records
#[derive(Clone)]
pub struct ListingStore {
    state: Arc<RwLock<StoreState>>,
    event_tx: broadcast::Sender<ListingEvent>,
    expiry_batch_size: usize,
}

impl ListingStore {
    pub fn new(config: &MatchingConfig) -> Self {
        // broadcast::channel panics on zero capacity
        let (tx, _) = broadcast::channel(config.event_buffer.max(1));
        log::info!(
            "Creating ListingStore (larger vehicles: {}, expiry batch: {})",
            config.allow_larger_vehicles,
            config.expiry_batch_size
        );
        Self {
            state: Arc::new(RwLock::new(StoreState {
                listings: HashMap::new(),
                index: CandidateIndex::new(config.allow_larger_vehicles),
            })),
            event_tx: tx,
            expiry_batch_size: config.expiry_batch_size.max(1),
        }
    }

    /// Validates and stores a new Active listing, then indexes it.
    pub fn insert(&self, listing: Listing) -> Result<Listing, MatchError> {
        listing.validate()?;

        {
            let mut state = self.state.write();
            if state.listings.contains_key(&listing.id) {
                return Err(MatchError::Validation(format!(
                    "listing {} already exists",
                    listing.id
                )));
            }
            state.index.add(&listing);
            state.listings.insert(listing.id.clone(), listing.clone());
        }

        log::info!(
            "Inserted {:?} listing {} ({} -> {}, {}, {}..={})",
            listing.side,
            listing.id,
            listing.origin_region,
            listing
                .destination_region
                .as_ref()
                .map(|r| r.as_str())
                .unwrap_or("*"),
            listing.vehicle_type,
            listing.earliest_date,
            listing.latest_date
        );
        self.publish(&listing, ListingEventType::Added);
        Ok(listing)
    }

    /// Moves a listing out of Active. Terminal listings cannot change again.
    pub fn update_status(&self, id: &ListingId, new_status: ListingStatus) -> Result<Listing, MatchError> {
        let updated = {
            let mut state = self.state.write();
            let listing = state
                .listings
                .get_mut(id)
                .ok_or_else(|| MatchError::NotFound(id.to_string()))?;

            if !listing.status.can_transition_to(new_status) {
                log::warn!(
                    "Rejected transition {:?} -> {:?} for listing {}",
                    listing.status,
                    new_status,
                    id
                );
                return Err(MatchError::InvalidTransition {
                    from: listing.status,
                    to: new_status,
                });
            }
            listing.status = new_status;
            let updated = listing.clone();
            state.index.remove(id);
            updated
        };

        log::info!("Listing {} is now {:?}", id, new_status);
        if let Some(event_type) = Self::event_for(&updated) {
            self.publish(&updated, event_type);
        }
        Ok(updated)
    }

    pub fn get(&self, id: &ListingId) -> Result<Listing, MatchError> {
        self.state
            .read()
            .listings
            .get(id)
            .cloned()
            .ok_or_else(|| MatchError::NotFound(id.to_string()))
    }

    /// Expires every Active listing whose window ended before `cutoff`.
    ///
    /// Due listings are found under a read lock, then transitioned in batches,
    /// each under its own short write lock so searches can interleave.
    pub fn expire_older_than(&self, cutoff: Date) -> usize {
        let due: Vec<ListingId> = {
            let state = self.state.read();
            state
                .listings
                .values()
                .filter(|l| l.is_active() && l.latest_date < cutoff)
                .map(|l| l.id.clone())
                .collect()
        };

        let mut expired = Vec::new();
        for batch in due.chunks(self.expiry_batch_size) {
            let mut state = self.state.write();
            for id in batch {
                let Some(listing) = state.listings.get_mut(id) else {
                    continue;
                };
                // Status may have changed since the scan
                if !listing.is_active() || listing.latest_date >= cutoff {
                    continue;
                }
                listing.status = ListingStatus::Expired;
                expired.push(listing.clone());
                state.index.remove(id);
            }
        }

        if !expired.is_empty() {
            log::info!("Expired {} listings with windows ending before {}", expired.len(), cutoff);
        }
        for listing in &expired {
            self.publish(listing, ListingEventType::Expired);
        }
        expired.len()
    }

    /// Transitions both listings to Matched in one critical section.
    ///
    /// Fails with `Conflict` if either is no longer Active, leaving both untouched.
    pub fn confirm_pair(&self, first: &ListingId, second: &ListingId) -> Result<(Listing, Listing), MatchError> {
        let (a, b) = {
            let mut state = self.state.write();
            for id in [first, second] {
                match state.listings.get(id) {
                    None => return Err(MatchError::NotFound(id.to_string())),
                    Some(listing) if !listing.is_active() => {
                        log::warn!(
                            "Confirm of {} and {} lost: {} is {:?}",
                            first,
                            second,
                            id,
                            listing.status
                        );
                        return Err(MatchError::Conflict(format!(
                            "listing {} is no longer active ({:?})",
                            id, listing.status
                        )));
                    }
                    Some(_) => {}
                }
            }

            let a = Self::mark_matched(&mut state, first, second)?;
            let b = Self::mark_matched(&mut state, second, first)?;
            (a, b)
        };

        log::info!("Confirmed match between {} and {}", first, second);
        self.publish(&a, ListingEventType::Matched(Some(second.clone())));
        self.publish(&b, ListingEventType::Matched(Some(first.clone())));
        Ok((a, b))
    }

    fn mark_matched(state: &mut StoreState, id: &ListingId, partner: &ListingId) -> Result<Listing, MatchError> {
        let listing = state
            .listings
            .get_mut(id)
            .ok_or_else(|| MatchError::Internal(format!("listing {} vanished during confirm", id)))?;
        listing.status = ListingStatus::Matched;
        listing.matched_with = Some(partner.clone());
        let updated = listing.clone();
        state.index.remove(id);
        Ok(updated)
    }

    /// Runs `f` against a consistent read-only view of records and index.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(Snapshot<'_>) -> R) -> R {
        let state = self.state.read();
        f(Snapshot {
            listings: &state.listings,
            index: &state.index,
        })
    }

    /// Subscribe to status-change events
    pub fn subscribe(&self) -> broadcast::Receiver<ListingEvent> {
        self.event_tx.subscribe()
    }

    pub fn counts(&self) -> StoreCounts {
        let state = self.state.read();
        let mut counts = StoreCounts {
            total: state.listings.len(),
            ..StoreCounts::default()
        };
        for listing in state.listings.values().filter(|l| l.is_active()) {
            match listing.side {
                ListingSide::Cargo => counts.active_cargo += 1,
                ListingSide::Vehicle => counts.active_vehicles += 1,
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.state.read().listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the candidate index currently holds `id`
    pub fn is_indexed(&self, id: &ListingId) -> bool {
        self.state.read().index.contains(id)
    }

    fn event_for(listing: &Listing) -> Option<ListingEventType> {
        match listing.status {
            ListingStatus::Active => None,
            ListingStatus::Matched => Some(ListingEventType::Matched(listing.matched_with.clone())),
            ListingStatus::Expired => Some(ListingEventType::Expired),
            ListingStatus::Withdrawn => Some(ListingEventType::Withdrawn),
        }
    }

    fn publish(&self, listing: &Listing, event_type: ListingEventType) {
        // No subscribers is not an error
        let _ = self.event_tx.send(ListingEvent {
            listing: listing.clone(),
            event_type,
        });
    }
}
