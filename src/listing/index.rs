use std::collections::{HashMap, HashSet};

use crate::listing::types::{Listing, ListingId, ListingSide, VehicleType};

/// Primary index dimensions: side, origin prefecture and vehicle type.
///
/// Date windows are deliberately not indexed; they are checked when scoring.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct BucketKey {
    side: ListingSide,
    prefecture: String,
    vehicle_type: VehicleType,
}

impl BucketKey {
    fn for_listing(listing: &Listing) -> Self {
        Self {
            side: listing.side,
            prefecture: listing.origin_region.prefecture().to_string(),
            vehicle_type: listing.vehicle_type,
        }
    }
}

/// In-memory index of Active listings used for candidate retrieval.
///
/// The index holds no lock of its own. `ListingStore` keeps it behind the
/// same lock as the listing records so both always change together.
#[derive(Debug, Default)]
pub struct CandidateIndex {
    buckets: HashMap<BucketKey, HashSet<ListingId>>,
    /// Reverse lookup used by `remove`
    locations: HashMap<ListingId, BucketKey>,
    allow_larger_vehicles: bool,
}

impl CandidateIndex {
    pub fn new(allow_larger_vehicles: bool) -> Self {
        Self {
            buckets: HashMap::new(),
            locations: HashMap::new(),
            allow_larger_vehicles,
        }
    }

    /// Adds a listing to the bucket for its side, origin prefecture and vehicle type.
    /// Re-adding an indexed id moves it to its current bucket.
    pub fn add(&mut self, listing: &Listing) {
        self.remove(&listing.id);
        let key = BucketKey::for_listing(listing);
        self.buckets
            .entry(key.clone())
            .or_default()
            .insert(listing.id.clone());
        self.locations.insert(listing.id.clone(), key);
    }

    /// Removes a listing from its bucket. Removing an absent id is a no-op.
    ///
    /// Returns whether anything was removed.
    pub fn remove(&mut self, listing_id: &ListingId) -> bool {
        let Some(key) = self.locations.remove(listing_id) else {
            return false;
        };
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.remove(listing_id);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
        true
    }

    /// Opposite-side listing ids that could pair with `query`.
    ///
    /// Buckets scanned:
    /// - vehicle types compatible with the query's type
    /// - origin prefecture equal to the query's origin or destination prefecture,
    ///   or every prefecture when the query has no destination
    ///
    /// The sequence is lazy and recomputed on every call.
    pub fn candidates_for<'a>(&'a self, query: &Listing) -> impl Iterator<Item = &'a ListingId> + 'a {
        let side = query.side.opposite();
        let types = self.compatible_types(query);

        let keys: Vec<BucketKey> = match &query.destination_region {
            Some(destination) => {
                let mut prefectures = vec![query.origin_region.prefecture().to_string()];
                if destination.prefecture() != query.origin_region.prefecture() {
                    prefectures.push(destination.prefecture().to_string());
                }
                types
                    .iter()
                    .flat_map(|vehicle_type| {
                        prefectures.iter().map(move |prefecture| BucketKey {
                            side,
                            prefecture: prefecture.clone(),
                            vehicle_type: *vehicle_type,
                        })
                    })
                    .collect()
            }
            None => self
                .buckets
                .keys()
                .filter(|key| key.side == side && types.contains(&key.vehicle_type))
                .cloned()
                .collect(),
        };

        keys.into_iter()
            .filter_map(move |key| self.buckets.get(&key))
            .flatten()
    }

    /// Vehicle types on the opposite side that can pair with the query's type.
    fn compatible_types(&self, query: &Listing) -> Vec<VehicleType> {
        VehicleType::ALL
            .into_iter()
            .filter(|other| {
                if *other == query.vehicle_type {
                    return true;
                }
                if !self.allow_larger_vehicles {
                    return false;
                }
                match query.side {
                    // Cargo may ride on any larger vehicle
                    ListingSide::Cargo => other.is_larger_than(query.vehicle_type),
                    // A vehicle may take any smaller cargo
                    ListingSide::Vehicle => query.vehicle_type.is_larger_than(*other),
                }
            })
            .collect()
    }

    pub fn contains(&self, listing_id: &ListingId) -> bool {
        self.locations.contains_key(listing_id)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
