//! Wire models for the HTTP boundary.
//! Defines the request and response bodies exchanged with the API layer
//! and their conversion into core listing records.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::MatchError;
use crate::listing::{Listing, ListingId, ListingSide, ListingStatus, OwnerId, RegionCode};
use crate::matching::MatchResult;

/// Submission of a new cargo or vehicle listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewListingRequest {
    /// Client-chosen ID; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub side: ListingSide,
    pub origin_region: String,
    /// Required for cargo, optional for vehicles offering general availability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_region: Option<String>,
    /// First day of the window (YYYY-MM-DD), inclusive
    pub earliest_date: Date,
    /// Last day of the window (YYYY-MM-DD), inclusive
    pub latest_date: Date,
    /// Vehicle category such as "2t", "4t", "trailer" or "refrigerated"
    pub vehicle_type: String,
    pub owner_id: String,
}

impl NewListingRequest {
    /// Normalizes the submission into an Active listing.
    ///
    /// Region codes and the vehicle type are parsed here; the store checks
    /// the remaining record invariants on insert.
    pub fn into_listing(self) -> Result<Listing, MatchError> {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => ListingId::new(id.trim()),
            Some(_) => return Err(MatchError::Validation("listing id must not be blank".to_string())),
            None => ListingId::generate(),
        };
        let destination_region = self
            .destination_region
            .as_deref()
            .map(RegionCode::parse)
            .transpose()?;

        Ok(Listing::new(
            id,
            self.side,
            RegionCode::parse(&self.origin_region)?,
            destination_region,
            self.earliest_date,
            self.latest_date,
            self.vehicle_type.parse()?,
            OwnerId::new(self.owner_id.trim()),
        ))
    }
}

/// Requested status change for a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ListingStatus,
}

/// Query string of the match search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchesQuery {
    /// Maximum number of results; the configured default when absent
    pub limit: Option<i64>,
}

impl MatchesQuery {
    /// Converts the raw limit, rejecting zero and negative values.
    pub fn limit(&self) -> Result<Option<usize>, MatchError> {
        match self.limit {
            None => Ok(None),
            Some(n) if n <= 0 => Err(MatchError::Validation(format!(
                "limit must be positive, got {}",
                n
            ))),
            Some(n) => usize::try_from(n)
                .map(Some)
                .map_err(|_| MatchError::Validation(format!("limit {} is too large", n))),
        }
    }
}

/// Ranked matches for one listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub query_listing_id: ListingId,
    pub results: Vec<MatchResult>,
}

/// Request to finalize a pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmMatchRequest {
    pub query_id: ListingId,
    pub candidate_id: ListingId,
}

/// Both listings after a confirmed match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmMatchResponse {
    pub query: Listing,
    pub candidate: Listing,
}

/// Counters describing the listing board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardStats {
    pub total_listings: usize,
    pub active_cargo: usize,
    pub active_vehicles: usize,
    /// Confirmed pairs since start
    pub matches_count: u64,
    pub expired_count: u64,
    pub withdrawn_count: u64,
}

/// Health check payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub board: BoardStats,
}
