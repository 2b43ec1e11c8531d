use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::error::MatchError;

/// Unique, immutable listing identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier for listings submitted without one
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the company that posted a listing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hierarchical location code such as `tokyo` or `tokyo/shinjuku`.
///
/// The first segment is the prefecture and is what the candidate index
/// buckets on. Finer segments narrow the area.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionCode(String);

impl RegionCode {
    pub fn parse(raw: &str) -> Result<Self, MatchError> {
        let code = raw.trim().to_lowercase();
        if code.is_empty() {
            return Err(MatchError::Validation("region code must not be empty".to_string()));
        }
        if code.split('/').any(|segment| segment.trim().is_empty()) {
            return Err(MatchError::Validation(format!(
                "region code '{}' has an empty segment",
                raw
            )));
        }
        Ok(Self(code))
    }

    /// Prefecture-level segment
    pub fn prefecture(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }

    /// True when `self` is `other` or one of its ancestors.
    pub fn contains(&self, other: &RegionCode) -> bool {
        other.0 == self.0
            || (other.0.len() > self.0.len()
                && other.0.starts_with(&self.0)
                && other.0.as_bytes()[self.0.len()] == b'/')
    }

    /// Two regions match when either one contains the other.
    pub fn matches(&self, other: &RegionCode) -> bool {
        self.contains(other) || other.contains(self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RegionCode {
    type Error = MatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RegionCode::parse(&value)
    }
}

impl From<RegionCode> for String {
    fn from(code: RegionCode) -> Self {
        code.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the marketplace a listing belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingSide {
    /// A shipper's load needing transport
    Cargo,
    /// A carrier's available vehicle
    Vehicle,
}

impl ListingSide {
    pub fn opposite(self) -> Self {
        match self {
            ListingSide::Cargo => ListingSide::Vehicle,
            ListingSide::Vehicle => ListingSide::Cargo,
        }
    }
}

/// Lifecycle state of a listing. Only `Active` is non-terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Matched,
    Expired,
    Withdrawn,
}

impl ListingStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ListingStatus::Active)
    }

    /// Allowed transitions are Active -> {Matched, Expired, Withdrawn}.
    pub fn can_transition_to(self, next: ListingStatus) -> bool {
        self == ListingStatus::Active && next.is_terminal()
    }
}

impl FromStr for ListingStatus {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ListingStatus::Active),
            "matched" => Ok(ListingStatus::Matched),
            "expired" => Ok(ListingStatus::Expired),
            "withdrawn" => Ok(ListingStatus::Withdrawn),
            other => Err(MatchError::Validation(format!("unknown status '{}'", other))),
        }
    }
}

/// Vehicle category shared by cargo requirements and vehicle offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VehicleType {
    /// 軽トラック
    Light,
    TwoTon,
    FourTon,
    TenTon,
    Trailer,
    /// 冷凍車, only interchangeable with itself
    Refrigerated,
}

impl VehicleType {
    pub const ALL: [VehicleType; 6] = [
        VehicleType::Light,
        VehicleType::TwoTon,
        VehicleType::FourTon,
        VehicleType::TenTon,
        VehicleType::Trailer,
        VehicleType::Refrigerated,
    ];

    /// Position on the capacity scale, None for special-purpose vehicles.
    fn capacity_rank(self) -> Option<u8> {
        match self {
            VehicleType::Light => Some(0),
            VehicleType::TwoTon => Some(1),
            VehicleType::FourTon => Some(2),
            VehicleType::TenTon => Some(3),
            VehicleType::Trailer => Some(4),
            VehicleType::Refrigerated => None,
        }
    }

    /// Whether a vehicle of this type has strictly more capacity than `cargo` requires.
    pub fn is_larger_than(self, cargo: VehicleType) -> bool {
        match (self.capacity_rank(), cargo.capacity_rank()) {
            (Some(vehicle), Some(cargo)) => vehicle > cargo,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Light => "light",
            VehicleType::TwoTon => "2t",
            VehicleType::FourTon => "4t",
            VehicleType::TenTon => "10t",
            VehicleType::Trailer => "trailer",
            VehicleType::Refrigerated => "refrigerated",
        }
    }
}

impl FromStr for VehicleType {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" | "軽" | "軽トラック" => Ok(VehicleType::Light),
            "2t" => Ok(VehicleType::TwoTon),
            "4t" => Ok(VehicleType::FourTon),
            "10t" => Ok(VehicleType::TenTon),
            "trailer" | "トレーラー" => Ok(VehicleType::Trailer),
            "refrigerated" | "冷凍" | "冷凍車" => Ok(VehicleType::Refrigerated),
            other => Err(MatchError::Validation(format!(
                "unrecognized vehicle type '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for VehicleType {
    type Error = MatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VehicleType> for String {
    fn from(vehicle: VehicleType) -> Self {
        vehicle.as_str().to_string()
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cargo-shipment request or an available-vehicle offer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub side: ListingSide,
    pub origin_region: RegionCode,
    /// Absent only for vehicles offering general availability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_region: Option<RegionCode>,
    /// First day of the window, inclusive
    pub earliest_date: Date,
    /// Last day of the window, inclusive
    pub latest_date: Date,
    pub vehicle_type: VehicleType,
    pub owner_id: OwnerId,
    pub status: ListingStatus,
    pub created_at: OffsetDateTime,
    /// Counterpart listing once a match has been confirmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_with: Option<ListingId>,
}

impl Listing {
    /// Creates an Active listing stamped with the current time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ListingId,
        side: ListingSide,
        origin_region: RegionCode,
        destination_region: Option<RegionCode>,
        earliest_date: Date,
        latest_date: Date,
        vehicle_type: VehicleType,
        owner_id: OwnerId,
    ) -> Self {
        Self {
            id,
            side,
            origin_region,
            destination_region,
            earliest_date,
            latest_date,
            vehicle_type,
            owner_id,
            status: ListingStatus::Active,
            created_at: OffsetDateTime::now_utc(),
            matched_with: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ListingStatus::Active
    }

    /// Number of days in the window, both ends included.
    pub fn window_days(&self) -> i64 {
        (self.latest_date - self.earliest_date).whole_days() + 1
    }

    /// Checks the record-level invariants enforced on insert.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.id.as_str().trim().is_empty() {
            return Err(MatchError::Validation("listing id must not be empty".to_string()));
        }
        if self.owner_id.0.trim().is_empty() {
            return Err(MatchError::Validation("owner id must not be empty".to_string()));
        }
        if self.earliest_date > self.latest_date {
            return Err(MatchError::Validation(format!(
                "earliest date {} is after latest date {}",
                self.earliest_date, self.latest_date
            )));
        }
        if self.side == ListingSide::Cargo && self.destination_region.is_none() {
            return Err(MatchError::Validation(
                "cargo listings require a destination region".to_string(),
            ));
        }
        if self.status != ListingStatus::Active {
            return Err(MatchError::Validation(format!(
                "new listings must be active, got {:?}",
                self.status
            )));
        }
        Ok(())
    }
}

/// Status-change notification published by the listing store.
#[derive(Clone, Debug)]
pub struct ListingEvent {
    /// Listing as it was right after the change
    pub listing: Listing,
    pub event_type: ListingEventType,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ListingEventType {
    Added,
    /// Counterpart listing; None for a manual status change with no confirmed pair
    Matched(Option<ListingId>),
    Expired,
    Withdrawn,
}
