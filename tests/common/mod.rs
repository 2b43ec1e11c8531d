#![allow(dead_code)]

use time::{Date, Duration, OffsetDateTime};
use toramatch::listing::{Listing, ListingId, ListingSide, OwnerId, RegionCode, VehicleType};
use toramatch::models::NewListingRequest;

/// Day `n` of the test calendar; day 1 is thirty days from today (UTC),
/// so the background expiry sweep never touches fixtures.
pub fn day(n: i64) -> Date {
    OffsetDateTime::now_utc().date() + Duration::days(30 + n - 1)
}

pub fn region(code: &str) -> RegionCode {
    RegionCode::parse(code).unwrap()
}

/// Create a cargo listing between two regions over days `from..=to`
pub fn cargo(id: &str, owner: &str, origin: &str, destination: &str, from: i64, to: i64, vehicle: VehicleType) -> Listing {
    Listing::new(
        ListingId::new(id),
        ListingSide::Cargo,
        region(origin),
        Some(region(destination)),
        day(from),
        day(to),
        vehicle,
        OwnerId::new(owner),
    )
}

/// Create a vehicle listing; `destination` None means general availability
pub fn vehicle(id: &str, owner: &str, origin: &str, destination: Option<&str>, from: i64, to: i64, vehicle: VehicleType) -> Listing {
    Listing::new(
        ListingId::new(id),
        ListingSide::Vehicle,
        region(origin),
        destination.map(region),
        day(from),
        day(to),
        vehicle,
        OwnerId::new(owner),
    )
}

/// Pin `created_at` so ordering tests do not depend on clock resolution
pub fn created_at_offset(mut listing: Listing, seconds: i64) -> Listing {
    listing.created_at = OffsetDateTime::UNIX_EPOCH + Duration::days(20_000) + Duration::seconds(seconds);
    listing
}

/// Wire-level submission matching `cargo`
pub fn cargo_request(id: &str, owner: &str, origin: &str, destination: &str, from: i64, to: i64, vehicle: &str) -> NewListingRequest {
    NewListingRequest {
        id: Some(id.to_string()),
        side: ListingSide::Cargo,
        origin_region: origin.to_string(),
        destination_region: Some(destination.to_string()),
        earliest_date: day(from),
        latest_date: day(to),
        vehicle_type: vehicle.to_string(),
        owner_id: owner.to_string(),
    }
}

/// Wire-level submission matching `vehicle`
pub fn vehicle_request(id: &str, owner: &str, origin: &str, from: i64, to: i64, vehicle: &str) -> NewListingRequest {
    NewListingRequest {
        id: Some(id.to_string()),
        side: ListingSide::Vehicle,
        origin_region: origin.to_string(),
        destination_region: None,
        earliest_date: day(from),
        latest_date: day(to),
        vehicle_type: vehicle.to_string(),
        owner_id: owner.to_string(),
    }
}

pub fn id(raw: &str) -> ListingId {
    ListingId::new(raw)
}
