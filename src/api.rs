//! API endpoints for the matching service.
//! Thin JSON adapter over `MarketService`; all business rules live in the core.

use actix_web::{get, post, web, HttpResponse, Responder, ResponseError};

use crate::error::MatchError;
use crate::listing::ListingId;
use crate::models::{ConfirmMatchRequest, MatchesQuery, NewListingRequest, StatusUpdateRequest};
use crate::service::MarketService;

/// Registers every `/api` route on an app or scope.
///
/// Malformed query strings and JSON bodies are reported as `Validation`
/// errors so every 400 carries the same `{error, message}` body.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                MatchError::Validation(format!("invalid query string: {}", err)).into()
            }))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                MatchError::Validation(format!("invalid request body: {}", err)).into()
            }))
            .service(create_listing)
            .service(get_listing)
            .service(update_status)
            .service(find_matches)
            .service(confirm_match)
            .service(health),
    );
}

/// Submit a cargo or vehicle listing.
///
/// # Returns
/// - 201 Created with the stored listing
/// - 400 Bad Request if the date window, region or vehicle type is invalid
#[post("/listings")]
pub async fn create_listing(
    request: web::Json<NewListingRequest>,
    service: web::Data<MarketService>,
) -> impl Responder {
    match service.submit_listing(request.into_inner()) {
        Ok(listing) => HttpResponse::Created().json(listing),
        Err(e) => e.error_response(),
    }
}

#[get("/listings/{id}")]
pub async fn get_listing(path: web::Path<String>, service: web::Data<MarketService>) -> impl Responder {
    let id = ListingId::new(path.into_inner());
    match service.get_listing(&id) {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(e) => e.error_response(),
    }
}

/// Move a listing out of Active (withdraw, expire or mark matched).
///
/// # Returns
/// - 200 OK with the updated listing
/// - 404 Not Found for unknown listings
/// - 409 Conflict if the listing is already terminal
#[post("/listings/{id}/status")]
pub async fn update_status(
    path: web::Path<String>,
    request: web::Json<StatusUpdateRequest>,
    service: web::Data<MarketService>,
) -> impl Responder {
    let id = ListingId::new(path.into_inner());
    match service.update_status(&id, request.status) {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(e) => e.error_response(),
    }
}

/// Ranked opposite-side matches for a listing.
///
/// # Returns
/// - 200 OK with the ranked results (possibly empty)
/// - 400 Bad Request for a non-positive or oversized limit
/// - 404 Not Found for unknown listings
/// - 409 Conflict if the listing is no longer active
#[get("/listings/{id}/matches")]
pub async fn find_matches(
    path: web::Path<String>,
    query: web::Query<MatchesQuery>,
    service: web::Data<MarketService>,
) -> impl Responder {
    let id = ListingId::new(path.into_inner());
    match service.find_matches(&id, &query) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.error_response(),
    }
}

/// Confirm a pairing, moving both listings to Matched.
///
/// # Returns
/// - 200 OK with both updated listings
/// - 409 Conflict if either listing stopped being active
#[post("/matches/confirm")]
pub async fn confirm_match(
    request: web::Json<ConfirmMatchRequest>,
    service: web::Data<MarketService>,
) -> impl Responder {
    match service.confirm_match(&request) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.error_response(),
    }
}

/// Health check with board statistics
#[get("/health")]
pub async fn health(service: web::Data<MarketService>) -> impl Responder {
    HttpResponse::Ok().json(service.health_status())
}
