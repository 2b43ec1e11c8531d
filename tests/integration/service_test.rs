use crate::common::*;
use tokio::time::{sleep, Duration};
use toramatch::listing::{ListingEventType, ListingStatus, VehicleType};
use toramatch::models::{ConfirmMatchRequest, MatchesQuery};
use toramatch::{MarketService, MatchError, MatchingConfig};

async fn wait_for<F: Fn(&MarketService) -> bool>(service: &MarketService, condition: F) -> bool {
    for _ in 0..50 {
        if condition(service) {
            return true;
        }
        sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_submit_search_confirm_flow() {
    let service = MarketService::new(None).unwrap();

    service
        .submit_listing(cargo_request("c1", "shipper", "tokyo", "osaka", 1, 5, "4t"))
        .unwrap();
    service
        .submit_listing(vehicle_request("v1", "carrier", "tokyo", 3, 7, "4t"))
        .unwrap();

    let response = service.find_matches(&id("c1"), &MatchesQuery::default()).unwrap();
    assert_eq!(response.query_listing_id, id("c1"));
    assert_eq!(response.results.len(), 1);
    assert!((response.results[0].score - 0.88).abs() < 1e-9);

    let confirmed = service
        .confirm_match(&ConfirmMatchRequest {
            query_id: id("c1"),
            candidate_id: id("v1"),
        })
        .unwrap();
    assert_eq!(confirmed.query.status, ListingStatus::Matched);
    assert_eq!(confirmed.candidate.status, ListingStatus::Matched);

    assert!(wait_for(&service, |s| s.health_status().board.matches_count == 1).await);
    let board = service.health_status().board;
    assert_eq!(board.total_listings, 2);
    assert_eq!(board.active_cargo, 0);
    assert_eq!(board.active_vehicles, 0);
}

#[tokio::test]
async fn test_submission_is_normalized() {
    let service = MarketService::new(None).unwrap();

    let listing = service
        .submit_listing(cargo_request("  c1 ", "shipper", "Tokyo/Shinjuku", "OSAKA", 1, 2, "冷凍車"))
        .unwrap();
    assert_eq!(listing.id, id("c1"));
    assert_eq!(listing.origin_region, region("tokyo/shinjuku"));
    assert_eq!(listing.vehicle_type, VehicleType::Refrigerated);
    assert_eq!(listing.status, ListingStatus::Active);

    let generated = service
        .submit_listing(toramatch::models::NewListingRequest {
            id: None,
            ..vehicle_request("ignored", "carrier", "osaka", 1, 2, "10t")
        })
        .unwrap();
    assert!(!generated.id.as_str().is_empty());
}

#[tokio::test]
async fn test_invalid_submissions_are_rejected() {
    let service = MarketService::new(None).unwrap();

    let reversed = service.submit_listing(cargo_request("c1", "shipper", "tokyo", "osaka", 5, 1, "4t"));
    assert!(matches!(reversed, Err(MatchError::Validation(_))));

    let unknown_type = service.submit_listing(cargo_request("c2", "shipper", "tokyo", "osaka", 1, 5, "hovercraft"));
    assert!(matches!(unknown_type, Err(MatchError::Validation(_))));

    let bad_region = service.submit_listing(cargo_request("c3", "shipper", "", "osaka", 1, 5, "4t"));
    assert!(matches!(bad_region, Err(MatchError::Validation(_))));

    service
        .submit_listing(cargo_request("c4", "shipper", "tokyo", "osaka", 1, 5, "4t"))
        .unwrap();
    let duplicate = service.submit_listing(cargo_request("c4", "shipper", "tokyo", "osaka", 1, 5, "4t"));
    assert!(matches!(duplicate, Err(MatchError::Validation(_))));

    assert_eq!(service.health_status().board.total_listings, 1);
}

#[tokio::test]
async fn test_limit_validation() {
    let service = MarketService::new(None).unwrap();
    service
        .submit_listing(cargo_request("c1", "shipper", "tokyo", "osaka", 1, 5, "4t"))
        .unwrap();

    for limit in [0, -3, 10_000] {
        let result = service.find_matches(&id("c1"), &MatchesQuery { limit: Some(limit) });
        assert!(matches!(result, Err(MatchError::Validation(_))), "limit {}", limit);
    }
    let empty = service.find_matches(&id("c1"), &MatchesQuery { limit: Some(5) }).unwrap();
    assert!(empty.results.is_empty());
}

#[tokio::test]
async fn test_withdraw_and_expire_are_counted() {
    let service = MarketService::new(None).unwrap();
    let mut rx = service.subscribe();

    service
        .submit_listing(cargo_request("c1", "shipper", "tokyo", "osaka", 1, 2, "4t"))
        .unwrap();
    service
        .submit_listing(vehicle_request("v1", "carrier", "tokyo", 1, 9, "4t"))
        .unwrap();

    service.update_status(&id("v1"), ListingStatus::Withdrawn).unwrap();
    assert_eq!(service.expire_older_than(day(3)), 1);
    assert_eq!(service.get_listing(&id("c1")).unwrap().status, ListingStatus::Expired);

    // Withdrawn listings are not swept again
    assert_eq!(service.expire_older_than(day(30)), 0);

    let mut kinds = Vec::new();
    for _ in 0..4 {
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("Timed out waiting for event")
            .expect("Failed to receive event");
        kinds.push(event.event_type);
    }
    assert_eq!(
        kinds,
        vec![
            ListingEventType::Added,
            ListingEventType::Added,
            ListingEventType::Withdrawn,
            ListingEventType::Expired,
        ]
    );

    assert!(
        wait_for(&service, |s| {
            let board = s.health_status().board;
            board.expired_count == 1 && board.withdrawn_count == 1
        })
        .await
    );
}

#[tokio::test]
async fn test_background_sweep_expires_past_windows() {
    let config = MatchingConfig {
        expiry_interval_ms: 50,
        ..MatchingConfig::default()
    };
    let service = MarketService::new(Some(config)).unwrap();

    // Past windows are accepted on insert and left to the sweep
    let mut stale = vehicle_request("v-stale", "carrier", "tokyo", 1, 1, "4t");
    stale.earliest_date = day(-40);
    stale.latest_date = day(-35);
    service.submit_listing(stale).unwrap();
    service
        .submit_listing(vehicle_request("v-fresh", "carrier", "tokyo", 1, 5, "4t"))
        .unwrap();

    assert!(
        wait_for(&service, |s| {
            s.get_listing(&id("v-stale"))
                .map(|l| l.status == ListingStatus::Expired)
                .unwrap_or(false)
        })
        .await
    );
    assert_eq!(service.get_listing(&id("v-fresh")).unwrap().status, ListingStatus::Active);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_up_front() {
    let zero_interval = MatchingConfig {
        expiry_interval_ms: 0,
        ..MatchingConfig::default()
    };
    assert!(matches!(
        MarketService::new(Some(zero_interval)),
        Err(MatchError::Validation(_))
    ));

    let zero_buffer = MatchingConfig {
        event_buffer: 0,
        ..MatchingConfig::default()
    };
    assert!(matches!(
        MarketService::new(Some(zero_buffer)),
        Err(MatchError::Validation(_))
    ));

    let lopsided = MatchingConfig {
        route_weight: 0.9,
        ..MatchingConfig::default()
    };
    assert!(MarketService::new(Some(lopsided)).is_err());
}

#[tokio::test]
async fn test_manual_match_is_not_counted_as_a_pair() {
    let service = MarketService::new(None).unwrap();
    let mut rx = service.subscribe();

    service
        .submit_listing(cargo_request("c1", "shipper", "tokyo", "osaka", 1, 5, "4t"))
        .unwrap();
    service
        .submit_listing(vehicle_request("v1", "carrier", "tokyo", 1, 5, "4t"))
        .unwrap();
    service.update_status(&id("c1"), ListingStatus::Matched).unwrap();
    service.update_status(&id("v1"), ListingStatus::Withdrawn).unwrap();

    let mut kinds = Vec::new();
    for _ in 0..4 {
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("Timed out waiting for event")
            .expect("Failed to receive event");
        kinds.push(event.event_type);
    }
    assert_eq!(kinds[2], ListingEventType::Matched(None));

    // The withdrawal is published after the manual match, so once it is
    // counted the collector has already seen the Matched event
    assert!(wait_for(&service, |s| s.health_status().board.withdrawn_count == 1).await);
    assert_eq!(service.health_status().board.matches_count, 0);
}
