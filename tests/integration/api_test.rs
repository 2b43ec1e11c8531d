use crate::common::*;
use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use toramatch::{api, MarketService, MatchingConfig};

#[actix_web::test]
async fn test_create_and_get_listing() {
    let service = web::Data::new(MarketService::new(Some(MatchingConfig::default())).unwrap());
    let app = test::init_service(App::new().app_data(service.clone()).configure(api::configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/listings")
        .set_json(cargo_request("c1", "shipper", "tokyo", "osaka", 1, 5, "4t"));
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], "c1");
    assert_eq!(body["status"], "active");
    assert_eq!(body["vehicle_type"], "4t");

    let req = test::TestRequest::get().uri("/api/listings/c1");
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["destination_region"], "osaka");
    assert_eq!(body["earliest_date"], json!(day(1).to_string()));
}

#[actix_web::test]
async fn test_matches_endpoint_returns_breakdown() {
    let service = web::Data::new(MarketService::new(None).unwrap());
    let app = test::init_service(App::new().app_data(service.clone()).configure(api::configure)).await;

    for request in [
        serde_json::to_value(cargo_request("c1", "shipper", "tokyo", "osaka", 1, 5, "4t")).unwrap(),
        serde_json::to_value(vehicle_request("v1", "carrier", "tokyo", 3, 7, "4t")).unwrap(),
        serde_json::to_value(vehicle_request("v2", "carrier-2", "tokyo", 1, 5, "10t")).unwrap(),
    ] {
        let req = test::TestRequest::post().uri("/api/listings").set_json(request);
        let resp = test::call_service(&app, req.to_request()).await;
        assert!(resp.status().is_success());
    }

    let req = test::TestRequest::get().uri("/api/listings/c1/matches?limit=1");
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["query_listing_id"], "c1");
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    // 0.4 + 0.3 + 0.3 * 0.7 beats 0.4 + 0.3 * 0.6 + 0.3
    assert_eq!(results[0]["candidate_listing_id"], "v2");
    assert_eq!(results[0]["score_breakdown"]["vehicle_type"], json!(0.7));
    assert_eq!(results[0]["score_breakdown"]["route_overlap"], json!(1.0));
}

#[actix_web::test]
async fn test_confirm_then_conflict() {
    let service = web::Data::new(MarketService::new(None).unwrap());
    let app = test::init_service(App::new().app_data(service.clone()).configure(api::configure)).await;

    service
        .submit_listing(cargo_request("c1", "shipper", "tokyo", "osaka", 1, 5, "4t"))
        .unwrap();
    service
        .submit_listing(cargo_request("c2", "shipper-2", "tokyo", "osaka", 1, 5, "4t"))
        .unwrap();
    service
        .submit_listing(vehicle_request("v1", "carrier", "tokyo", 1, 5, "4t"))
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/matches/confirm")
        .set_json(json!({ "query_id": "c1", "candidate_id": "v1" }));
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["query"]["status"], "matched");
    assert_eq!(body["query"]["matched_with"], "v1");
    assert_eq!(body["candidate"]["matched_with"], "c1");

    let req = test::TestRequest::post()
        .uri("/api/matches/confirm")
        .set_json(json!({ "query_id": "c2", "candidate_id": "v1" }));
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "conflict");

    // A matched listing can no longer be searched from
    let req = test::TestRequest::get().uri("/api/listings/c1/matches");
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_state");
}

#[actix_web::test]
async fn test_error_responses() {
    let service = web::Data::new(MarketService::new(None).unwrap());
    let app = test::init_service(App::new().app_data(service.clone()).configure(api::configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/listings")
        .set_json(cargo_request("c1", "shipper", "tokyo", "osaka", 5, 1, "4t"));
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");

    let req = test::TestRequest::get().uri("/api/listings/ghost");
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/listings/ghost/matches");
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    service
        .submit_listing(vehicle_request("v1", "carrier", "tokyo", 1, 5, "4t"))
        .unwrap();
    let req = test::TestRequest::get().uri("/api/listings/v1/matches?limit=0");
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/listings/v1/matches?limit=abc");
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");

    let req = test::TestRequest::post()
        .uri("/api/listings")
        .set_json(json!({ "side": "cargo", "origin_region": "tokyo" }));
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");

    let req = test::TestRequest::post()
        .uri("/api/listings/v1/status")
        .set_json(json!({ "status": "withdrawn" }));
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/listings/v1/status")
        .set_json(json!({ "status": "active" }));
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_transition");
}

#[actix_web::test]
async fn test_health_endpoint() {
    let service = web::Data::new(MarketService::new(None).unwrap());
    let app = test::init_service(
        App::new()
            .app_data(service.clone())
            .configure(api::configure)
            .service(api::health),
    )
    .await;

    service
        .submit_listing(vehicle_request("v1", "carrier", "tokyo", 1, 5, "4t"))
        .unwrap();

    for uri in ["/health", "/api/health"] {
        let req = test::TestRequest::get().uri(uri);
        let resp = test::call_service(&app, req.to_request()).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["board"]["active_vehicles"], 1);
    }
}
