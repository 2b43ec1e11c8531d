//! Main entry point for the matching service.
//! Sets up the HTTP server, configures logging, and initializes the service with
//! environment-based configuration.

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use toramatch::{api, MarketService, MatchingConfig};

/// # Server Configuration
/// - Binds to 0.0.0.0 on PORT (default 8080)
/// - All endpoints are under the /api prefix, plus a root /health
///
/// # Environment Variables
/// - RUST_LOG: log level for env_logger
/// - PORT: listening port
/// - TORAMATCH_*: matching configuration, see `config`
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = MatchingConfig::from_env_or_default();
    log::info!("Starting matching service with configuration: {:?}", config);

    let cors_origin = config.cors_allowed_origin.clone();
    let service = MarketService::new(Some(config))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let service = web::Data::new(service);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("invalid PORT: {}", e)))?;

    log::info!("Starting server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default().allow_any_method().allow_any_header();
        let cors = if cors_origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(&cors_origin)
        };

        App::new()
            .wrap(cors)
            .app_data(service.clone())
            .configure(api::configure)
            // Root-level health endpoint for platform health checks
            .service(api::health)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
