//! Configuration management for the matching core.
//!
//! This module provides configuration handling via environment variables with sensible defaults.
//! All configuration parameters can be customized through environment variables with the TORAMATCH_ prefix.
//!
//! # Environment Variables
//! - TORAMATCH_ROUTE_WEIGHT: Weight for route overlap (default: 0.4)
//! - TORAMATCH_DATE_WEIGHT: Weight for date-window overlap (default: 0.3)
//! - TORAMATCH_VEHICLE_WEIGHT: Weight for vehicle-type match (default: 0.3)
//! - TORAMATCH_MIN_SCORE: Results scoring below this are dropped (default: 0.2)
//! - TORAMATCH_PARTIAL_ROUTE_SCORE: Credit when only one route end matches (default: 0.5)
//! - TORAMATCH_LARGER_VEHICLE_SCORE: Credit for a larger vehicle carrying a smaller load (default: 0.7)
//! - TORAMATCH_ALLOW_LARGER_VEHICLES: Enable the tolerant vehicle relation (default: true)
//! - TORAMATCH_REQUIRE_DATE_OVERLAP: Drop candidates whose windows do not intersect (default: true)
//! - TORAMATCH_DEFAULT_LIMIT / TORAMATCH_MAX_LIMIT: Result count bounds (default: 20 / 200)
//! - TORAMATCH_EXPIRY_INTERVAL_MS: Expiry sweep interval (default: 60000)
//! - TORAMATCH_EXPIRY_BATCH_SIZE: Listings expired per write lock (default: 256)
//! - TORAMATCH_EVENT_BUFFER: Status event channel capacity (default: 1024)
//! - TORAMATCH_CORS_ALLOWED_ORIGIN: Allowed CORS origin, "*" for any (default: "*")

use serde::Deserialize;
use std::env;

/// Prefix for all service environment variables.
const ENV_PREFIX: &str = "TORAMATCH_";

/// Tolerance used when checking that weights sum to 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Configuration parameters for the matching core.
///
/// Controls:
/// - Score weights and thresholds
/// - Candidate filtering rules
/// - Result limits
/// - Expiry sweep cadence
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Weight of the route overlap component.
    pub route_weight: f64,

    /// Weight of the date-window overlap component.
    pub date_weight: f64,

    /// Weight of the vehicle-type component.
    pub vehicle_weight: f64,

    /// Minimum total score for a candidate to be returned at all.
    pub min_score: f64,

    /// Route credit when only the origin or only the destination matches.
    pub partial_route_score: f64,

    /// Vehicle credit when a larger vehicle carries a smaller-truck load.
    pub larger_vehicle_score: f64,

    /// Whether larger vehicles are considered for smaller cargo.
    pub allow_larger_vehicles: bool,

    /// Whether candidates with disjoint date windows are dropped before scoring.
    pub require_date_overlap: bool,

    /// Number of results returned when the caller gives no limit.
    pub default_limit: usize,

    /// Largest limit a caller may ask for.
    pub max_limit: usize,

    /// Interval between expiry sweeps, in milliseconds.
    pub expiry_interval_ms: u64,

    /// Listings transitioned per write-lock acquisition during a sweep.
    pub expiry_batch_size: usize,

    /// Capacity of the status event broadcast channel.
    pub event_buffer: usize,

    /// Origin allowed by the HTTP layer's CORS policy.
    pub cors_allowed_origin: String,
}

impl MatchingConfig {
    /// Attempts to load configuration from environment variables.
    ///
    /// All variables must be prefixed with "TORAMATCH_". For example:
    /// - TORAMATCH_MIN_SCORE=0.3
    /// - TORAMATCH_DEFAULT_LIMIT=50
    ///
    /// Unset variables keep their default value.
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists for local development
        dotenv::dotenv().ok();

        let env_vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .map(|(k, v)| (k.trim_start_matches(ENV_PREFIX).to_lowercase(), v))
            .collect();

        let config = envy::from_iter::<_, Self>(env_vars)
            .map_err(|e| format!("Failed to parse environment variables: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from environment variables, falling back to defaults
    /// if environment variables are invalid.
    pub fn from_env_or_default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            log::warn!("Using default configuration: {}", e);
            Self::default()
        })
    }

    /// Validates all configuration parameters.
    ///
    /// # Validation Rules
    /// - Weights must be non-negative and sum to 1.0
    /// - Scores and thresholds must lie in [0.0, 1.0]
    /// - Limits, intervals and buffers must be positive
    /// - default_limit must not exceed max_limit
    pub fn validate(&self) -> Result<(), String> {
        if self.route_weight < 0.0 || self.date_weight < 0.0 || self.vehicle_weight < 0.0 {
            return Err("weights must be non-negative".to_string());
        }
        let sum = self.route_weight + self.date_weight + self.vehicle_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(format!("weights must sum to 1.0 (got {})", sum));
        }
        for (name, value) in [
            ("min_score", self.min_score),
            ("partial_route_score", self.partial_route_score),
            ("larger_vehicle_score", self.larger_vehicle_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0", name));
            }
        }
        if self.default_limit == 0 || self.max_limit == 0 {
            return Err("result limits must be positive".to_string());
        }
        if self.default_limit > self.max_limit {
            return Err("default_limit must not exceed max_limit".to_string());
        }
        if self.expiry_interval_ms == 0 {
            return Err("expiry_interval_ms must be positive".to_string());
        }
        if self.expiry_batch_size == 0 {
            return Err("expiry_batch_size must be positive".to_string());
        }
        if self.event_buffer == 0 {
            return Err("event_buffer must be positive".to_string());
        }
        Ok(())
    }
}

/// Default configuration values.
impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            route_weight: 0.4,
            date_weight: 0.3,
            vehicle_weight: 0.3,
            min_score: 0.2,
            partial_route_score: 0.5,
            larger_vehicle_score: 0.7,
            allow_larger_vehicles: true,
            require_date_overlap: true,
            default_limit: 20,
            max_limit: 200,
            expiry_interval_ms: 60_000, // Sweep once a minute
            expiry_batch_size: 256,
            event_buffer: 1024,
            cors_allowed_origin: "*".to_string(),
        }
    }
}
