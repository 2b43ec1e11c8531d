//! Freight matching core.
//!
//! Shippers post cargo listings and carriers post vehicle listings. The core
//! stores them, indexes the Active ones by origin prefecture and vehicle type,
//! and ranks opposite-side candidates with an explainable weighted score.

pub mod api;
pub mod config;
pub mod error;
pub mod listing;
pub mod matching;
pub mod models;
pub mod service;

pub use config::MatchingConfig;
pub use error::MatchError;
pub use service::MarketService;
