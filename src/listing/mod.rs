//! Listing records, the candidate index and the store that owns both.

mod index;
mod store;
mod types;

pub use index::CandidateIndex;
pub use store::{ListingStore, Snapshot, StoreCounts};
pub use types::*;
