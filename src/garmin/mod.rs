//! Garmin Connect access: raw API client, shape normalization, and the
//! cached/retried client used by the orchestrator.

mod cached_client;
mod client;
mod normalize;
mod types;

pub use cached_client::CachedGarminClient;
pub use client::GarminClient;
pub use types::{Activity, DatedRecord, WellnessData};
