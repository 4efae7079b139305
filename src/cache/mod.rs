//! Local cache for Garmin data.
//!
//! A single SQLite file per cache directory holds three independent category
//! tables. Entries carry `created_at`/`expires_at` timestamps; expired entries
//! are deleted lazily on read, with an explicit sweep also available.

mod key;
mod store;

pub use key::Category;
pub use store::{CacheStats, CacheStore, CategoryStats};
