//! Callsign geolocation cache.
//!
//! Three tiers, fastest first:
//!
//! 1. an in-memory map owned by the [`GeoCache`] value (one pass / process),
//!    which also remembers failed directory lookups;
//! 2. a persistent [`LocationStore`] (SQLite `location_cache` table),
//!    append-only;
//! 3. the external [`DirectoryLookup`](qsogrid_directory::DirectoryLookup).
//!
//! Slow-tier hits are written through to the faster tiers. A failed
//! directory lookup is never persisted.

mod cache;
mod error;
mod store;

pub use cache::{CacheStats, GeoCache, GeoLookup, Tier};
pub use error::CacheError;
pub use store::{CacheEntry, LocationStore, SqliteLocationStore, DIRECTORY_SOURCE, TIMESTAMP_FORMAT};
