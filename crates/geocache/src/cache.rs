use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use qsogrid_core::{CallSign, Coordinates};
use qsogrid_directory::{DirectoryLookup, DirectoryRecord, LookupFailure};

use crate::error::CacheError;
use crate::store::{CacheEntry, LocationStore, SqliteLocationStore};

/// Tier that answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Memory,
    Store,
    Directory,
}

/// Outcome of [`GeoCache::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GeoLookup {
    Found { coordinates: Coordinates, tier: Tier },
    Failed { failure: LookupFailure },
}

impl GeoLookup {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            GeoLookup::Found { coordinates, .. } => Some(*coordinates),
            GeoLookup::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&LookupFailure> {
        match self {
            GeoLookup::Found { .. } => None,
            GeoLookup::Failed { failure } => Some(failure),
        }
    }
}

/// Per-tier counters for one cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub memory_hits: usize,
    pub store_hits: usize,
    pub directory_hits: usize,
    pub directory_failures: usize,
}

/// Three-tier callsign geolocation cache.
///
/// Owns its in-memory tier; construct one per pass (or per process) and
/// hand it to the resolver by `&mut`.
pub struct GeoCache {
    memory: HashMap<CallSign, Result<Coordinates, LookupFailure>>,
    store: Box<dyn LocationStore>,
    directory: Box<dyn DirectoryLookup>,
    stats: CacheStats,
}

impl GeoCache {
    pub fn new(store: Box<dyn LocationStore>, directory: Box<dyn DirectoryLookup>) -> Self {
        Self {
            memory: HashMap::new(),
            store,
            directory,
            stats: CacheStats::default(),
        }
    }

    /// Cache backed by the SQLite file at `path`.
    pub fn open(path: &Path, directory: Box<dyn DirectoryLookup>) -> Result<Self, CacheError> {
        let store = SqliteLocationStore::open(path)?;
        Ok(Self::new(Box::new(store), directory))
    }

    /// Resolve `callsign` to coordinates.
    ///
    /// `Err` only for persistent-store failures. Directory failures come back
    /// as [`GeoLookup::Failed`] and are remembered in memory for the life of
    /// this cache, never persisted.
    pub fn resolve(&mut self, callsign: &CallSign) -> Result<GeoLookup, CacheError> {
        if let Some(hit) = self.memory.get(callsign) {
            self.stats.memory_hits += 1;
            return Ok(match hit {
                Ok(coordinates) => GeoLookup::Found {
                    coordinates: *coordinates,
                    tier: Tier::Memory,
                },
                Err(failure) => GeoLookup::Failed {
                    failure: failure.clone(),
                },
            });
        }

        if let Some(entry) = self.store.fetch(callsign)? {
            log::debug!("{callsign}: location cache hit ({})", entry.lookup_source);
            self.stats.store_hits += 1;
            self.memory.insert(callsign.clone(), Ok(entry.coordinates));
            return Ok(GeoLookup::Found {
                coordinates: entry.coordinates,
                tier: Tier::Store,
            });
        }

        match self.lookup_directory(callsign) {
            Ok(coordinates) => {
                log::debug!("{callsign}: directory hit {:.4},{:.4}", coordinates.lat, coordinates.lon);
                self.stats.directory_hits += 1;
                let entry = CacheEntry::directory(callsign.clone(), coordinates, Utc::now().naive_utc());
                self.store.insert(&entry)?;
                self.memory.insert(callsign.clone(), Ok(coordinates));
                Ok(GeoLookup::Found {
                    coordinates,
                    tier: Tier::Directory,
                })
            }
            Err(failure) => {
                match &failure {
                    LookupFailure::Disabled => log::debug!("{callsign}: {failure}"),
                    _ => log::warn!("{callsign}: directory lookup failed: {failure}"),
                }
                self.stats.directory_failures += 1;
                self.memory.insert(callsign.clone(), Err(failure.clone()));
                Ok(GeoLookup::Failed { failure })
            }
        }
    }

    fn lookup_directory(&mut self, callsign: &CallSign) -> Result<Coordinates, LookupFailure> {
        let record = self.directory.lookup(callsign.as_str())?;
        parse_coordinates(&record)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn store(&self) -> &dyn LocationStore {
        self.store.as_ref()
    }
}

/// Numeric, finite, in-range lat/lon from a directory record.
fn parse_coordinates(record: &DirectoryRecord) -> Result<Coordinates, LookupFailure> {
    let number = |s: &Option<String>| s.as_deref().and_then(|v| v.trim().parse::<f64>().ok());

    match (number(&record.lat), number(&record.lon)) {
        (Some(lat), Some(lon)) if Coordinates::new(lat, lon).is_valid() => Ok(Coordinates::new(lat, lon)),
        _ => Err(LookupFailure::InvalidCoordinates {
            lat: record.lat.clone(),
            lon: record.lon.clone(),
        }),
    }
}
