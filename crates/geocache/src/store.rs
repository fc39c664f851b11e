// Persistent location tier using SQLite

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use serde::Serialize;

use qsogrid_core::{CallSign, Coordinates};

use crate::error::CacheError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS location_cache (
    callsign TEXT NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    lookup_source TEXT NOT NULL,   -- 'directory' for write-through rows
    lookup_datetime TEXT NOT NULL  -- UTC, YYYY-MM-DD HH:MM:SS
);

CREATE INDEX IF NOT EXISTS location_cache_callsign ON location_cache (callsign);
"#;

/// `lookup_source` of rows written after a directory hit.
pub const DIRECTORY_SOURCE: &str = "directory";

/// `lookup_datetime` column format.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One persisted row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub callsign: CallSign,
    pub coordinates: Coordinates,
    pub lookup_source: String,
    /// `None` when the stored text does not parse.
    pub lookup_datetime: Option<NaiveDateTime>,
}

impl CacheEntry {
    pub fn directory(callsign: CallSign, coordinates: Coordinates, at: NaiveDateTime) -> Self {
        Self {
            callsign,
            coordinates,
            lookup_source: DIRECTORY_SOURCE.to_string(),
            lookup_datetime: Some(at),
        }
    }
}

/// Keyed, append-only store of [`CacheEntry`] rows.
pub trait LocationStore {
    /// Newest row for `callsign`, if any.
    fn fetch(&self, callsign: &CallSign) -> Result<Option<CacheEntry>, CacheError>;

    /// Append a row. Existing rows are never updated.
    fn insert(&mut self, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Every row for `callsign`, newest first.
    fn history(&self, callsign: &CallSign) -> Result<Vec<CacheEntry>, CacheError>;
}

pub struct SqliteLocationStore {
    conn: Connection,
    location: String,
}

impl SqliteLocationStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let location = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::store(&location, e))?;
        }

        let conn = Connection::open(path).map_err(|e| CacheError::store(&location, e))?;
        Self::init(conn, location)
    }

    pub fn open_in_memory() -> Result<Self, CacheError> {
        let location = ":memory:".to_string();
        let conn = Connection::open_in_memory().map_err(|e| CacheError::store(&location, e))?;
        Self::init(conn, location)
    }

    fn init(conn: Connection, location: String) -> Result<Self, CacheError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| CacheError::store(&location, e))?;
        Ok(Self { conn, location })
    }

    fn select(&self, callsign: &CallSign, limit: Option<usize>) -> rusqlite::Result<Vec<CacheEntry>> {
        let sql = format!(
            "SELECT lat, lon, lookup_source, lookup_datetime FROM location_cache \
             WHERE callsign = ?1 \
             ORDER BY lookup_datetime DESC, rowid DESC{}",
            limit.map(|n| format!(" LIMIT {n}")).unwrap_or_default()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![callsign.as_str()], |row| {
            let lat: f64 = row.get(0)?;
            let lon: f64 = row.get(1)?;
            let source: String = row.get(2)?;
            let at: String = row.get(3)?;
            Ok(CacheEntry {
                callsign: callsign.clone(),
                coordinates: Coordinates::new(lat, lon),
                lookup_source: source,
                lookup_datetime: NaiveDateTime::parse_from_str(&at, TIMESTAMP_FORMAT).ok(),
            })
        })?;

        rows.collect()
    }
}

impl LocationStore for SqliteLocationStore {
    fn fetch(&self, callsign: &CallSign) -> Result<Option<CacheEntry>, CacheError> {
        let mut rows = self
            .select(callsign, Some(1))
            .map_err(|e| CacheError::store(&self.location, e))?;
        Ok(rows.pop())
    }

    fn insert(&mut self, entry: &CacheEntry) -> Result<(), CacheError> {
        if !entry.coordinates.is_valid() {
            return Err(CacheError::InvalidCoordinates {
                callsign: entry.callsign.clone(),
                coordinates: entry.coordinates,
            });
        }

        let at = entry
            .lookup_datetime
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default();

        self.conn
            .execute(
                "INSERT INTO location_cache (callsign, lat, lon, lookup_source, lookup_datetime) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.callsign.as_str(),
                    entry.coordinates.lat,
                    entry.coordinates.lon,
                    &entry.lookup_source,
                    at,
                ],
            )
            .map_err(|e| CacheError::store(&self.location, e))?;

        Ok(())
    }

    fn history(&self, callsign: &CallSign) -> Result<Vec<CacheEntry>, CacheError> {
        self.select(callsign, None)
            .map_err(|e| CacheError::store(&self.location, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 8)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn call(s: &str) -> CallSign {
        CallSign::parse(s).unwrap()
    }

    #[test]
    fn empty_store_misses() {
        let store = SqliteLocationStore::open_in_memory().unwrap();
        assert!(store.fetch(&call("K3JT")).unwrap().is_none());
        assert!(store.history(&call("K3JT")).unwrap().is_empty());
    }

    #[test]
    fn newest_row_wins() {
        let mut store = SqliteLocationStore::open_in_memory().unwrap();
        let k = call("K3JT");
        store
            .insert(&CacheEntry::directory(k.clone(), Coordinates::new(39.0, -75.0), at(18, 0)))
            .unwrap();
        store
            .insert(&CacheEntry::directory(k.clone(), Coordinates::new(41.0, -72.0), at(19, 30)))
            .unwrap();
        store
            .insert(&CacheEntry::directory(k.clone(), Coordinates::new(10.0, 10.0), at(12, 0)))
            .unwrap();

        let hit = store.fetch(&k).unwrap().unwrap();
        assert_eq!(hit.coordinates, Coordinates::new(41.0, -72.0));
        assert_eq!(hit.lookup_source, DIRECTORY_SOURCE);
        assert_eq!(hit.lookup_datetime, Some(at(19, 30)));

        // Append-only: all three rows kept.
        assert_eq!(store.history(&k).unwrap().len(), 3);
    }

    #[test]
    fn same_timestamp_prefers_later_insert() {
        let mut store = SqliteLocationStore::open_in_memory().unwrap();
        let k = call("W1AW");
        store
            .insert(&CacheEntry::directory(k.clone(), Coordinates::new(1.0, 1.0), at(10, 0)))
            .unwrap();
        store
            .insert(&CacheEntry::directory(k.clone(), Coordinates::new(2.0, 2.0), at(10, 0)))
            .unwrap();
        assert_eq!(store.fetch(&k).unwrap().unwrap().coordinates, Coordinates::new(2.0, 2.0));
    }

    #[test]
    fn invalid_coordinates_are_refused() {
        let mut store = SqliteLocationStore::open_in_memory().unwrap();
        let k = call("K3JT");
        for bad in [Coordinates::new(f64::NAN, -75.0), Coordinates::new(39.0, 181.0)] {
            let err = store
                .insert(&CacheEntry::directory(k.clone(), bad, at(1, 0)))
                .unwrap_err();
            assert!(matches!(err, CacheError::InvalidCoordinates { ref callsign, .. } if *callsign == k));
        }
        assert!(store.history(&k).unwrap().is_empty());
    }

    #[test]
    fn open_creates_parent_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/location_cache.sqlite");
        let k = call("VE3-K3JT");
        {
            let mut store = SqliteLocationStore::open(&path).unwrap();
            store
                .insert(&CacheEntry::directory(k.clone(), Coordinates::new(43.6, -79.4), at(2, 0)))
                .unwrap();
        }
        let store = SqliteLocationStore::open(&path).unwrap();
        assert_eq!(store.fetch(&k).unwrap().unwrap().coordinates.lat, 43.6);
    }

    #[test]
    fn unopenable_path_is_store_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file.
        let err = SqliteLocationStore::open(dir.path()).err().unwrap();
        assert!(matches!(err, CacheError::StoreUnavailable { .. }));
    }
}
