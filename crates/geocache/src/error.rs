use qsogrid_core::{CallSign, Coordinates};

/// Persistent-tier failure. Never treated as a miss.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Fatal to the caller's pass.
    #[error("location cache unavailable ({location}): {message}")]
    StoreUnavailable { location: String, message: String },
    /// Write refused; nothing was stored.
    #[error("refusing to store out-of-range coordinates for {callsign}: {}, {}", coordinates.lat, coordinates.lon)]
    InvalidCoordinates { callsign: CallSign, coordinates: Coordinates },
}

impl CacheError {
    pub(crate) fn store(location: &str, err: impl std::fmt::Display) -> Self {
        CacheError::StoreUnavailable {
            location: location.to_string(),
            message: err.to_string(),
        }
    }
}
