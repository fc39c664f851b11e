//! External directory lookup, the slowest tier of geolocation.
//!
//! The rest of the workspace only sees the [`DirectoryLookup`] contract:
//! one synchronous call per callsign returning raw coordinate strings or a
//! [`LookupFailure`]. Results are untrusted; parsing and validation belong
//! to the caller.

mod auth;
mod client;

pub use auth::{
    credentials_file_path, load_credentials, load_credentials_from,
    save_credentials, save_credentials_to, CredentialsError, DirectoryCredentials,
};
pub use client::{parse_response, QrzClient, QrzResponse};

use serde::Serialize;

/// What the directory returned for one callsign, unparsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectoryRecord {
    pub callsign: String,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub grid: Option<String>,
}

/// A failed directory lookup. Recovered by the caller, never fatal.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LookupFailure {
    #[error("no directory credentials configured")]
    NotAuthenticated,
    #[error("not found in directory: {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {0}: {1}")]
    Http(u16, String),
    #[error("unparseable directory response: {0}")]
    Parse(String),
    #[error("directory session error: {0}")]
    Session(String),
    #[error("unusable coordinates (lat={lat:?}, lon={lon:?})")]
    InvalidCoordinates { lat: Option<String>, lon: Option<String> },
    #[error("directory lookups disabled")]
    Disabled,
}

/// Synchronous callsign → location lookup.
pub trait DirectoryLookup {
    fn lookup(&mut self, callsign: &str) -> Result<DirectoryRecord, LookupFailure>;
}

/// Stand-in used when lookups are switched off: every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledDirectory;

impl DirectoryLookup for DisabledDirectory {
    fn lookup(&mut self, _callsign: &str) -> Result<DirectoryRecord, LookupFailure> {
        Err(LookupFailure::Disabled)
    }
}
