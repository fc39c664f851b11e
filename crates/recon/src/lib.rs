//! `qsogrid-recon`: grid-locator resolution over contact records.
//!
//! Pure engine crate: receives pre-loaded records and submissions, returns
//! annotated records, discrepancies and a per-callsign QTH table. File
//! formats live in `qsogrid-io`; the only external resource it touches is
//! the geolocation cache handed in by the caller.

pub mod aggregate;
pub mod config;
pub mod consensus;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod model;
pub mod stats;

pub use config::{resolve_path, ReconConfig};
pub use consensus::QthResolver;
pub use engine::{reconcile, run};
pub use error::ReconError;
pub use evidence::EvidenceIndex;
pub use model::{
    Discrepancy, GridStatsRow, LocatorCount, ReconInput, ReconMeta, ReconResult, ReconSummary,
    ReconciledRecord, ResolvedQth, ResolvedStation,
};
pub use stats::{compute_summary, grid_stats};
