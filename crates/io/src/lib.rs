//! `qsogrid-io`: ingestion collaborators and output writers.
//!
//! Every reader yields [`ContactRecord`](qsogrid_core::ContactRecord)s tagged
//! with their source. Locators are passed through as logged; validation is
//! the evidence index's job.

pub mod cabrillo;
pub mod error;
pub mod export;
pub mod pskreporter;
pub mod rbn;
pub mod submissions;
pub mod text;
pub mod wspr;

mod spots;

pub use error::IngestError;
