//! `qsogrid-core`: shared data model.
//!
//! Every other crate speaks in these types: normalized callsigns,
//! structurally valid grid locators, provenance tags and the common
//! contact-record schema all ingestion sources are mapped into.

pub mod callsign;
pub mod locator;
pub mod record;

pub use callsign::CallSign;
pub use locator::{is_valid, Coordinates, GridLocator};
pub use record::{
    ContactRecord, ProvenanceClass, SourceTag, StationReport, StationRole, Submission,
};
