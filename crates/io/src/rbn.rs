//! Reverse Beacon Network spots.
//!
//! Accepts both the raw daily archive header (`callsign`, `dx`, `db`,
//! `date`, `tx_mode`) and the trimmed form (`rx_call`, `tx_call`,
//! `timestamp`). Frequencies are kHz. RBN carries no locators.

use std::path::Path;

use qsogrid_core::{ContactRecord, SourceTag};

use crate::error::IngestError;
use crate::spots::{parse_spots, read_spots, SpotLayout};

const LAYOUT: SpotLayout = SpotLayout {
    source: SourceTag::Rbn,
    timestamp: &["timestamp", "date"],
    frequency: &["freq"],
    per_mhz: 1000.0,
    mode: Some(&["tx_mode", "mode"]),
    fixed_mode: None,
    local_call: &["rx_call", "callsign"],
    local_grid: None,
    local_report: Some(&["db"]),
    remote_call: &["tx_call", "dx"],
    remote_grid: None,
};

pub fn read_rbn(path: &Path) -> Result<Vec<ContactRecord>, IngestError> {
    read_spots(path, &LAYOUT)
}

pub fn parse_rbn(text: &str, input: &str) -> Result<Vec<ContactRecord>, IngestError> {
    parse_spots(text, input, &LAYOUT)
}
