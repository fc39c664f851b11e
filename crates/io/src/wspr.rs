//! WSPRnet spots (`wsprspots` CSV with a header row). Frequencies are MHz.

use std::path::Path;

use qsogrid_core::{ContactRecord, SourceTag};

use crate::error::IngestError;
use crate::spots::{parse_spots, read_spots, SpotLayout};

const LAYOUT: SpotLayout = SpotLayout {
    source: SourceTag::Wspr,
    timestamp: &["timestamp"],
    frequency: &["freq"],
    per_mhz: 1.0,
    mode: None,
    fixed_mode: Some("WSPR"),
    local_call: &["reporter"],
    local_grid: Some(&["reporter_grid"]),
    local_report: Some(&["snr"]),
    remote_call: &["call_sign"],
    remote_grid: Some(&["grid"]),
};

pub fn read_wspr(path: &Path) -> Result<Vec<ContactRecord>, IngestError> {
    read_spots(path, &LAYOUT)
}

pub fn parse_wspr(text: &str, input: &str) -> Result<Vec<ContactRecord>, IngestError> {
    parse_spots(text, input, &LAYOUT)
}
