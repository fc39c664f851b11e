//! PSKReporter reception reports. Frequencies are Hz.

use std::path::Path;

use qsogrid_core::{ContactRecord, SourceTag};

use crate::error::IngestError;
use crate::spots::{parse_spots, read_spots, SpotLayout};

const LAYOUT: SpotLayout = SpotLayout {
    source: SourceTag::PskReporter,
    timestamp: &["flowStartSeconds"],
    frequency: &["frequency"],
    per_mhz: 1_000_000.0,
    mode: Some(&["mode"]),
    fixed_mode: None,
    local_call: &["receiver_call"],
    local_grid: Some(&["receiver_grid"]),
    local_report: Some(&["sNR"]),
    remote_call: &["sender_call"],
    remote_grid: Some(&["sender_grid"]),
};

pub fn read_pskreporter(path: &Path) -> Result<Vec<ContactRecord>, IngestError> {
    read_spots(path, &LAYOUT)
}

pub fn parse_pskreporter(text: &str, input: &str) -> Result<Vec<ContactRecord>, IngestError> {
    parse_spots(text, input, &LAYOUT)
}
