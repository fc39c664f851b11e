//! Operator-registration export: one row per station that registered a QTH.
//!
//! Columns: `callsign`, `grid` (alias `per_gs`), optional `submitted_at`.
//! The locator is kept as entered; malformed ones are filtered later.

use std::path::Path;

use qsogrid_core::{CallSign, Submission};

use crate::error::IngestError;
use crate::text::{field, parse_timestamp, read_file_as_utf8, Columns};

pub fn read_submissions(path: &Path) -> Result<Vec<Submission>, IngestError> {
    let text = read_file_as_utf8(path)?;
    parse_submissions(&text, &path.display().to_string())
}

pub fn parse_submissions(text: &str, input: &str) -> Result<Vec<Submission>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let cols = Columns::from_reader(&mut reader, input)?;
    let call_idx = Some(cols.require(&["callsign", "call"])?);
    let grid_idx = Some(cols.require(&["grid", "per_gs", "locator"])?);
    let at_idx = cols.find(&["submitted_at", "timestamp"]);

    let mut submissions = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| cols.csv_error(e))?;

        let Some(callsign) = field(&record, call_idx).and_then(CallSign::parse) else {
            continue;
        };
        let Some(locator) = field(&record, grid_idx) else {
            continue;
        };

        submissions.push(Submission {
            callsign,
            locator: locator.to_string(),
            submitted_at: field(&record, at_idx).and_then(parse_timestamp),
        });
    }

    log::info!("{input}: {} submissions", submissions.len());
    Ok(submissions)
}
