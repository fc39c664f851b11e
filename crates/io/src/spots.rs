// Column-mapped spot CSVs (RBN, WSPR, PSKReporter)

use std::path::Path;

use qsogrid_core::{CallSign, ContactRecord, SourceTag, StationReport};

use crate::error::IngestError;
use crate::text::{field, parse_timestamp, read_file_as_utf8, Columns};

type Aliases = &'static [&'static str];

/// How one spot network's CSV maps onto the contact schema.
///
/// Station 0 is the receiving / reporting station, station 1 the
/// transmitter it heard.
pub(crate) struct SpotLayout {
    pub source: SourceTag,
    pub timestamp: Aliases,
    pub frequency: Aliases,
    /// Divisor taking the file's frequency unit to MHz.
    pub per_mhz: f64,
    pub mode: Option<Aliases>,
    pub fixed_mode: Option<&'static str>,
    pub local_call: Aliases,
    pub local_grid: Option<Aliases>,
    pub local_report: Option<Aliases>,
    pub remote_call: Aliases,
    pub remote_grid: Option<Aliases>,
}

pub(crate) fn read_spots(path: &Path, layout: &SpotLayout) -> Result<Vec<ContactRecord>, IngestError> {
    let text = read_file_as_utf8(path)?;
    parse_spots(&text, &path.display().to_string(), layout)
}

pub(crate) fn parse_spots(
    text: &str,
    input: &str,
    layout: &SpotLayout,
) -> Result<Vec<ContactRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let cols = Columns::from_reader(&mut reader, input)?;

    let optional = |aliases: Option<Aliases>| -> Result<Option<usize>, IngestError> {
        aliases.map(|a| cols.require(a)).transpose()
    };

    let ts_idx = Some(cols.require(layout.timestamp)?);
    let freq_idx = Some(cols.require(layout.frequency)?);
    let mode_idx = optional(layout.mode)?;
    let local_idx = Some(cols.require(layout.local_call)?);
    let local_grid_idx = optional(layout.local_grid)?;
    let report_idx = layout.local_report.and_then(|a| cols.find(a));
    let remote_idx = Some(cols.require(layout.remote_call)?);
    let remote_grid_idx = optional(layout.remote_grid)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record.map_err(|e| cols.csv_error(e))?;

        let local = field(&record, local_idx).and_then(CallSign::parse);
        let remote = field(&record, remote_idx).and_then(CallSign::parse);
        let (Some(local), Some(remote)) = (local, remote) else {
            skipped += 1;
            continue;
        };

        let mode = match layout.fixed_mode {
            Some(m) => m.to_string(),
            None => field(&record, mode_idx).unwrap_or_default().to_ascii_uppercase(),
        };

        let owned = |idx| field(&record, idx).map(str::to_string);

        records.push(ContactRecord {
            timestamp: field(&record, ts_idx).and_then(parse_timestamp),
            frequency_mhz: field(&record, freq_idx)
                .and_then(|f| f.parse::<f64>().ok())
                .map(|f| f / layout.per_mhz),
            mode,
            stations: [
                StationReport::new(local, owned(local_grid_idx), owned(report_idx)),
                StationReport::new(remote, owned(remote_grid_idx), None),
            ],
            source: layout.source,
            log_file: None,
            single_op: None,
        });
    }

    if skipped > 0 {
        log::debug!("{input}: skipped {skipped} rows without both callsigns");
    }
    log::info!("{input}: {} {} spots", records.len(), layout.source);

    Ok(records)
}
