//! CSV export of a resolution pass.
//!
//! Three files: annotated records, the discrepancy report and the
//! per-callsign QTH table. Output order follows the pass result so two
//! identical passes write identical files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use qsogrid_core::{Coordinates, GridLocator, ProvenanceClass};
use qsogrid_recon::{Discrepancy, ReconciledRecord, ResolvedQth, ResolvedStation};

use crate::error::IngestError;

const QSO_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

const RECORDS_HEADER: &[&str] = &[
    "datetime",
    "frequency",
    "mode",
    "call_0",
    "srpt_0",
    "grid_0",
    "log_grid_0",
    "grid_src_0",
    "lat_0",
    "lon_0",
    "call_1",
    "srpt_1",
    "grid_1",
    "log_grid_1",
    "grid_src_1",
    "lat_1",
    "lon_1",
    "distance_km",
    "source",
    "single_op",
    "log_file",
];

const DISCREPANCIES_HEADER: &[&str] = &[
    "record",
    "station",
    "callsign",
    "logged_grid",
    "resolved_grid",
    "resolved_source",
];

const QTHS_HEADER: &[&str] = &["callsign", "grid", "count", "source", "grid_len", "lookup_failure"];

/// Write annotated records, one row per contact.
pub fn write_records_csv(records: &[ReconciledRecord], writer: impl Write) -> Result<(), String> {
    let mut csv = csv_writer(writer);
    csv.write_record(RECORDS_HEADER)
        .map_err(|e| format!("CSV write error: {e}"))?;

    for rec in records {
        let mut row = vec![
            rec.timestamp
                .map(|t| t.format(QSO_DATETIME).to_string())
                .unwrap_or_default(),
            rec.frequency_mhz.map(|f| format!("{f:.6}")).unwrap_or_default(),
            rec.mode.clone(),
        ];
        for station in &rec.stations {
            row.extend(station_fields(station));
        }
        row.extend([
            rec.distance_km.map(|d| format!("{d:.1}")).unwrap_or_default(),
            rec.source.to_string(),
            rec.single_op.map(|s| s.to_string()).unwrap_or_default(),
            rec.log_file.clone().unwrap_or_default(),
        ]);
        csv.write_record(&row)
            .map_err(|e| format!("CSV write error: {e}"))?;
    }

    csv.flush().map_err(|e| format!("CSV flush error: {e}"))?;
    Ok(())
}

/// Write the discrepancy report.
pub fn write_discrepancies_csv(discrepancies: &[Discrepancy], writer: impl Write) -> Result<(), String> {
    let mut csv = csv_writer(writer);
    csv.write_record(DISCREPANCIES_HEADER)
        .map_err(|e| format!("CSV write error: {e}"))?;

    for d in discrepancies {
        csv.write_record(&[
            d.record.to_string(),
            d.role.index().to_string(),
            d.callsign.to_string(),
            d.logged.clone().unwrap_or_default(),
            locator_text(d.resolved.as_ref()),
            source_text(d.source),
        ])
        .map_err(|e| format!("CSV write error: {e}"))?;
    }

    csv.flush().map_err(|e| format!("CSV flush error: {e}"))?;
    Ok(())
}

/// Write the per-callsign QTH table.
pub fn write_qths_csv(qths: &[ResolvedQth], writer: impl Write) -> Result<(), String> {
    let mut csv = csv_writer(writer);
    csv.write_record(QTHS_HEADER)
        .map_err(|e| format!("CSV write error: {e}"))?;

    for q in qths {
        csv.write_record(&[
            q.callsign.to_string(),
            locator_text(q.locator.as_ref()),
            q.count.map(|c| c.to_string()).unwrap_or_default(),
            source_text(q.source),
            q.locator.as_ref().map(|l| l.precision().to_string()).unwrap_or_default(),
            q.lookup_failure.as_ref().map(|f| f.to_string()).unwrap_or_default(),
        ])
        .map_err(|e| format!("CSV write error: {e}"))?;
    }

    csv.flush().map_err(|e| format!("CSV flush error: {e}"))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// File wrappers
// ---------------------------------------------------------------------------

pub fn export_records(records: &[ReconciledRecord], path: &Path) -> Result<(), IngestError> {
    to_file(path, |w| write_records_csv(records, w))
}

pub fn export_discrepancies(discrepancies: &[Discrepancy], path: &Path) -> Result<(), IngestError> {
    to_file(path, |w| write_discrepancies_csv(discrepancies, w))
}

pub fn export_qths(qths: &[ResolvedQth], path: &Path) -> Result<(), IngestError> {
    to_file(path, |w| write_qths_csv(qths, w))
}

fn to_file(
    path: &Path,
    write: impl FnOnce(BufWriter<File>) -> Result<(), String>,
) -> Result<(), IngestError> {
    let fail = |message: String| IngestError::Write {
        path: path.to_path_buf(),
        message,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
    }
    let file = File::create(path).map_err(|e| fail(e.to_string()))?;
    write(BufWriter::new(file)).map_err(fail)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer)
}

fn station_fields(station: &ResolvedStation) -> [String; 7] {
    let (lat, lon) = coordinate_text(station.coordinates);
    [
        station.callsign.to_string(),
        station.signal_report.clone().unwrap_or_default(),
        locator_text(station.locator.as_ref()),
        station.logged_locator.clone().unwrap_or_default(),
        source_text(station.source),
        lat,
        lon,
    ]
}

fn locator_text(locator: Option<&GridLocator>) -> String {
    locator.map(|l| l.to_string()).unwrap_or_default()
}

fn source_text(source: Option<ProvenanceClass>) -> String {
    source.map(|s| s.to_string()).unwrap_or_default()
}

fn coordinate_text(coords: Option<Coordinates>) -> (String, String) {
    match coords {
        Some(c) => (format!("{:.4}", c.lat), format!("{:.4}", c.lon)),
        None => (String::new(), String::new()),
    }
}
