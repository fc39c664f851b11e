use qsogrid_core::{ContactRecord, StationReport, StationRole};
use qsogrid_geocache::GeoCache;

use crate::config::ReconConfig;
use crate::consensus::QthResolver;
use crate::error::ReconError;
use crate::evidence::EvidenceIndex;
use crate::model::{
    Discrepancy, ReconInput, ReconMeta, ReconResult, ReconciledRecord, ResolvedStation,
};
use crate::stats::compute_summary;

/// Run one resolution pass: build the evidence index, resolve every
/// participant, annotate the records and report discrepancies.
///
/// `geocache` is ignored when the config turns the directory fallback off.
/// The only fatal outcome is an unreachable location store.
pub fn run(
    config: &ReconConfig,
    input: &ReconInput,
    geocache: Option<&mut GeoCache>,
) -> Result<ReconResult, ReconError> {
    let index = EvidenceIndex::build(&input.records, &input.submissions);

    let geocache = if config.directory_fallback { geocache } else { None };
    let directory_fallback = geocache.is_some();
    let mut resolver = QthResolver::new(&index, geocache);

    let (records, discrepancies) = reconcile(&input.records, &mut resolver)?;
    // Callsigns only ever seen without a locator were resolved above; this
    // adds the rest of the index.
    resolver.resolve_all()?;
    let qths = resolver.table();

    let summary = compute_summary(&records, &discrepancies, &index);
    log::info!(
        "{}: {} records, {}/{} stations resolved, {} discrepancies",
        config.name,
        summary.records,
        summary.stations_resolved,
        summary.stations_resolved + summary.stations_unresolved,
        summary.discrepancies
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            directory_fallback,
        },
        summary,
        records,
        discrepancies,
        qths,
    })
}

/// Annotate every record with both participants' resolved locators.
///
/// The logged locator is kept alongside; a discrepancy is emitted whenever
/// the two differ (after trimming and uppercasing the logged one). Records
/// are never dropped.
pub fn reconcile(
    records: &[ContactRecord],
    resolver: &mut QthResolver<'_>,
) -> Result<(Vec<ReconciledRecord>, Vec<Discrepancy>), ReconError> {
    let mut out = Vec::with_capacity(records.len());
    let mut discrepancies = Vec::new();

    for (position, record) in records.iter().enumerate() {
        let local = resolve_station(record.station(StationRole::Local), resolver)?;
        let remote = resolve_station(record.station(StationRole::Remote), resolver)?;

        for (role, station) in [(StationRole::Local, &local), (StationRole::Remote, &remote)] {
            if let Some(d) = discrepancy(position, role, station) {
                log::debug!(
                    "record {position}: {} logged {:?}, resolved {:?} ({:?})",
                    d.callsign,
                    d.logged,
                    d.resolved.as_ref().map(|l| l.as_str()),
                    d.source
                );
                discrepancies.push(d);
            }
        }

        let distance_km = match (local.coordinates, remote.coordinates) {
            (Some(a), Some(b)) => Some(a.great_circle_km(&b)),
            _ => None,
        };

        out.push(ReconciledRecord {
            timestamp: record.timestamp,
            frequency_mhz: record.frequency_mhz,
            mode: record.mode.clone(),
            stations: [local, remote],
            distance_km,
            source: record.source,
            log_file: record.log_file.clone(),
            single_op: record.single_op,
        });
    }

    Ok((out, discrepancies))
}

fn resolve_station(
    station: &StationReport,
    resolver: &mut QthResolver<'_>,
) -> Result<ResolvedStation, ReconError> {
    let qth = resolver.find_qth(&station.callsign)?;
    Ok(ResolvedStation {
        callsign: station.callsign.clone(),
        logged_locator: station.locator.clone(),
        locator: qth.locator,
        source: qth.source,
        coordinates: qth.coordinates,
        signal_report: station.signal_report.clone(),
    })
}

fn discrepancy(record: usize, role: StationRole, station: &ResolvedStation) -> Option<Discrepancy> {
    let logged = station
        .logged_locator
        .as_deref()
        .map(|l| l.trim().to_ascii_uppercase())
        .filter(|l| !l.is_empty());
    let resolved = station.locator.as_ref().map(|l| l.as_str());

    if logged.as_deref() == resolved {
        return None;
    }
    Some(Discrepancy {
        record,
        role,
        callsign: station.callsign.clone(),
        logged: station.logged_locator.clone(),
        resolved: station.locator.clone(),
        source: station.source,
    })
}
