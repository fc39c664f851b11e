use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use qsogrid_core::{
    CallSign, ContactRecord, Coordinates, GridLocator, ProvenanceClass, SourceTag, StationRole,
    Submission,
};
use qsogrid_directory::LookupFailure;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Pre-loaded contacts from every configured source plus the operator
/// registrations, read once per pass.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub records: Vec<ContactRecord>,
    pub submissions: Vec<Submission>,
}

// ---------------------------------------------------------------------------
// Evidence
// ---------------------------------------------------------------------------

/// Evidence bucket key = (callsign, provenance class).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvidenceKey {
    pub callsign: CallSign,
    pub class: ProvenanceClass,
}

/// One locator and the number of reports that carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatorCount {
    pub locator: GridLocator,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Best locator for one callsign and where it came from.
///
/// `locator == None` means unknown. `lookup_failure` is set only when the
/// directory fallback was attempted and failed, so "no evidence" and
/// "lookup error" stay distinguishable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedQth {
    pub callsign: CallSign,
    pub locator: Option<GridLocator>,
    pub source: Option<ProvenanceClass>,
    pub count: Option<usize>,
    /// Directory coordinates when resolved by directory, cell center otherwise.
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_failure: Option<LookupFailure>,
}

impl ResolvedQth {
    pub fn unresolved(callsign: CallSign) -> Self {
        Self {
            callsign,
            locator: None,
            source: None,
            count: None,
            coordinates: None,
            lookup_failure: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.locator.is_some()
    }
}

// ---------------------------------------------------------------------------
// Reconciled output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedStation {
    pub callsign: CallSign,
    /// Locator exactly as logged by the source.
    pub logged_locator: Option<String>,
    pub locator: Option<GridLocator>,
    pub source: Option<ProvenanceClass>,
    pub coordinates: Option<Coordinates>,
    pub signal_report: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub frequency_mhz: Option<f64>,
    pub mode: String,
    pub stations: [ResolvedStation; 2],
    /// Great-circle distance between the stations when both are located.
    pub distance_km: Option<f64>,
    pub source: SourceTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_op: Option<bool>,
}

impl ReconciledRecord {
    pub fn station(&self, role: StationRole) -> &ResolvedStation {
        &self.stations[role.index()]
    }
}

/// Resolved locator differs from the one logged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    /// Position of the record in the pass input.
    pub record: usize,
    pub role: StationRole,
    pub callsign: CallSign,
    pub logged: Option<String>,
    pub resolved: Option<GridLocator>,
    pub source: Option<ProvenanceClass>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconSummary {
    pub records: usize,
    /// Distinct callsigns with at least one valid locator report.
    pub callsigns: usize,
    pub stations_resolved: usize,
    pub stations_unresolved: usize,
    pub discrepancies: usize,
    /// Malformed locators dropped while building the evidence index.
    pub evidence_rejected: usize,
    /// Resolved stations per provenance class.
    pub by_source: BTreeMap<String, usize>,
}

/// One row of the locator precision table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridStatsRow {
    /// Provenance class, `unresolved`, or `all_sources`.
    pub source: String,
    pub four_char: usize,
    pub six_char: usize,
    pub no_grid: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub records: Vec<ReconciledRecord>,
    pub discrepancies: Vec<Discrepancy>,
    /// Per-callsign QTH table, sorted by callsign.
    pub qths: Vec<ResolvedQth>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub directory_fallback: bool,
}
