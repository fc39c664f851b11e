use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use qsogrid_core::{CallSign, ContactRecord, ProvenanceClass, StationRole, Submission};
use qsogrid_directory::{DirectoryLookup, DirectoryRecord, LookupFailure};
use qsogrid_geocache::{GeoCache, LocationStore, SqliteLocationStore};
use qsogrid_recon::{grid_stats, run, ReconConfig, ReconInput, ReconResult, ResolvedQth};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_input() -> ReconInput {
    let dir = fixtures_dir();
    let records: Vec<ContactRecord> =
        serde_json::from_str(&std::fs::read_to_string(dir.join("records.json")).unwrap()).unwrap();
    let submissions: Vec<Submission> =
        serde_json::from_str(&std::fs::read_to_string(dir.join("submissions.json")).unwrap())
            .unwrap();
    ReconInput {
        records,
        submissions,
    }
}

fn load_config() -> ReconConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join("seqp.qsogrid.toml")).unwrap();
    ReconConfig::from_toml(&toml).unwrap()
}

fn load_and_run() -> ReconResult {
    run(&load_config(), &load_input(), None).unwrap()
}

fn qth<'r>(result: &'r ReconResult, call: &str) -> &'r ResolvedQth {
    let call = CallSign::parse(call).unwrap();
    result
        .qths
        .iter()
        .find(|q| q.callsign == call)
        .unwrap_or_else(|| panic!("{call} missing from QTH table"))
}

fn resolved(result: &ReconResult, call: &str) -> (Option<String>, Option<ProvenanceClass>) {
    let q = qth(result, call);
    (q.locator.as_ref().map(|l| l.to_string()), q.source)
}

fn some(locator: &str, class: ProvenanceClass) -> (Option<String>, Option<ProvenanceClass>) {
    (Some(locator.to_string()), Some(class))
}

struct CountingDirectory {
    calls: Rc<Cell<usize>>,
    known: Vec<(&'static str, &'static str, &'static str)>,
}

impl DirectoryLookup for CountingDirectory {
    fn lookup(&mut self, callsign: &str) -> Result<DirectoryRecord, LookupFailure> {
        self.calls.set(self.calls.get() + 1);
        self.known
            .iter()
            .find(|(call, _, _)| *call == callsign)
            .map(|(call, lat, lon)| DirectoryRecord {
                callsign: call.to_string(),
                lat: Some(lat.to_string()),
                lon: Some(lon.to_string()),
                grid: None,
            })
            .ok_or_else(|| LookupFailure::NotFound(callsign.to_string()))
    }
}

// -------------------------------------------------------------------------
// Consensus over the fixture
// -------------------------------------------------------------------------

#[test]
fn fixture_resolves_every_callsign() {
    let result = load_and_run();

    assert_eq!(resolved(&result, "NJ0P"), some("EM29FX", ProvenanceClass::Submitted));
    assert_eq!(resolved(&result, "K3WW"), some("FN20IJ", ProvenanceClass::Sent));
    assert_eq!(resolved(&result, "W6RW"), some("DM12", ProvenanceClass::Submitted));
    assert_eq!(resolved(&result, "K3JT"), some("EM99XO", ProvenanceClass::Received));
    assert_eq!(resolved(&result, "W7IY"), some("FM18GP", ProvenanceClass::Received));
    assert_eq!(resolved(&result, "N0BAD"), (None, None));
    assert_eq!(resolved(&result, "N0NE"), (None, None));

    assert_eq!(qth(&result, "K3JT").count, Some(2));
    assert_eq!(qth(&result, "W7IY").count, Some(2));
    assert_eq!(qth(&result, "K3WW").count, Some(3));
}

#[test]
fn fixture_summary_and_discrepancies() {
    let result = load_and_run();

    assert_eq!(result.meta.config_name, "SEQP 2017 fixture");
    assert!(!result.meta.directory_fallback);
    assert_eq!(result.summary.records, 11);
    assert_eq!(result.summary.callsigns, 5);
    assert_eq!(result.summary.stations_resolved, 20);
    assert_eq!(result.summary.stations_unresolved, 2);
    assert_eq!(result.summary.evidence_rejected, 2);
    assert_eq!(result.summary.discrepancies, 10);

    let calls: Vec<&str> = result.qths.iter().map(|q| q.callsign.as_str()).collect();
    assert_eq!(calls, ["K3JT", "K3WW", "N0BAD", "N0NE", "NJ0P", "W6RW", "W7IY"]);

    // Lowercase logged locator equal to the resolved one is not a discrepancy.
    assert!(!result
        .discrepancies
        .iter()
        .any(|d| d.record == 9 && d.role == StationRole::Remote));

    let nj0p: Vec<_> = result
        .discrepancies
        .iter()
        .filter(|d| d.callsign.as_str() == "NJ0P")
        .collect();
    assert_eq!(nj0p.len(), 1);
    assert_eq!(nj0p[0].record, 1);
    assert_eq!(nj0p[0].logged.as_deref(), Some("EM29GX"));

    // Reconciled records keep their order and the logged locators.
    let rec = &result.records[1];
    assert_eq!(rec.station(StationRole::Remote).logged_locator.as_deref(), Some("EM29GX"));
    assert_eq!(rec.station(StationRole::Remote).locator.as_ref().unwrap().as_str(), "EM29FX");
    assert_eq!(rec.log_file.as_deref(), Some("k3ww.log"));
}

#[test]
fn repeated_passes_are_identical() {
    let a = load_and_run();
    let b = load_and_run();
    assert_eq!(a.records, b.records);
    assert_eq!(a.discrepancies, b.discrepancies);
    assert_eq!(a.qths, b.qths);
}

#[test]
fn malformed_locator_does_not_move_anyone_else() {
    let full = load_and_run();

    let mut input = load_input();
    for record in &mut input.records {
        if record.stations[0].callsign.as_str() == "N0BAD" {
            record.stations[0].locator = None;
        }
    }
    let without = run(&load_config(), &input, None).unwrap();

    assert_eq!(without.summary.evidence_rejected, full.summary.evidence_rejected - 1);
    assert_eq!(without.qths.len(), full.qths.len());
    for q in &without.qths {
        assert_eq!(qth(&full, q.callsign.as_str()), q);
    }
}

#[test]
fn grid_stats_over_fixture() {
    let result = load_and_run();
    let rows = grid_stats(&result.qths);
    let labels: Vec<&str> = rows.iter().map(|r| r.source.as_str()).collect();
    assert_eq!(labels, ["submitted", "sent", "received", "unresolved", "all_sources"]);

    let all = rows.last().unwrap();
    assert_eq!((all.four_char, all.six_char, all.no_grid, all.total), (1, 4, 2, 7));
}

#[test]
fn result_serializes_for_downstream() {
    let result = load_and_run();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["summary"]["records"], 11);
    assert_eq!(json["records"][1]["stations"][1]["source"], "submitted");
    assert_eq!(json["qths"][0]["callsign"], "K3JT");
    assert!(json["qths"][0].get("lookup_failure").is_none());
}

// -------------------------------------------------------------------------
// Directory fallback through a persistent store
// -------------------------------------------------------------------------

#[test]
fn fallback_persists_hits_and_forgets_failures() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cache/location_cache.sqlite");
    let mut config = load_config();
    config.directory_fallback = true;
    let input = load_input();

    let calls = Rc::new(Cell::new(0));
    let directory = CountingDirectory {
        calls: calls.clone(),
        known: vec![("N0NE", "39.7392", "-104.9903")],
    };
    let mut cache = GeoCache::open(&db, Box::new(directory)).unwrap();
    let result = run(&config, &input, Some(&mut cache)).unwrap();

    assert!(result.meta.directory_fallback);
    assert_eq!(resolved(&result, "N0NE"), some("DM79MR", ProvenanceClass::Directory));
    let n0bad = qth(&result, "N0BAD");
    assert!(n0bad.locator.is_none());
    assert_eq!(n0bad.lookup_failure, Some(LookupFailure::NotFound("N0BAD".into())));
    // One lookup per silent callsign, however often it appears.
    assert_eq!(calls.get(), 2);
    drop(cache);

    let store = SqliteLocationStore::open(&db).unwrap();
    let n0ne = CallSign::parse("N0NE").unwrap();
    let n0bad = CallSign::parse("N0BAD").unwrap();
    assert!(store.fetch(&n0ne).unwrap().is_some());
    assert!(store.fetch(&n0bad).unwrap().is_none());

    // A fresh process reads the stored hit and retries the failure.
    let calls = Rc::new(Cell::new(0));
    let directory = CountingDirectory {
        calls: calls.clone(),
        known: vec![],
    };
    let mut cache = GeoCache::open(&db, Box::new(directory)).unwrap();
    let again = run(&config, &input, Some(&mut cache)).unwrap();
    assert_eq!(resolved(&again, "N0NE"), some("DM79MR", ProvenanceClass::Directory));
    assert_eq!(calls.get(), 1);
    assert_eq!(cache.stats().store_hits, 1);
}
