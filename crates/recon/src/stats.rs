use std::collections::BTreeMap;

use qsogrid_core::ProvenanceClass;

use crate::evidence::EvidenceIndex;
use crate::model::{Discrepancy, GridStatsRow, ReconSummary, ReconciledRecord, ResolvedQth};

const UNRESOLVED: &str = "unresolved";
const ALL_SOURCES: &str = "all_sources";

/// Pass totals over the reconciled records.
pub fn compute_summary(
    records: &[ReconciledRecord],
    discrepancies: &[Discrepancy],
    index: &EvidenceIndex,
) -> ReconSummary {
    let mut stations_resolved = 0;
    let mut stations_unresolved = 0;
    let mut by_source: BTreeMap<String, usize> = BTreeMap::new();

    for station in records.iter().flat_map(|r| r.stations.iter()) {
        match station.source {
            Some(class) if station.locator.is_some() => {
                stations_resolved += 1;
                *by_source.entry(class.to_string()).or_insert(0) += 1;
            }
            _ => stations_unresolved += 1,
        }
    }

    ReconSummary {
        records: records.len(),
        callsigns: index.callsigns().len(),
        stations_resolved,
        stations_unresolved,
        discrepancies: discrepancies.len(),
        evidence_rejected: index.rejected(),
        by_source,
    }
}

/// Locator precision per provenance class over a QTH table.
///
/// One row per class that occurs (in arbitration order, then directory,
/// then unresolved), followed by an `all_sources` total.
pub fn grid_stats(qths: &[ResolvedQth]) -> Vec<GridStatsRow> {
    let mut rows: BTreeMap<Bucket, GridStatsRow> = BTreeMap::new();
    let mut all = row(ALL_SOURCES);

    for qth in qths {
        let bucket = match (qth.source, &qth.locator) {
            (Some(class), Some(_)) => Bucket::Class(class),
            _ => Bucket::Unresolved,
        };
        let precision = qth.locator.as_ref().map(|l| l.precision());
        for target in [rows.entry(bucket).or_insert_with(|| row(&bucket.label())), &mut all] {
            match precision {
                Some(4) => target.four_char += 1,
                Some(_) => target.six_char += 1,
                None => target.no_grid += 1,
            }
            target.total += 1;
        }
    }

    let mut out: Vec<GridStatsRow> = rows.into_values().collect();
    out.push(all);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Bucket {
    Class(ProvenanceClass),
    Unresolved,
}

impl Bucket {
    fn label(&self) -> String {
        match self {
            Self::Class(class) => class.to_string(),
            Self::Unresolved => UNRESOLVED.to_string(),
        }
    }
}

fn row(source: &str) -> GridStatsRow {
    GridStatsRow {
        source: source.to_string(),
        four_char: 0,
        six_char: 0,
        no_grid: 0,
        total: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsogrid_core::{CallSign, GridLocator};

    fn qth(call: &str, locator: Option<&str>, source: Option<ProvenanceClass>) -> ResolvedQth {
        let mut q = ResolvedQth::unresolved(CallSign::parse(call).unwrap());
        q.locator = locator.and_then(GridLocator::parse);
        q.source = source;
        q
    }

    #[test]
    fn grid_stats_rows_in_class_order() {
        let qths = vec![
            qth("K3JT", Some("EM99XO"), Some(ProvenanceClass::Received)),
            qth("NJ0P", Some("EM29"), Some(ProvenanceClass::Submitted)),
            qth("W6RW", Some("DM22QR"), Some(ProvenanceClass::Submitted)),
            qth("N0NE", None, None),
            qth("AA3B", Some("FN20EI"), Some(ProvenanceClass::Directory)),
        ];
        let rows = grid_stats(&qths);
        let labels: Vec<&str> = rows.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(labels, ["submitted", "received", "directory", "unresolved", "all_sources"]);

        assert_eq!((rows[0].four_char, rows[0].six_char, rows[0].total), (1, 1, 2));
        assert_eq!((rows[3].no_grid, rows[3].total), (1, 1));

        let all = rows.last().unwrap();
        assert_eq!(
            (all.four_char, all.six_char, all.no_grid, all.total),
            (1, 3, 1, 5)
        );
    }

    #[test]
    fn empty_table_has_only_totals() {
        let rows = grid_stats(&[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, "all_sources");
        assert_eq!(rows[0].total, 0);
    }
}
