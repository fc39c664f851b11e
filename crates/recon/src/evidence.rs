//! QTH evidence index.
//!
//! Built once per pass from the full record set and never mutated after.
//! Each (callsign, class) bucket is ordered best-first: count descending,
//! then 6-character before 4-character, then lexicographically.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use qsogrid_core::{CallSign, ContactRecord, ProvenanceClass, Submission};

use crate::aggregate::count_locators;
use crate::model::{EvidenceKey, LocatorCount};

#[derive(Debug, Clone, Default)]
pub struct EvidenceIndex {
    entries: BTreeMap<EvidenceKey, Vec<LocatorCount>>,
    rejected: usize,
}

impl EvidenceIndex {
    pub fn build(records: &[ContactRecord], submissions: &[Submission]) -> Self {
        let (counts, rejected) = count_locators(records, submissions);

        let entries: BTreeMap<_, _> = counts
            .into_iter()
            .map(|(key, locators)| {
                let mut ordered: Vec<LocatorCount> = locators
                    .into_iter()
                    .map(|(locator, count)| LocatorCount { locator, count })
                    .collect();
                // BTreeMap iteration is already lexicographic; the stable sort keeps it as the last tie-break.
                ordered.sort_by_key(|e| (Reverse(e.count), Reverse(e.locator.precision())));
                (key, ordered)
            })
            .collect();

        log::info!(
            "evidence index: {} buckets, {} callsigns, {} malformed locators dropped",
            entries.len(),
            count_callsigns(&entries),
            rejected
        );

        Self { entries, rejected }
    }

    /// Ordered evidence for one bucket; empty when none.
    pub fn get(&self, callsign: &CallSign, class: ProvenanceClass) -> &[LocatorCount] {
        let key = EvidenceKey {
            callsign: callsign.clone(),
            class,
        };
        self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Most representative locator for one bucket.
    pub fn pick_best(&self, callsign: &CallSign, class: ProvenanceClass) -> Option<&LocatorCount> {
        self.get(callsign, class).first()
    }

    /// Every callsign with evidence, sorted, once each.
    pub fn callsigns(&self) -> Vec<&CallSign> {
        let mut calls: Vec<&CallSign> = self.entries.keys().map(|k| &k.callsign).collect();
        calls.dedup();
        calls
    }

    /// Malformed locators dropped during the build.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Number of (callsign, class) buckets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn count_callsigns(entries: &BTreeMap<EvidenceKey, Vec<LocatorCount>>) -> usize {
    let mut calls: Vec<&CallSign> = entries.keys().map(|k| &k.callsign).collect();
    calls.dedup();
    calls.len()
}
