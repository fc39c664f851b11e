use std::collections::BTreeMap;

use qsogrid_core::{CallSign, ContactRecord, GridLocator, ProvenanceClass, Submission};

use crate::model::EvidenceKey;

/// Occurrence counts per (callsign, class), keyed by normalized locator.
pub type LocatorCounts = BTreeMap<EvidenceKey, BTreeMap<GridLocator, usize>>;

/// Count every valid locator report under its (callsign, class) bucket.
///
/// Station 0 of a record reports its own locator (`sent`); station 1's is
/// what station 0 heard (`received`); submissions are `submitted`.
/// Returns the counts and the number of malformed locators dropped.
pub fn count_locators(records: &[ContactRecord], submissions: &[Submission]) -> (LocatorCounts, usize) {
    let mut counts = LocatorCounts::new();
    let mut rejected = 0usize;

    let mut add = |callsign: &CallSign, class: ProvenanceClass, raw: &str| {
        let Some(locator) = GridLocator::parse(raw) else {
            log::debug!("{callsign}: dropping malformed {class} locator {raw:?}");
            rejected += 1;
            return;
        };
        let key = EvidenceKey {
            callsign: callsign.clone(),
            class,
        };
        *counts.entry(key).or_default().entry(locator).or_insert(0) += 1;
    };

    for record in records {
        for (role, station) in record.roles() {
            if let Some(ref raw) = station.locator {
                add(&station.callsign, role.provenance(), raw);
            }
        }
    }

    for sub in submissions {
        add(&sub.callsign, ProvenanceClass::Submitted, &sub.locator);
    }

    (counts, rejected)
}
