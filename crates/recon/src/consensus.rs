//! Grid consensus: one locator per callsign from the evidence index, with the
//! geolocation cache as a last resort.

use std::collections::HashMap;

use qsogrid_core::{CallSign, GridLocator, ProvenanceClass};
use qsogrid_directory::LookupFailure;
use qsogrid_geocache::{GeoCache, GeoLookup};

use crate::error::ReconError;
use crate::evidence::EvidenceIndex;
use crate::model::{LocatorCount, ResolvedQth};

/// Per-pass resolver. Owns its memo; the cache handle is borrowed for the
/// pass so nothing leaks between passes.
pub struct QthResolver<'a> {
    index: &'a EvidenceIndex,
    geocache: Option<&'a mut GeoCache>,
    memo: HashMap<CallSign, ResolvedQth>,
}

impl<'a> QthResolver<'a> {
    /// `geocache == None` disables the directory fallback.
    pub fn new(index: &'a EvidenceIndex, geocache: Option<&'a mut GeoCache>) -> Self {
        Self {
            index,
            geocache,
            memo: HashMap::new(),
        }
    }

    /// Resolve one callsign. Only a store failure is an error; everything
    /// else comes back as a (possibly unresolved) value.
    pub fn find_qth(&mut self, callsign: &CallSign) -> Result<ResolvedQth, ReconError> {
        if let Some(hit) = self.memo.get(callsign) {
            return Ok(hit.clone());
        }

        let index = self.index;
        let pick = |class| index.pick_best(callsign, class).map(|e| (class, e));
        let chosen = arbitrate(
            pick(ProvenanceClass::Submitted),
            pick(ProvenanceClass::Sent),
            pick(ProvenanceClass::Received),
        );

        let resolved = match chosen {
            Some((class, entry)) => ResolvedQth {
                callsign: callsign.clone(),
                locator: Some(entry.locator.clone()),
                source: Some(class),
                count: Some(entry.count),
                coordinates: Some(entry.locator.center()),
                lookup_failure: None,
            },
            None => self.fallback(callsign)?,
        };

        self.memo.insert(callsign.clone(), resolved.clone());
        Ok(resolved)
    }

    /// Resolve every callsign in the index, sorted by callsign.
    pub fn resolve_all(&mut self) -> Result<Vec<ResolvedQth>, ReconError> {
        let index = self.index;
        index
            .callsigns()
            .into_iter()
            .map(|call| self.find_qth(call))
            .collect()
    }

    /// Number of callsigns resolved so far this pass.
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }

    /// Everything resolved so far this pass, sorted by callsign.
    pub fn table(&self) -> Vec<ResolvedQth> {
        let mut table: Vec<ResolvedQth> = self.memo.values().cloned().collect();
        table.sort_by(|a, b| a.callsign.cmp(&b.callsign));
        table
    }

    fn fallback(&mut self, callsign: &CallSign) -> Result<ResolvedQth, ReconError> {
        let mut resolved = ResolvedQth::unresolved(callsign.clone());
        let Some(cache) = self.geocache.as_deref_mut() else {
            log::debug!("{callsign}: no evidence, directory fallback off");
            return Ok(resolved);
        };

        match cache.resolve(callsign)? {
            GeoLookup::Found { coordinates, tier } => match GridLocator::from_coordinates(coordinates) {
                Some(locator) => {
                    log::debug!("{callsign}: {locator} from {tier:?} tier");
                    resolved.locator = Some(locator);
                    resolved.source = Some(ProvenanceClass::Directory);
                    resolved.coordinates = Some(coordinates);
                }
                None => {
                    log::warn!("{callsign}: cached coordinates {coordinates:?} map to no locator");
                    resolved.lookup_failure = Some(LookupFailure::InvalidCoordinates {
                        lat: Some(coordinates.lat.to_string()),
                        lon: Some(coordinates.lon.to_string()),
                    });
                }
            },
            GeoLookup::Failed { failure } => {
                log::debug!("{callsign}: unresolved ({failure})");
                resolved.lookup_failure = Some(failure);
            }
        }
        Ok(resolved)
    }
}

type Pick<'e> = Option<(ProvenanceClass, &'e LocatorCount)>;

/// Cross-class arbitration over the per-class picks.
///
/// With all three present: submitted if sent agrees, else sent if received
/// agrees, else submitted. Otherwise the first present of submitted, sent,
/// received.
fn arbitrate<'e>(submitted: Pick<'e>, sent: Pick<'e>, received: Pick<'e>) -> Pick<'e> {
    match (submitted, sent, received) {
        (Some(s), Some(t), Some(r)) => {
            if s.1.locator == t.1.locator {
                Some(s)
            } else if t.1.locator == r.1.locator {
                Some(t)
            } else {
                Some(s)
            }
        }
        (s, t, r) => s.or(t).or(r),
    }
}
