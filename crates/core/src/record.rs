use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::callsign::CallSign;

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Evidentiary source of a locator claim.
///
/// `Directory` is only ever produced as a fallback, never stored as
/// evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceClass {
    /// Operator registration database.
    Submitted,
    /// Transmitted over the air by the station being located.
    Sent,
    /// Received and logged by the counterparty.
    Received,
    /// External directory lookup.
    Directory,
}

impl fmt::Display for ProvenanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Sent => write!(f, "sent"),
            Self::Received => write!(f, "received"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Ingestion pipeline that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    SeqpLogs,
    Rbn,
    Wspr,
    #[serde(rename = "pskreporter")]
    PskReporter,
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeqpLogs => write!(f, "seqp_logs"),
            Self::Rbn => write!(f, "rbn"),
            Self::Wspr => write!(f, "wspr"),
            Self::PskReporter => write!(f, "pskreporter"),
        }
    }
}

// ---------------------------------------------------------------------------
// Contact record
// ---------------------------------------------------------------------------

/// Which side of a contact a station sub-record describes.
///
/// Station 0 is the logging / receiving station: the locator it carries was
/// sent by that station itself. Station 1 is the counterparty: its locator
/// is what station 0 received and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationRole {
    Local,
    Remote,
}

impl StationRole {
    pub fn index(self) -> usize {
        match self {
            Self::Local => 0,
            Self::Remote => 1,
        }
    }

    /// Provenance class for a locator reported in this role.
    pub fn provenance(self) -> ProvenanceClass {
        match self {
            Self::Local => ProvenanceClass::Sent,
            Self::Remote => ProvenanceClass::Received,
        }
    }
}

/// One participant in a contact, as logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationReport {
    pub callsign: CallSign,
    /// Raw locator as logged; may be malformed.
    pub locator: Option<String>,
    pub signal_report: Option<String>,
}

impl StationReport {
    pub fn new(callsign: CallSign, locator: Option<String>, signal_report: Option<String>) -> Self {
        Self {
            callsign,
            locator: locator.filter(|l| !l.trim().is_empty()),
            signal_report: signal_report.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// One logged contact, normalized from any ingestion source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// UTC; `None` when the source timestamp could not be parsed.
    pub timestamp: Option<NaiveDateTime>,
    pub frequency_mhz: Option<f64>,
    pub mode: String,
    pub stations: [StationReport; 2],
    pub source: SourceTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_op: Option<bool>,
}

impl ContactRecord {
    pub fn station(&self, role: StationRole) -> &StationReport {
        &self.stations[role.index()]
    }

    /// Both sub-records with their roles.
    pub fn roles(&self) -> [(StationRole, &StationReport); 2] {
        [
            (StationRole::Local, &self.stations[0]),
            (StationRole::Remote, &self.stations[1]),
        ]
    }
}

/// One operator-registration row: the locator a station says it operated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub callsign: CallSign,
    /// Raw locator as entered; may be malformed.
    pub locator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_provenance() {
        assert_eq!(StationRole::Local.provenance(), ProvenanceClass::Sent);
        assert_eq!(StationRole::Remote.provenance(), ProvenanceClass::Received);
    }

    #[test]
    fn blank_fields_dropped() {
        let s = StationReport::new(CallSign::parse("K3JT").unwrap(), Some("  ".into()), Some("".into()));
        assert!(s.locator.is_none());
        assert!(s.signal_report.is_none());
    }

    #[test]
    fn display_tags() {
        assert_eq!(ProvenanceClass::Submitted.to_string(), "submitted");
        assert_eq!(SourceTag::PskReporter.to_string(), "pskreporter");
        assert_eq!(SourceTag::SeqpLogs.to_string(), "seqp_logs");
    }
}
