// Text decoding, CSV header lookup and timestamp parsing shared by the readers

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};

use crate::error::IngestError;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IngestError> {
    let read_err = |source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    Ok(decode(bytes))
}

/// UTF-8 if possible, otherwise Windows-1252 (common for hand-edited logs).
pub fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Parse a spot / submission timestamp (UTC).
///
/// Accepts the common `YYYY-MM-DD HH:MM[:SS]` spellings, RFC 3339, and
/// Unix epoch seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in TIMESTAMP_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t);
        }
    }

    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.naive_utc());
    }

    let secs: f64 = s.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp(secs.trunc() as i64, 0).map(|t| t.naive_utc())
}

/// Header row of a CSV input, looked up by alias.
pub(crate) struct Columns {
    input: String,
    headers: Vec<String>,
}

impl Columns {
    pub(crate) fn from_reader<R: Read>(
        reader: &mut csv::Reader<R>,
        input: &str,
    ) -> Result<Self, IngestError> {
        let headers = reader
            .headers()
            .map_err(|e| IngestError::Csv {
                input: input.to_string(),
                message: e.to_string(),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        Ok(Self {
            input: input.to_string(),
            headers,
        })
    }

    /// Index of the first alias present. Earlier aliases win.
    pub(crate) fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|alias| {
            self.headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(alias))
        })
    }

    pub(crate) fn require(&self, aliases: &[&str]) -> Result<usize, IngestError> {
        self.find(aliases).ok_or_else(|| IngestError::MissingColumn {
            input: self.input.clone(),
            column: aliases.first().copied().unwrap_or_default().to_string(),
        })
    }

    pub(crate) fn csv_error(&self, err: csv::Error) -> IngestError {
        IngestError::Csv {
            input: self.input.clone(),
            message: err.to_string(),
        }
    }
}

/// Trimmed, non-empty field.
pub(crate) fn field(record: &csv::StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
