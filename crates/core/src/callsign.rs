use std::fmt;

use serde::{Deserialize, Serialize};

/// Replaces `/` in portable-operation calls (`W1AW/P`, `VE3/K1ABC`).
const PORTABLE_DELIMITER: char = '-';

/// A normalized station identifier.
///
/// Uppercase, trimmed, with path separators replaced so that `k1abc/p`
/// and `K1ABC-P` compare equal. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSign(String);

impl CallSign {
    /// Normalize a raw callsign. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let normalized: String = trimmed
            .chars()
            .map(|c| if c == '/' { PORTABLE_DELIMITER } else { c.to_ascii_uppercase() })
            .collect();
        Some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CallSign {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
