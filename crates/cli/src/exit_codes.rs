//! CLI Exit Code Registry
//!
//! Single source of truth for `qsogrid` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                        |
//! |------|------------------------------------------------|
//! | 0    | Success                                        |
//! | 1    | General error                                  |
//! | 2    | Usage error (bad args, unreadable input)       |
//! | 3    | `check-grid`: at least one locator is invalid  |
//! | 10   | Invalid pass config or settings file           |
//! | 11   | Runtime / IO failure during a pass             |
//! | 12   | Persistent location store unavailable          |
//! | 13   | Directory credentials missing                  |

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required input.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Validation (3)
// =============================================================================

/// `check-grid` saw a structurally invalid locator.
pub const EXIT_INVALID_GRID: u8 = 3;

// =============================================================================
// Resolution pass (10-19)
// =============================================================================

/// Pass config or user settings could not be parsed / validated.
pub const EXIT_INVALID_CONFIG: u8 = 10;

/// Reading sources or writing outputs failed.
pub const EXIT_RUNTIME: u8 = 11;

/// The persistent location cache could not be opened or queried.
/// Fatal to the pass; nothing is written.
pub const EXIT_STORE_UNAVAILABLE: u8 = 12;

/// A directory lookup was requested but no credentials are configured.
pub const EXIT_NO_CREDENTIALS: u8 = 13;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_INVALID_GRID,
            EXIT_INVALID_CONFIG,
            EXIT_RUNTIME,
            EXIT_STORE_UNAVAILABLE,
            EXIT_NO_CREDENTIALS,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
