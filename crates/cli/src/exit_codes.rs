//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | CLI usage error (bad args, unknown resource)             |
//! | 3    | Invalid mapping, mapping file or settings file           |
//! | 4    | Update queue could not be read or written                |
//! | 5    | Apply run had failed records (only with `--strict`)      |
//!
//! Fetch failures never produce a non-zero exit: a failing URL contributes
//! nothing and the run continues.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// Every clap parse failure maps here.
pub const EXIT_USAGE: u8 = 2;

/// Mapping failed validation, or a mapping/settings file is unreadable or malformed.
/// Always raised before any network access.
pub const EXIT_CONFIG: u8 = 3;

/// Queue store I/O failure (cache directory not writable, disk full).
pub const EXIT_STORE: u8 = 4;

/// `apply --strict` finished with at least one failed record.
pub const EXIT_APPLY_FAILURES: u8 = 5;
