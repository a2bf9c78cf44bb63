//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | run              | Reconciliation outcome and input codes   |
//! | 10-19   | documents        | Picklist text extraction codes           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use stockfern_io::IoError;
use stockfern_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed, every candidate resolved.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (3-9)
// =============================================================================

/// Outputs were written, but some candidates are quarantined and need review.
pub const EXIT_REVIEW: u8 = 3;

/// Config file does not parse or fails validation.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Catalog sheet or candidate file cannot enter the engine
/// (missing code column, bad candidate record, negative quantity).
pub const EXIT_MALFORMED_INPUT: u8 = 5;

/// Reading an input or writing an output failed.
pub const EXIT_IO: u8 = 6;

// =============================================================================
// Documents (10-19)
// =============================================================================

/// `pdftotext` is not installed or could not be started.
pub const EXIT_PDFTOTEXT_MISSING: u8 = 10;

/// `pdftotext` ran but failed on the file.
pub const EXIT_PDFTOTEXT_FAILED: u8 = 11;

/// PDF produced no text (scanned/image-only).
pub const EXIT_PDF_NO_TEXT: u8 = 12;

// =============================================================================
// Error mapping
// =============================================================================

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::MalformedInput { .. } => EXIT_MALFORMED_INPUT,
    }
}

/// Map an import/export error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. } | IoError::Write { .. } => EXIT_IO,
        IoError::UnsupportedFormat(_) => EXIT_USAGE,
    }
}
