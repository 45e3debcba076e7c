//! # Campaign Primitives
//!
//! Fixed constants of the radon monitoring workflow.
//!
//! These values are compiled into the binary. Anything an operator may want
//! to tune per installation (stock baseline, operator name, storage path)
//! lives in the app configuration instead.

/// Length of one measurement phase, in calendar months.
///
/// Dosimeters placed at the start of Phase 1 are due for pickup and
/// replacement this many months later.
pub const PHASE_LENGTH_MONTHS: u32 = 6;

/// Dosimeters assumed deployed per active campaign for inventory purposes.
pub const DOSIMETERS_PER_CAMPAIGN: u32 = 12;

/// Maximum photos attached to a single dosimeter placement.
pub const MAX_PHOTOS_PER_DOSIMETER: usize = 3;

/// Stock baseline used when no configuration overrides it.
pub const DEFAULT_STOCK_BASELINE: u32 = 250;

/// Magic bytes for the binary snapshot header.
pub const MAGIC_BYTES: &[u8; 4] = b"RDON";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for free-text form fields (names, addresses, notes).
pub const MAX_TEXT_LENGTH: usize = 1024;

/// Maximum decoded size of a single photo (5 MB).
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Maximum number of dosimeters in one campaign.
pub const MAX_DOSIMETERS_PER_CAMPAIGN: usize = 500;

/// Upper bound accepted for a single reading, in Bq/m³.
///
/// Indoor radon rarely exceeds a few thousand Bq/m³; anything above this
/// is a typing error.
pub const MAX_READING_BQ_M3: u32 = 100_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"RDON");
    }

    #[test]
    fn photo_limit_is_three() {
        assert_eq!(MAX_PHOTOS_PER_DOSIMETER, 3);
    }
}
