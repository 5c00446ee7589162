/// Workflow configuration constants

/// Default storage root when neither config nor CLI names one
pub const DEFAULT_DATA_DIR: &str = "/data/approvals";

/// Prefix of auto-generated training reference numbers, e.g. `TRN/2026/1A2B3C4D`
pub const DEFAULT_TRAINING_REFERENCE_PREFIX: &str = "TRN";

/// Upper bound on free-text comments accepted by any step
pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Signatures arrive from the signature pad as data URLs
pub const SIGNATURE_DATA_URL_PREFIX: &str = "data:image/";

/// Oldest leave year a GCR submission may claim
pub const EARLIEST_LEAVE_YEAR: i32 = 2000;
