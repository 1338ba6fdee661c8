//! Protocol constants. All scores are dimensionless integers; all durations
//! are in seconds unless the name says otherwise.

/// Version reported by the registry's `protocol_version` view.
pub const PROTOCOL_VERSION: u64 = 1;

// ---------------------------------------------------------------------------
// Score ranges
// ---------------------------------------------------------------------------

/// Lowest public credit score.
pub const MIN_SCORE: u64 = 300;

/// Highest public credit score.
pub const MAX_SCORE: u64 = 850;

/// Width of the public score range (`MAX_SCORE - MIN_SCORE`).
pub const SCORE_RANGE: u64 = MAX_SCORE - MIN_SCORE;

/// Upper bound of every component score.
pub const COMPONENT_MAX: u64 = 200;

/// Denominator used when mapping the raw weighted total onto the public range.
///
/// `normalized = raw_total * SCORE_RANGE / RAW_TOTAL_SCALE + MIN_SCORE`
pub const RAW_TOTAL_SCALE: u64 = 1000;

/// Upper bound of the confidence estimate.
pub const MAX_CONFIDENCE: u64 = 100;

/// Fixed confidence reported by unauthenticated previews.
pub const PREVIEW_CONFIDENCE: u64 = 75;

// ---------------------------------------------------------------------------
// Aggregation weights (sum to WEIGHT_TOTAL)
// ---------------------------------------------------------------------------

pub const WEIGHT_TRANSACTION: u64 = 25;
pub const WEIGHT_DEFI: u64 = 20;
pub const WEIGHT_STAKING: u64 = 25;
pub const WEIGHT_RISK: u64 = 20;
pub const WEIGHT_HISTORY: u64 = 10;
pub const WEIGHT_TOTAL: u64 = 100;

// ---------------------------------------------------------------------------
// Metric bounds
// ---------------------------------------------------------------------------

/// Maximum value of percentage-like metric fields.
pub const MAX_PERCENTAGE: u64 = 100;

/// Maximum leverage ratio, where [`LEVERAGE_UNIT`] represents 1×.
pub const MAX_LEVERAGE_RATIO: u64 = 10_000;

/// Leverage ratio that represents 1× exposure.
pub const LEVERAGE_UNIT: u64 = 100;

// ---------------------------------------------------------------------------
// Data quality
// ---------------------------------------------------------------------------

/// Submissions scoring below this data quality are rejected.
pub const MIN_DATA_QUALITY: u64 = 25;

/// Maximum data quality score.
pub const MAX_DATA_QUALITY: u64 = 100;

pub const QUALITY_TX_FREQUENCY: u64 = 20;
pub const QUALITY_TX_VALUE: u64 = 15;
pub const QUALITY_CROSS_CHAIN: u64 = 10;
pub const QUALITY_DEFI_PROTOCOLS: u64 = 20;
pub const QUALITY_DEFI_BALANCE: u64 = 15;
pub const QUALITY_STAKING: u64 = 20;

// ---------------------------------------------------------------------------
// Registry policy
// ---------------------------------------------------------------------------

/// A snapshot older than this may not be used to compute a score (24 hours).
pub const FRESHNESS_WINDOW_SECS: u64 = 24 * 60 * 60;

/// Default minimum spacing between accepted submissions for one subject (1 hour).
pub const DEFAULT_MIN_UPDATE_INTERVAL_SECS: u64 = 60 * 60;

/// Lowest admissible minimum update interval (10 minutes).
pub const MIN_UPDATE_INTERVAL_FLOOR_SECS: u64 = 10 * 60;

/// Highest admissible minimum update interval (7 days).
pub const MIN_UPDATE_INTERVAL_CEIL_SECS: u64 = 7 * 24 * 60 * 60;

/// Default number of past totals retained per subject.
pub const DEFAULT_HISTORY_CAP: usize = 100;

/// Lowest admissible history cap.
pub const MIN_HISTORY_CAP: usize = 10;

/// Highest admissible history cap.
pub const MAX_HISTORY_CAP: usize = 1000;

/// Maximum number of subjects accepted by one batch computation.
pub const MAX_BATCH_SIZE: usize = 50;
