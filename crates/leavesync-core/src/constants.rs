//! ─── Leave-sync engine constants ────────────────────────────────────────────

/// Maximum width of a single `listApprovals` window, in days. Wider logical
/// ranges are split by the caller into non-overlapping chunks of this size.
pub const MAX_WINDOW_DAYS: i64 = 31;

/// Page size for `listApprovals` pagination.
pub const LIST_PAGE_SIZE: u32 = 100;

/// Pause between successive `listApprovals` pages.
pub const LIST_PAGE_PAUSE_MS: u64 = 200;

/// Pause inserted between chunked date-range calls.
pub const CHUNK_PAUSE_MS: u64 = 500;

/// Token is refreshed once its remaining lifetime drops below this many seconds.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Upstream's rate-limit application error code.
pub const RATE_LIMIT_CODE: i64 = 45009;

/// Maximum retry attempts for a rate-limited item.
pub const RATE_LIMIT_MAX_ATTEMPTS: u32 = 3;

/// Exponential back-off schedule (seconds) for rate-limited retries.
pub const RATE_LIMIT_BACKOFF_SECS: [u64; 3] = [2, 4, 8];

// ── Bulk batch fetch (poller) ─────────────────────────────────────────────────

pub const BULK_CONCURRENCY: usize = 3;
pub const BULK_BASE_DELAY_MS: u64 = 100;
pub const BULK_MAX_DELAY_MS: u64 = 500;
pub const BULK_MIN_DELAY_MS: u64 = 50;
/// Decay factor applied to the inter-batch delay after a clean batch.
pub const BULK_DELAY_DECAY_NUM: u64 = 3;
pub const BULK_DELAY_DECAY_DEN: u64 = 4;

// ── Status-check batch fetch ───────────────────────────────────────────────────

pub const STATUS_CHECK_CONCURRENCY: usize = 5;
pub const STATUS_CHECK_DELAY_MS: u64 = 50;

// ── Schedulers ────────────────────────────────────────────────────────────────

pub const DEFAULT_SYNC_INTERVAL_CRON: &str = "0 */5 * * * *";
pub const DEFAULT_STATUS_CHECK_INTERVAL_CRON: &str = "0 */5 * * * *";

/// Delay after process start before the first scheduled tick fires.
pub const SCHEDULER_INITIAL_DELAY_SECS: u64 = 5;

/// Queue-drain tick interval for the callback handler's busy-lock queue.
pub const QUEUE_DRAIN_INTERVAL_SECS: u64 = 2;

// ── HTTP surface rate limiting ─────────────────────────────────────────────────

/// Minimum spacing between accepted manual-trigger requests.
pub const MANUAL_TRIGGER_MIN_SPACING_SECS: i64 = 10;

// ── Crypto ────────────────────────────────────────────────────────────────────

/// AES block / PKCS#7 pad size used by the callback wire protocol (32, not
/// the usual AES block size of 16 — this is the upstream platform's choice).
pub const PKCS7_BLOCK_SIZE: usize = 32;

/// Length of the random prefix prepended to every encrypted payload.
pub const RANDOM_PREFIX_LEN: usize = 16;

/// Length of the big-endian message-length field following the random prefix.
pub const MESSAGE_LEN_FIELD_LEN: usize = 4;

/// Status-change event code denoting a comment-only callback (no state change).
pub const STATUS_CHANGE_EVENT_COMMENT: i64 = 10;

/// Upstream record type value this system tracks; all others are ignored.
pub const RECORD_TYPE_LEAVE: &str = "leave";

/// Half-day slice duration in seconds (12:00:00), per the upstream's
/// `attendance.slice_info.day_items[*].duration` encoding.
pub const HALF_DAY_DURATION_SECS: i64 = 43_200;
