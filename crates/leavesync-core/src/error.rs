use thiserror::Error;

/// The taxonomy of failures the sync engine can raise. Each variant maps to
/// a stable machine code and an HTTP status at the surface layer — see
/// `leavesync-server::error` for that mapping.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── Upstream auth / API ───────────────────────────────────────────────────
    #[error("upstream authentication failed (code {code}): {message}")]
    AuthError { code: i64, message: String },

    #[error("upstream API error (code {code}): {message}")]
    ApiError { code: i64, message: String },

    #[error("upstream rate limit exhausted after {attempts} attempts")]
    RateLimitError { attempts: u32 },

    // ── Parsing / transform ───────────────────────────────────────────────────
    #[error("failed to transform approval {sp_no}: {reason}")]
    TransformError { sp_no: String, reason: String },

    // ── Crypto ────────────────────────────────────────────────────────────────
    #[error("crypto failure: {0}")]
    CryptoError(String),

    // ── Storage ───────────────────────────────────────────────────────────────
    #[error("store error: {0}")]
    StoreError(String),

    // ── Concurrency ───────────────────────────────────────────────────────────
    #[error("a sync is already in progress")]
    LockBusy,

    #[error("manual trigger throttled: {0}")]
    Throttled(String),

    // ── Caller input ──────────────────────────────────────────────────────────
    #[error("invalid time window: {0}")]
    RangeError(String),

    #[error("{0}")]
    Other(String),
}

impl SyncError {
    /// A stable, machine-readable code for this error, independent of the
    /// human-readable message (used in HTTP error bodies).
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthError { .. } => "auth_error",
            Self::ApiError { .. } => "api_error",
            Self::RateLimitError { .. } => "rate_limit_error",
            Self::TransformError { .. } => "transform_error",
            Self::CryptoError(_) => "crypto_error",
            Self::StoreError(_) => "store_error",
            Self::LockBusy => "lock_busy",
            Self::Throttled(_) => "throttled",
            Self::RangeError(_) => "range_error",
            Self::Other(_) => "other",
        }
    }
}
