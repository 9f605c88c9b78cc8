use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("upstream authentication failed (code {code}): {message}")]
    Auth { code: i64, message: String },

    #[error("upstream API error (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("rate limit exhausted after {attempts} attempts")]
    RateLimit { attempts: u32 },

    #[error("requested window spans {days} days, exceeding the 31-day limit")]
    WindowTooWide { days: i64 },

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<ClientError> for leavesync_core::SyncError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Auth { code, message } => {
                leavesync_core::SyncError::AuthError { code, message }
            }
            ClientError::Api { code, message } => {
                leavesync_core::SyncError::ApiError { code, message }
            }
            ClientError::RateLimit { attempts } => {
                leavesync_core::SyncError::RateLimitError { attempts }
            }
            ClientError::WindowTooWide { days } => leavesync_core::SyncError::RangeError(format!(
                "window spans {days} days, exceeding the 31-day limit"
            )),
            ClientError::Transport(msg) => leavesync_core::SyncError::Other(msg),
        }
    }
}
