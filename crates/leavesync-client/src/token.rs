use tokio::sync::RwLock;
use tracing::{info, warn};

use leavesync_core::constants::TOKEN_REFRESH_MARGIN_SECS;
use leavesync_core::time::now;
use leavesync_core::Timestamp;

use crate::error::ClientError;

struct CachedToken {
    value: String,
    expires_at: Timestamp,
}

/// Caches the upstream access token, re-issuing it once its remaining
/// lifetime drops below a 5-minute margin (§4.2). Readers never block each
/// other; the worst case on a cache miss is a handful of redundant
/// concurrent re-issues, which is an acceptable race per the concurrency
/// model's "shared caches are racy-safe" rule.
pub struct TokenCache {
    inner: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Option<String> {
        let guard = self.inner.read().await;
        match guard.as_ref() {
            Some(t) if t.expires_at - now() > TOKEN_REFRESH_MARGIN_SECS => Some(t.value.clone()),
            _ => None,
        }
    }

    pub async fn set(&self, value: String, expires_in_secs: i64) {
        let mut guard = self.inner.write().await;
        info!(expires_in_secs, "refreshed upstream access token");
        *guard = Some(CachedToken {
            value,
            expires_at: now() + expires_in_secs,
        });
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

/// Requests a fresh token from upstream via `(corp_id, secret)`.
pub async fn fetch_token(
    http: &reqwest::Client,
    base_url: &str,
    corp_id: &str,
    secret: &str,
) -> Result<(String, i64), ClientError> {
    let url = format!("{base_url}/cgi-bin/gettoken");
    let resp = http
        .get(&url)
        .query(&[("corpid", corp_id), ("corpsecret", secret)])
        .send()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    let parsed: TokenResponse = resp
        .json()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    if parsed.errcode != 0 {
        warn!(code = parsed.errcode, msg = %parsed.errmsg, "token request rejected");
        return Err(ClientError::Auth {
            code: parsed.errcode,
            message: parsed.errmsg,
        });
    }
    Ok((parsed.access_token, parsed.expires_in))
}
