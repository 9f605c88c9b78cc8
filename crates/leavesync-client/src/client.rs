use std::sync::atomic::{AtomicU64, Ordering};

use leavesync_core::constants::{BULK_BASE_DELAY_MS, BULK_CONCURRENCY};
use leavesync_core::types::ApprovalRecord;
use leavesync_core::{ApprovalNo, Timestamp};

use crate::detail::{approval_detail, fetch_batch_adaptive, fetch_batch_fixed, BatchOutcome};
use crate::directory::{Directory, UNKNOWN};
use crate::error::ClientError;
use crate::list::list_approvals;
use crate::token::{fetch_token, TokenCache};

/// The upstream approval-platform HTTP client. Holds the one process-lifetime
/// token cache and the one process-lifetime directory cache described in
/// §4.2 — both are shared via `Arc<UpstreamClient>` across the schedulers
/// and the callback handler.
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    corp_id: String,
    secret: String,
    token: TokenCache,
    directory: Directory,
    bulk_delay_ms: AtomicU64,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, corp_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client builds with default TLS backend"),
            base_url: base_url.into(),
            corp_id: corp_id.into(),
            secret: secret.into(),
            token: TokenCache::new(),
            directory: Directory::new(),
            bulk_delay_ms: AtomicU64::new(BULK_BASE_DELAY_MS),
        }
    }

    /// Returns the cached token if it has more than 5 minutes left,
    /// otherwise re-issues it via `(corp_id, secret)`.
    pub async fn token(&self) -> Result<String, ClientError> {
        if let Some(t) = self.token.get().await {
            return Ok(t);
        }
        let (value, expires_in) =
            fetch_token(&self.http, &self.base_url, &self.corp_id, &self.secret).await?;
        self.token.set(value.clone(), expires_in).await;
        Ok(value)
    }

    pub async fn list_approvals(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<ApprovalNo>, ClientError> {
        let token = self.token().await?;
        list_approvals(&self.http, &self.base_url, &token, start, end).await
    }

    pub async fn approval_detail(&self, sp_no: &str) -> Result<Option<ApprovalRecord>, ClientError> {
        let token = self.token().await?;
        approval_detail(&self.http, &self.base_url, &token, sp_no, |userid| {
            self.name_department_placeholder(userid)
        })
        .await
    }

    /// Cached user/department lookup used while parsing a detail response.
    /// Synchronous callers get the `"未知"` placeholder immediately; the
    /// batch-fetch paths use [`Self::name_department`] instead, which awaits
    /// the directory cache properly.
    fn name_department_placeholder(&self, _userid: &str) -> (String, String) {
        (UNKNOWN.to_string(), UNKNOWN.to_string())
    }

    async fn name_department(&self, userid: &str) -> (String, String) {
        let token = match self.token().await {
            Ok(t) => t,
            Err(_) => return (UNKNOWN.to_string(), UNKNOWN.to_string()),
        };
        let user = self.directory.user(&self.http, &self.base_url, &token, userid).await;
        match user {
            Some(u) => {
                let dept = match u.department_ids.first().or(Some(&u.main_department_id)) {
                    Some(&id) if id != 0 => self
                        .directory
                        .department(&self.http, &self.base_url, &token, id)
                        .await
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                    _ => UNKNOWN.to_string(),
                };
                (u.name, dept)
            }
            None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
        }
    }

    /// Bulk batch fetch for the poller: adaptive concurrency/delay.
    pub async fn fetch_details_bulk(&self, sp_nos: &[String]) -> Result<Vec<ApprovalRecord>, ClientError> {
        let token = self.token().await?;
        let mut delay = self.bulk_delay_ms.load(Ordering::Relaxed);

        let outcomes = fetch_batch_adaptive(
            &self.http,
            &self.base_url,
            &token,
            sp_nos,
            BULK_CONCURRENCY,
            &mut delay,
            |_userid| (UNKNOWN.to_string(), UNKNOWN.to_string()),
        )
        .await;
        self.bulk_delay_ms.store(delay, Ordering::Relaxed);

        Ok(self.resolve_names(outcomes).await)
    }

    /// Status-check batch fetch: fixed concurrency and delay.
    pub async fn fetch_details_status_check(
        &self,
        sp_nos: &[String],
    ) -> Result<Vec<ApprovalRecord>, ClientError> {
        let token = self.token().await?;
        let outcomes = fetch_batch_fixed(&self.http, &self.base_url, &token, sp_nos, |_userid| {
            (UNKNOWN.to_string(), UNKNOWN.to_string())
        })
        .await;
        Ok(self.resolve_names(outcomes).await)
    }

    async fn resolve_names(&self, outcomes: Vec<BatchOutcome>) -> Vec<ApprovalRecord> {
        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                BatchOutcome::Record(mut record) => {
                    let (name, department) = self.name_department(&record.userid).await;
                    if record.name == UNKNOWN {
                        record.name = name;
                    }
                    if record.department == UNKNOWN {
                        record.department = department;
                    }
                    records.push(record);
                }
                BatchOutcome::Skipped => {}
                BatchOutcome::Failed(e) => {
                    tracing::warn!(error = %e, "dropping approval detail from batch");
                }
            }
        }
        records
    }
}
