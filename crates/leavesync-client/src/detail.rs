use serde::Deserialize;
use tokio::time::{sleep, Duration};

use leavesync_core::constants::RATE_LIMIT_CODE;
use leavesync_core::types::{ApprovalRecord, LeaveStatus};
use leavesync_core::time::now;

use crate::error::ClientError;
use crate::parse::{derive_date_slots, find_vacation, ApplyContent};

#[derive(Deserialize)]
struct DetailResponse {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    info: Option<DetailInfo>,
}

#[derive(Deserialize)]
struct DetailInfo {
    sp_no: String,
    sp_status: i64,
    #[serde(default)]
    sp_name: String,
    apply_time: i64,
    applicant: Option<Applicant>,
    applier: Option<Applicant>,
    applyer: Option<Applicant>,
    apply_data: ApplyData,
}

#[derive(Deserialize)]
struct Applicant {
    userid: String,
}

#[derive(Deserialize)]
struct ApplyData {
    #[serde(default)]
    contents: Vec<ApplyContent>,
}

impl DetailInfo {
    /// Both `applier` and `applyer` spellings are observed in the wild;
    /// `applier` is preferred when both are present.
    fn userid(&self) -> Option<&str> {
        self.applier
            .as_ref()
            .or(self.applicant.as_ref())
            .or(self.applyer.as_ref())
            .map(|a| a.userid.as_str())
    }
}

/// Fetches and parses one approval detail. Returns `Ok(None)` when the
/// status code is unrecognized or no vacation/date information can be
/// derived — both are "skip, not an error" per §4.3.
pub async fn approval_detail(
    http: &reqwest::Client,
    base_url: &str,
    token: &str,
    sp_no: &str,
    name_lookup: impl Fn(&str) -> (String, String),
) -> Result<Option<ApprovalRecord>, ClientError> {
    let url = format!("{base_url}/cgi-bin/oa/getapprovaldetail");
    let resp = http
        .get(&url)
        .query(&[("access_token", token), ("sp_no", sp_no)])
        .send()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    let parsed: DetailResponse = resp
        .json()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    if parsed.errcode == RATE_LIMIT_CODE {
        return Err(ClientError::RateLimit { attempts: 1 });
    }
    if parsed.errcode != 0 {
        return Err(ClientError::Api {
            code: parsed.errcode,
            message: parsed.errmsg,
        });
    }
    let info = match parsed.info {
        Some(i) => i,
        None => return Ok(None),
    };

    let status = match LeaveStatus::from_code(info.sp_status) {
        Some(s) => s,
        None => return Ok(None),
    };

    let attendance = match find_vacation(&info.apply_data.contents) {
        Some(a) => a,
        None => return Ok(None),
    };
    let leave_dates = derive_date_slots(attendance);
    if leave_dates.is_empty() {
        return Ok(None);
    }

    let userid = match info.userid() {
        Some(u) => u.to_string(),
        None => return Ok(None),
    };
    let (name, department) = name_lookup(&userid);

    Ok(Some(ApprovalRecord {
        sp_no: info.sp_no,
        userid,
        name,
        department,
        apply_time: info.apply_time,
        submit_time: info.apply_time,
        current_status: status,
        status_text: status.as_text().to_string(),
        leave_dates,
        last_checked: now(),
        last_checked_time: leavesync_core::time::to_iso(now()),
    }))
}

/// One outcome from a batch fetch: either a parsed record, a deliberate
/// skip, or an error that the caller logs and drops from the batch.
pub enum BatchOutcome {
    Record(ApprovalRecord),
    Skipped,
    Failed(ClientError),
}

/// Bulk batch fetch used by the poller: bounded concurrency with adaptive
/// inter-batch delay (grows on rate-limit hits, decays on clean batches)
/// and per-item exponential retry on rate-limit errors.
pub async fn fetch_batch_adaptive(
    http: &reqwest::Client,
    base_url: &str,
    token: &str,
    sp_nos: &[String],
    concurrency: usize,
    delay_ms: &mut u64,
    name_lookup: impl Fn(&str) -> (String, String) + Clone,
) -> Vec<BatchOutcome> {
    use futures::stream::{self, StreamExt};

    let results: Vec<BatchOutcome> = stream::iter(sp_nos.iter().cloned())
        .map(|sp_no| {
            let http = http.clone();
            let base_url = base_url.to_string();
            let token = token.to_string();
            let name_lookup = name_lookup.clone();
            async move { fetch_one_with_retry(&http, &base_url, &token, &sp_no, name_lookup).await }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let any_rate_limited = results
        .iter()
        .any(|r| matches!(r, BatchOutcome::Failed(ClientError::RateLimit { .. })));

    *delay_ms = if any_rate_limited {
        (*delay_ms * 2).min(leavesync_core::constants::BULK_MAX_DELAY_MS)
    } else {
        let decayed = (*delay_ms * leavesync_core::constants::BULK_DELAY_DECAY_NUM)
            / leavesync_core::constants::BULK_DELAY_DECAY_DEN;
        decayed.max(leavesync_core::constants::BULK_MIN_DELAY_MS)
    };
    sleep(Duration::from_millis(*delay_ms)).await;

    results
}

/// Status-check batch fetch: fixed concurrency and delay, no adaptive
/// backoff — misses are tolerated since the checker re-verifies later.
pub async fn fetch_batch_fixed(
    http: &reqwest::Client,
    base_url: &str,
    token: &str,
    sp_nos: &[String],
    name_lookup: impl Fn(&str) -> (String, String) + Clone,
) -> Vec<BatchOutcome> {
    use futures::stream::{self, StreamExt};

    let results = stream::iter(sp_nos.iter().cloned())
        .map(|sp_no| {
            let http = http.clone();
            let base_url = base_url.to_string();
            let token = token.to_string();
            let name_lookup = name_lookup.clone();
            async move { fetch_one_with_retry(&http, &base_url, &token, &sp_no, name_lookup).await }
        })
        .buffer_unordered(leavesync_core::constants::STATUS_CHECK_CONCURRENCY)
        .collect()
        .await;

    sleep(Duration::from_millis(
        leavesync_core::constants::STATUS_CHECK_DELAY_MS,
    ))
    .await;
    results
}

async fn fetch_one_with_retry(
    http: &reqwest::Client,
    base_url: &str,
    token: &str,
    sp_no: &str,
    name_lookup: impl Fn(&str) -> (String, String),
) -> BatchOutcome {
    let backoff = leavesync_core::constants::RATE_LIMIT_BACKOFF_SECS;
    let max_attempts = leavesync_core::constants::RATE_LIMIT_MAX_ATTEMPTS;

    let mut attempt = 0u32;
    loop {
        match approval_detail(http, base_url, token, sp_no, &name_lookup).await {
            Ok(Some(record)) => return BatchOutcome::Record(record),
            Ok(None) => return BatchOutcome::Skipped,
            Err(ClientError::RateLimit { .. }) if attempt < max_attempts => {
                sleep(Duration::from_secs(backoff[attempt as usize])).await;
                attempt += 1;
            }
            Err(ClientError::RateLimit { .. }) => {
                return BatchOutcome::Failed(ClientError::RateLimit { attempts: max_attempts })
            }
            Err(e) => return BatchOutcome::Failed(e),
        }
    }
}
