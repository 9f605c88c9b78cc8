use serde::Deserialize;
use tokio::time::{sleep, Duration};

use leavesync_core::constants::{LIST_PAGE_PAUSE_MS, LIST_PAGE_SIZE, MAX_WINDOW_DAYS, RECORD_TYPE_LEAVE};
use leavesync_core::{ApprovalNo, SyncError, Timestamp};

use crate::error::ClientError;

#[derive(Deserialize)]
struct ListResponse {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    sp_no_list: Vec<String>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    record_type: Option<i64>,
}

/// Paginates `listApprovals` for one window, filtering to record-type
/// "leave" and returning the flat list of approval numbers.
pub async fn list_approvals(
    http: &reqwest::Client,
    base_url: &str,
    token: &str,
    start: Timestamp,
    end: Timestamp,
) -> Result<Vec<ApprovalNo>, ClientError> {
    if end - start > MAX_WINDOW_DAYS * 86_400 {
        return Err(ClientError::WindowTooWide {
            days: (end - start) / 86_400,
        });
    }

    let url = format!("{base_url}/cgi-bin/oa/getapprovalinfo");
    let mut cursor: Option<String> = None;
    let mut out = Vec::new();

    loop {
        let body = serde_json::json!({
            "starttime": start,
            "endtime": end,
            "cursor": cursor.clone().unwrap_or_default(),
            "size": LIST_PAGE_SIZE,
            "filters": [{ "key": "record_type", "value": RECORD_TYPE_LEAVE }],
        });

        let resp = http
            .post(&url)
            .query(&[("access_token", token)])
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let parsed: ListResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if parsed.errcode != 0 {
            return Err(ClientError::Api {
                code: parsed.errcode,
                message: parsed.errmsg,
            });
        }

        out.extend(parsed.sp_no_list);

        match parsed.next_cursor.filter(|c| !c.is_empty()) {
            Some(next) => {
                cursor = Some(next);
                sleep(Duration::from_millis(LIST_PAGE_PAUSE_MS)).await;
            }
            None => break,
        }
    }

    Ok(out)
}

/// One non-overlapping sub-window, inclusive on both ends with a
/// 1-second boundary between consecutive chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Splits `[start, end]` into chunks no wider than [`MAX_WINDOW_DAYS`] days,
/// per L3: a window exactly at the limit is returned unchanged; anything
/// wider is split with no gap or overlap.
pub fn split_window(start: Timestamp, end: Timestamp) -> Result<Vec<Window>, SyncError> {
    if end < start {
        return Err(SyncError::RangeError(format!(
            "end {end} precedes start {start}"
        )));
    }
    let max_span = MAX_WINDOW_DAYS * 86_400;
    let mut chunks = Vec::new();
    let mut cursor = start;
    while end - cursor > max_span {
        let chunk_end = cursor + max_span;
        chunks.push(Window {
            start: cursor,
            end: chunk_end,
        });
        cursor = chunk_end + 1;
    }
    chunks.push(Window { start: cursor, end });
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_31_day_window_is_not_split() {
        let start = 0;
        let end = 31 * 86_400;
        let chunks = split_window(start, end).unwrap();
        assert_eq!(chunks, vec![Window { start, end }]);
    }

    #[test]
    fn a_31_day_plus_one_second_window_splits_into_two_with_no_gap() {
        let start = 0;
        let end = 31 * 86_400 + 1;
        let chunks = split_window(start, end).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].end + 1, chunks[1].start);
        assert_eq!(chunks[1].end, end);
    }

    #[test]
    fn a_40_day_window_splits_cleanly() {
        let start = 0;
        let end = 40 * 86_400;
        let chunks = split_window(start, end).unwrap();
        for w in &chunks {
            assert!(w.end - w.start <= 31 * 86_400);
        }
        assert_eq!(chunks.last().unwrap().end, end);
    }
}
