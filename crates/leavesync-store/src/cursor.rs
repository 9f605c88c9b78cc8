use serde::{Deserialize, Serialize};

use leavesync_core::Timestamp;

/// The end-timestamp of the most recent successful incremental poll window,
/// plus running counters surfaced by the status endpoint.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SyncCursor {
    pub last_sync_end_timestamp: Timestamp,
    pub last_sync_time: Option<String>,
    #[serde(default)]
    pub total_synced: u64,
    #[serde(default)]
    pub successful_syncs: u64,
    #[serde(default)]
    pub failed_syncs: u64,
}

impl SyncCursor {
    pub fn at_baseline(baseline: Timestamp) -> Self {
        Self {
            last_sync_end_timestamp: baseline,
            last_sync_time: None,
            total_synced: 0,
            successful_syncs: 0,
            failed_syncs: 0,
        }
    }

    /// Advances the cursor past `window_end` and records a successful cycle.
    /// Per P5, a failed cycle must never call this — the cursor only moves
    /// forward on success.
    pub fn record_success(&mut self, window_end: Timestamp, processed: u64, now: Timestamp) {
        self.last_sync_end_timestamp = window_end;
        self.last_sync_time = Some(leavesync_core::time::to_iso(now));
        self.total_synced += processed;
        self.successful_syncs += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed_syncs += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_success_advances_cursor_and_counters() {
        let mut cursor = SyncCursor::at_baseline(1000);
        cursor.record_success(2000, 5, 9999);
        assert_eq!(cursor.last_sync_end_timestamp, 2000);
        assert_eq!(cursor.total_synced, 5);
        assert_eq!(cursor.successful_syncs, 1);
    }

    #[test]
    fn record_failure_leaves_cursor_position_unchanged() {
        let mut cursor = SyncCursor::at_baseline(1000);
        cursor.record_failure();
        assert_eq!(cursor.last_sync_end_timestamp, 1000);
        assert_eq!(cursor.failed_syncs, 1);
    }
}
