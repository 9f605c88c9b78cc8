use serde::Serialize;

use leavesync_core::Timestamp;
use leavesync_store::SyncCursor;

/// The document returned by `GET /api/sync/status` (§4.10).
#[derive(Clone, Debug, Serialize)]
pub struct SyncStatus {
    pub cursor: SyncCursor,
    pub auto_sync_enabled: bool,
    pub status_check_enabled: bool,
    pub queue_drain_running: bool,
    pub active_approval_count: usize,
    pub last_manual_trigger: Option<Timestamp>,
}
