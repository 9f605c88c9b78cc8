use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use leavesync_core::time::now;
use leavesync_core::{SyncError, Timestamp};
use leavesync_client::UpstreamClient;
use leavesync_store::{ActiveIndex, ActiveIndexStore, LeaveStore, SyncCursor, SyncCursorStore};

use crate::config::SyncConfig;
use crate::lock::SyncLock;
use crate::status::SyncStatus;

/// Ties the upstream client, the three stores and the sync lock together —
/// the one long-lived object the schedulers, the callback handler and the
/// HTTP surface all share via `Arc`.
pub struct SyncEngine {
    pub client: Arc<UpstreamClient>,
    pub leave_store: LeaveStore,
    pub active_index_store: ActiveIndexStore,
    pub cursor_store: SyncCursorStore,
    pub lock: Arc<SyncLock>,
    pub config: SyncConfig,
    auto_sync_enabled: AtomicBool,
    status_check_enabled: AtomicBool,
    last_manual_trigger: Mutex<Option<Timestamp>>,
    pub callback_queue: Mutex<Vec<(String, i64)>>,
}

impl SyncEngine {
    pub fn new(
        client: Arc<UpstreamClient>,
        data_dir: impl AsRef<std::path::Path>,
        config: SyncConfig,
    ) -> Self {
        let cursor_store = SyncCursorStore::new(&data_dir);
        if !cursor_store.exists() {
            let cursor = SyncCursor::at_baseline(config.incremental_baseline);
            if let Err(e) = cursor_store.save(&cursor) {
                warn!(error = %e, "failed to seed sync cursor with configured baseline");
            }
        }

        let active_index_store = ActiveIndexStore::new(&data_dir);
        if !active_index_store.exists() {
            let index = ActiveIndex::with_cutoff(config.active_index_cutoff);
            if let Err(e) = active_index_store.save(&index) {
                warn!(error = %e, "failed to seed active index with configured cutoff");
            }
        }

        Self {
            client,
            leave_store: LeaveStore::new(&data_dir),
            active_index_store,
            cursor_store,
            lock: Arc::new(SyncLock::new()),
            config,
            auto_sync_enabled: AtomicBool::new(true),
            status_check_enabled: AtomicBool::new(true),
            last_manual_trigger: Mutex::new(None),
            callback_queue: Mutex::new(Vec::new()),
        }
    }

    pub fn auto_sync_enabled(&self) -> bool {
        self.auto_sync_enabled.load(Ordering::Relaxed)
    }

    pub fn set_auto_sync_enabled(&self, enabled: bool) {
        info!(enabled, "incremental poll scheduler toggled");
        self.auto_sync_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn status_check_enabled(&self) -> bool {
        self.status_check_enabled.load(Ordering::Relaxed)
    }

    pub fn set_status_check_enabled(&self, enabled: bool) {
        info!(enabled, "status-check scheduler toggled");
        self.status_check_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Enforces the 10s-minimum-spacing rule on `POST /api/sync/trigger`
    /// (429 at the HTTP boundary if violated). Records the attempt time
    /// whether or not the lock is ultimately acquired, matching the
    /// "spacing between accepted requests" framing in §5.
    pub async fn check_manual_trigger_spacing(&self) -> Result<(), SyncError> {
        let mut guard = self.last_manual_trigger.lock().await;
        let t = now();
        if let Some(last) = *guard {
            if t - last < self.config.manual_trigger_min_spacing_secs {
                return Err(SyncError::Throttled(format!(
                    "{}s since last trigger, minimum is {}s",
                    t - last,
                    self.config.manual_trigger_min_spacing_secs
                )));
            }
        }
        *guard = Some(t);
        Ok(())
    }

    pub async fn reset_cursor(&self) -> Result<(), SyncError> {
        let cursor = leavesync_store::SyncCursor::at_baseline(self.config.incremental_baseline);
        self.cursor_store.save(&cursor)?;
        Ok(())
    }

    pub async fn status(&self) -> Result<SyncStatus, SyncError> {
        let cursor = self.cursor_store.load()?;
        let index = self.active_index_store.load()?;
        let last_manual_trigger = *self.last_manual_trigger.lock().await;
        Ok(SyncStatus {
            cursor,
            auto_sync_enabled: self.auto_sync_enabled(),
            status_check_enabled: self.status_check_enabled(),
            queue_drain_running: true,
            active_approval_count: index.approvals.len(),
            last_manual_trigger,
        })
    }

    pub async fn active_approvals(&self) -> Result<Vec<leavesync_core::ApprovalRecord>, SyncError> {
        let index = self.active_index_store.load()?;
        Ok(index.approvals.into_values().collect())
    }
}

pub(crate) fn log_lock_busy(context: &str) {
    warn!(context, "sync lock busy, skipping cycle");
}
