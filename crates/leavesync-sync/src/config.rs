use leavesync_core::Timestamp;

/// Deployment-specific configuration the sync engine needs beyond the
/// upstream client credentials — none of these are hard-coded constants,
/// per the distilled spec's explicit instruction that the baseline is a
/// configuration field.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub incremental_baseline: Timestamp,
    pub active_index_cutoff: Timestamp,
    pub callback_recipient_id: String,
    pub manual_trigger_min_spacing_secs: i64,
}
