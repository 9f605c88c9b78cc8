use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use leavesync_core::{ApprovalNo, ApprovalRecord, Timestamp};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActiveIndexMetadata {
    pub cutoff_timestamp: Timestamp,
    pub cutoff_date: String,
}

/// Shadow map of currently-pending approvals (P1: every entry here has
/// `current_status == Pending` and `apply_time >= cutoff`), kept so terminal
/// transitions are a single lookup instead of a scan of the leave document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActiveIndex {
    #[serde(default)]
    pub metadata: ActiveIndexMetadata,
    #[serde(default)]
    pub approvals: HashMap<ApprovalNo, ApprovalRecord>,
}

impl ActiveIndex {
    pub fn with_cutoff(cutoff_timestamp: Timestamp) -> Self {
        Self {
            metadata: ActiveIndexMetadata {
                cutoff_timestamp,
                cutoff_date: leavesync_core::time::to_iso(cutoff_timestamp),
            },
            approvals: HashMap::new(),
        }
    }
}
