use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{DateSlot, EmployeeInfo, Timestamp, UserId};

/// The single JSON document the leave store persists. `leaveData` maps each
/// employee to their per-slot status text (not the `LeaveStatus` enum — the
/// on-disk representation is the display string, matching the upstream
/// platform's own document shape so operators can read the file directly).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LeaveDocument {
    #[serde(default)]
    pub leave_data: HashMap<UserId, HashMap<DateSlot, String>>,
    #[serde(default)]
    pub employee_info: HashMap<UserId, EmployeeInfo>,
    pub updated_at: Option<String>,
}

impl LeaveDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&mut self, now: Timestamp) {
        self.updated_at = Some(crate::time::to_iso(now));
    }
}
