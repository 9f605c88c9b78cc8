use std::collections::HashMap;

use tracing::info;

use leavesync_core::time::now;
use leavesync_core::SyncError;

use crate::engine::{log_lock_busy, SyncEngine};

#[derive(Debug)]
pub enum CheckOutcome {
    IndexEmpty,
    LockBusy,
    Completed { checked: usize, changed: usize },
}

/// Runs one status-check cycle (§4.8): re-verifies every still-active
/// approval against the fresh upstream detail, using the *stored* date
/// slots rather than whatever the fresh fetch reparses (the stored slots
/// are authoritative for an already-tracked approval).
pub async fn run_status_check_cycle(engine: &SyncEngine) -> Result<CheckOutcome, SyncError> {
    let index_snapshot = engine.active_index_store.load()?;
    if index_snapshot.approvals.is_empty() {
        return Ok(CheckOutcome::IndexEmpty);
    }

    let Some(result) = engine.lock.with_lock(|| run_locked(engine)).await else {
        log_lock_busy("status checker");
        return Ok(CheckOutcome::LockBusy);
    };
    result
}

async fn run_locked(engine: &SyncEngine) -> Result<CheckOutcome, SyncError> {
    let mut index = engine.active_index_store.load()?;
    let sp_nos: Vec<String> = index.approvals.keys().cloned().collect();
    let checked = sp_nos.len();

    let fresh = engine
        .client
        .fetch_details_status_check(&sp_nos)
        .await
        .map_err(SyncError::from)?;
    let fresh_by_sp_no: HashMap<String, _> = fresh.into_iter().map(|r| (r.sp_no.clone(), r)).collect();

    let mut doc = engine.leave_store.load()?;
    let mut changed = 0usize;
    let ts = now();

    for sp_no in sp_nos {
        let Some(fresh_record) = fresh_by_sp_no.get(&sp_no) else {
            continue; // transient miss, tolerated — entry stays for next tick
        };
        let Some(stored) = index.approvals.get_mut(&sp_no) else {
            continue;
        };

        if fresh_record.current_status == stored.current_status {
            stored.last_checked = ts;
            stored.last_checked_time = leavesync_core::time::to_iso(ts);
            continue;
        }

        changed += 1;
        let status_text = fresh_record.current_status.as_text().to_string();
        let user_slots = doc.leave_data.entry(stored.userid.clone()).or_default();
        for slot in &stored.leave_dates {
            user_slots.insert(slot.clone(), status_text.clone());
        }

        stored.current_status = fresh_record.current_status;
        stored.status_text = status_text;
        stored.last_checked = ts;
        stored.last_checked_time = leavesync_core::time::to_iso(ts);
    }

    index
        .approvals
        .retain(|_, record| !record.current_status.is_terminal());

    if changed > 0 {
        doc.touch(ts);
        engine.leave_store.save(&doc)?;
    }
    engine.active_index_store.save(&index)?;

    info!(checked, changed, "status-check cycle complete");
    Ok(CheckOutcome::Completed { checked, changed })
}
