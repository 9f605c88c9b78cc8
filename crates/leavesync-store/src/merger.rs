use leavesync_core::types::{ApprovalRecord, EmployeeInfo, LeaveStatus};
use leavesync_core::{LeaveDocument, Timestamp};

use crate::active_index::ActiveIndex;

/// Applies one fetched approval detail to the leave document and the active
/// index. Implements the idempotent merge rule: incoming `Approved` wins
/// unconditionally, incoming `Pending` never demotes an existing `Approved`
/// slot, and every other incoming status overwrites (P2, P3).
///
/// Also maintains P1/P4: a terminal status removes the approval from the
/// active index and every one of its slots is written with the terminal
/// status text; a non-terminal (`Pending`) status inside the cutoff window
/// is (re)inserted into the active index.
pub fn apply_approval(
    doc: &mut LeaveDocument,
    index: &mut ActiveIndex,
    record: &ApprovalRecord,
    now: Timestamp,
) {
    let approved_text = LeaveStatus::Approved.as_text();
    let user_slots = doc.leave_data.entry(record.userid.clone()).or_default();

    for slot in &record.leave_dates {
        let existing_is_approved = user_slots
            .get(slot)
            .map(|text| text == approved_text)
            .unwrap_or(false);

        let should_write = match record.current_status {
            LeaveStatus::Approved => true,
            LeaveStatus::Pending => !existing_is_approved,
            _ => true,
        };

        if should_write {
            user_slots.insert(slot.clone(), record.status_text.clone());
        }
    }

    doc.employee_info.insert(
        record.userid.clone(),
        EmployeeInfo {
            name: record.name.clone(),
            department: record.department.clone(),
        },
    );
    doc.touch(now);

    if record.current_status.is_terminal() {
        index.approvals.remove(&record.sp_no);
    } else if record.apply_time >= index.metadata.cutoff_timestamp {
        index.approvals.insert(record.sp_no.clone(), record.clone());
    } else {
        index.approvals.remove(&record.sp_no);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leavesync_core::types::DateSlot;

    fn record(status: LeaveStatus, apply_time: Timestamp) -> ApprovalRecord {
        ApprovalRecord {
            sp_no: "SP001".into(),
            userid: "alice".into(),
            name: "Alice".into(),
            department: "Eng".into(),
            apply_time,
            submit_time: apply_time,
            current_status: status,
            status_text: status.as_text().to_string(),
            leave_dates: vec![DateSlot::full_day(2026, 2, 14)],
            last_checked: apply_time,
            last_checked_time: String::new(),
        }
    }

    #[test]
    fn approved_is_sticky_against_later_pending() {
        let mut doc = LeaveDocument::new();
        let mut index = ActiveIndex::with_cutoff(0);

        apply_approval(&mut doc, &mut index, &record(LeaveStatus::Approved, 100), 1);
        apply_approval(&mut doc, &mut index, &record(LeaveStatus::Pending, 100), 2);

        let slot = DateSlot::full_day(2026, 2, 14);
        assert_eq!(
            doc.leave_data["alice"][&slot],
            LeaveStatus::Approved.as_text()
        );
    }

    #[test]
    fn terminal_status_clears_active_index_entry() {
        let mut doc = LeaveDocument::new();
        let mut index = ActiveIndex::with_cutoff(0);

        apply_approval(&mut doc, &mut index, &record(LeaveStatus::Pending, 100), 1);
        assert!(index.approvals.contains_key("SP001"));

        apply_approval(&mut doc, &mut index, &record(LeaveStatus::Approved, 100), 2);
        assert!(!index.approvals.contains_key("SP001"));
    }

    #[test]
    fn processing_the_same_detail_twice_is_idempotent() {
        let mut doc_once = LeaveDocument::new();
        let mut index_once = ActiveIndex::with_cutoff(0);
        apply_approval(&mut doc_once, &mut index_once, &record(LeaveStatus::Approved, 100), 1);

        let mut doc_twice = LeaveDocument::new();
        let mut index_twice = ActiveIndex::with_cutoff(0);
        apply_approval(&mut doc_twice, &mut index_twice, &record(LeaveStatus::Approved, 100), 1);
        apply_approval(&mut doc_twice, &mut index_twice, &record(LeaveStatus::Approved, 100), 2);

        assert_eq!(doc_once.leave_data, doc_twice.leave_data);
        assert_eq!(index_once.approvals.keys().collect::<Vec<_>>(),
                   index_twice.approvals.keys().collect::<Vec<_>>());
    }
}
