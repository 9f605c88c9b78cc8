use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Upstream-assigned approval number. Opaque string, not parsed.
pub type ApprovalNo = String;

/// Upstream-assigned user identifier. Opaque string, not parsed.
pub type UserId = String;

// ── LeaveStatus ──────────────────────────────────────────────────────────────

/// The lifecycle status of one leave-day, mirrored from the upstream
/// approval-platform status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
    RevokedAfterApproval,
    Deleted,
    Paid,
}

impl LeaveStatus {
    /// Map an upstream approval status code to a [`LeaveStatus`].
    /// Unknown codes return `None` — the caller skips the approval.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Pending),
            2 => Some(Self::Approved),
            3 => Some(Self::Rejected),
            4 => Some(Self::Withdrawn),
            6 => Some(Self::RevokedAfterApproval),
            7 => Some(Self::Deleted),
            10 => Some(Self::Paid),
            _ => None,
        }
    }

    /// Human-readable text stored in the leave document.
    pub fn as_text(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Withdrawn => "Withdrawn",
            Self::RevokedAfterApproval => "RevokedAfterApproval",
            Self::Deleted => "Deleted",
            Self::Paid => "Paid",
        }
    }

    /// Every status except `Pending` is terminal — once a status in this set
    /// is observed for an approval, the active-index entry is retired.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

// ── DateSlot ─────────────────────────────────────────────────────────────────

/// Which half of the day a half-day slot covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalfDay {
    Am,
    Pm,
}

/// A canonical key for one calendar day or half-day of one employee's leave,
/// e.g. `"2026-2.14"` or `"2026-2.14 (AM)"`.
///
/// A full-day slot and a half-day slot on the same calendar date are distinct
/// slots — they are never merged or compared as equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateSlot(String);

impl DateSlot {
    /// Build a full-day slot for `year-month.day`.
    pub fn full_day(year: i32, month: u32, day: u32) -> Self {
        Self(format!("{year}-{month}.{day}"))
    }

    /// Build a half-day slot for `year-month.day`.
    pub fn half_day(year: i32, month: u32, day: u32, half: HalfDay) -> Self {
        let marker = match half {
            HalfDay::Am => "AM",
            HalfDay::Pm => "PM",
        };
        Self(format!("{year}-{month}.{day} ({marker})"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DateSlot {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── Employee ─────────────────────────────────────────────────────────────────

/// Cached identity of an employee as last reported by any approval
/// touching them. Upstream always wins on conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeInfo {
    pub name: String,
    pub department: String,
}

// ── ApprovalRecord ───────────────────────────────────────────────────────────

/// A still-pending approval tracked in the active index. Exists only while
/// `current_status == Pending`; deleted the instant a terminal status is
/// observed by any of the three update sources.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub sp_no: ApprovalNo,
    pub userid: UserId,
    pub name: String,
    pub department: String,
    pub apply_time: Timestamp,
    pub submit_time: Timestamp,
    pub current_status: LeaveStatus,
    pub status_text: String,
    pub leave_dates: Vec<DateSlot>,
    pub last_checked: Timestamp,
    pub last_checked_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_code_round_trips_known_codes() {
        let cases = [
            (1, LeaveStatus::Pending),
            (2, LeaveStatus::Approved),
            (3, LeaveStatus::Rejected),
            (4, LeaveStatus::Withdrawn),
            (6, LeaveStatus::RevokedAfterApproval),
            (7, LeaveStatus::Deleted),
            (10, LeaveStatus::Paid),
        ];
        for (code, expected) in cases {
            assert_eq!(LeaveStatus::from_code(code), Some(expected));
        }
    }

    #[test]
    fn status_from_unknown_code_is_none() {
        assert_eq!(LeaveStatus::from_code(99), None);
        assert_eq!(LeaveStatus::from_code(0), None);
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!LeaveStatus::Pending.is_terminal());
        for s in [
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Withdrawn,
            LeaveStatus::RevokedAfterApproval,
            LeaveStatus::Deleted,
            LeaveStatus::Paid,
        ] {
            assert!(s.is_terminal());
        }
    }

    #[test]
    fn full_day_and_half_day_slots_on_same_date_differ() {
        let full = DateSlot::full_day(2026, 2, 14);
        let half = DateSlot::half_day(2026, 2, 14, HalfDay::Am);
        assert_ne!(full, half);
        assert_eq!(full.as_str(), "2026-2.14");
        assert_eq!(half.as_str(), "2026-2.14 (AM)");
    }
}
