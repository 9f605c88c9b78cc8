pub mod constants;
pub mod document;
pub mod error;
pub mod time;
pub mod types;

pub use document::LeaveDocument;
pub use error::SyncError;
pub use types::{
    ApprovalNo, ApprovalRecord, DateSlot, EmployeeInfo, HalfDay, LeaveStatus, Timestamp, UserId,
};
