pub mod active_index;
pub mod atomic_file;
pub mod cursor;
pub mod merger;
pub mod stores;

pub use active_index::{ActiveIndex, ActiveIndexMetadata};
pub use cursor::SyncCursor;
pub use stores::{ActiveIndexStore, LeaveStore, SyncCursorStore};
