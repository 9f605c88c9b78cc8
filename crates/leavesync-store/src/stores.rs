use std::path::{Path, PathBuf};

use leavesync_core::{LeaveDocument, SyncError};

use crate::active_index::ActiveIndex;
use crate::atomic_file::{load_json, save_json};
use crate::cursor::SyncCursor;

/// The three JSON files the engine persists, each loaded fresh and saved
/// atomically under the single sync lock held by the caller — see
/// `leavesync-sync` for the writer side of that contract.
pub struct LeaveStore {
    path: PathBuf,
}

impl LeaveStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("leave_document.json"),
        }
    }

    pub fn load(&self) -> Result<LeaveDocument, SyncError> {
        load_json(&self.path)
    }

    pub fn save(&self, doc: &LeaveDocument) -> Result<(), SyncError> {
        save_json(&self.path, doc)
    }
}

pub struct ActiveIndexStore {
    path: PathBuf,
}

impl ActiveIndexStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("active_index.json"),
        }
    }

    pub fn load(&self) -> Result<ActiveIndex, SyncError> {
        load_json(&self.path)
    }

    pub fn save(&self, index: &ActiveIndex) -> Result<(), SyncError> {
        save_json(&self.path, index)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

pub struct SyncCursorStore {
    path: PathBuf,
}

impl SyncCursorStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("sync_cursor.json"),
        }
    }

    pub fn load(&self) -> Result<SyncCursor, SyncError> {
        load_json(&self.path)
    }

    pub fn save(&self, cursor: &SyncCursor) -> Result<(), SyncError> {
        save_json(&self.path, cursor)
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}
