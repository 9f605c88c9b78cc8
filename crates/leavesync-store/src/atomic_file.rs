use std::fs;
use std::io::Write;
use std::path::Path;

use leavesync_core::SyncError;

/// Reads and deserializes a JSON file, returning `default` if it does not
/// yet exist (first run against a fresh `DATA_DIR`).
pub fn load_json<T>(path: &Path) -> Result<T, SyncError>
where
    T: serde::de::DeserializeOwned + Default,
{
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::StoreError(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(SyncError::StoreError(format!("{}: {e}", path.display()))),
    }
}

/// Serializes `value` as pretty JSON and writes it atomically: a temp file
/// in the same directory is written and fsynced, then renamed over the
/// target. This avoids the torn-write window a direct write leaves open.
pub fn save_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), SyncError> {
    let dir = path.parent().ok_or_else(|| {
        SyncError::StoreError(format!("{} has no parent directory", path.display()))
    })?;
    fs::create_dir_all(dir).map_err(|e| SyncError::StoreError(e.to_string()))?;

    let body = serde_json::to_vec_pretty(value)
        .map_err(|e| SyncError::StoreError(format!("serialize {}: {e}", path.display())))?;

    let tmp_path = path.with_extension("tmp");
    let mut tmp = fs::File::create(&tmp_path).map_err(|e| SyncError::StoreError(e.to_string()))?;
    tmp.write_all(&body)
        .map_err(|e| SyncError::StoreError(e.to_string()))?;
    tmp.sync_all().map_err(|e| SyncError::StoreError(e.to_string()))?;
    fs::rename(&tmp_path, path).map_err(|e| SyncError::StoreError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Default, Serialize, Deserialize, PartialEq, Debug)]
    struct Doc {
        value: u32,
    }

    #[test]
    fn missing_file_loads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let loaded: Doc = load_json(&path).unwrap();
        assert_eq!(loaded, Doc::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        save_json(&path, &Doc { value: 7 }).unwrap();
        let loaded: Doc = load_json(&path).unwrap();
        assert_eq!(loaded, Doc { value: 7 });
    }

    #[test]
    fn save_leaves_no_leftover_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        save_json(&path, &Doc { value: 1 }).unwrap();
        assert!(!path.with_extension("tmp").exists());
    }
}
