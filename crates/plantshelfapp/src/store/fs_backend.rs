use super::backend::StorageBackend;
use super::InventorySnapshot;
use crate::error::{InventoryError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stores the snapshot as one pretty-printed JSON file.
pub struct FsBackend {
    root: PathBuf,
    file_name: String,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            file_name: "inventory.json".to_string(),
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_path(&self) -> PathBuf {
        self.root.join(&self.file_name)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(InventoryError::Io)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load(&self) -> Result<Option<InventorySnapshot>> {
        let path = self.data_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(InventoryError::Io)?;
        let snapshot: InventorySnapshot =
            serde_json::from_str(&content).map_err(InventoryError::Serialization)?;
        if snapshot.version > super::SNAPSHOT_VERSION {
            return Err(InventoryError::Store(format!(
                "{} was written by a newer version (format {})",
                path.display(),
                snapshot.version
            )));
        }
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &InventorySnapshot) -> Result<()> {
        self.ensure_dir()?;
        let content =
            serde_json::to_string_pretty(snapshot).map_err(InventoryError::Serialization)?;

        // Atomic write
        let tmp_path = self.root.join(format!(".inventory-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, content).map_err(InventoryError::Io)?;
        if let Err(e) = fs::rename(&tmp_path, self.data_path()) {
            let _ = fs::remove_file(&tmp_path);
            return Err(InventoryError::Io(e));
        }
        Ok(())
    }
}
