// Storage - Uploaded document images
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{is_plain_file_name, sanitize_filename};

/// Prefix of stored image paths, relative to the data directory
const UPLOADS_PREFIX: &str = "uploads/";

/// Blob directory holding uploaded images
#[derive(Debug, Clone)]
pub struct Uploads {
    dir: PathBuf,
}

impl Uploads {
    /// Use `<data_dir>/uploads`, creating it if needed
    pub fn open_in(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("uploads");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create uploads directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store an uploaded file and return its stored path (`uploads/<uuid>-<name>`)
    pub fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let mut name = sanitize_filename(original_name);
        if !is_plain_file_name(&name) {
            name = "upload".to_string();
        }
        let file_name = format!("{}-{}", uuid::Uuid::new_v4(), name);
        let path = self.dir.join(&file_name);

        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        log::info!("Stored upload {} ({} bytes)", path.display(), bytes.len());
        Ok(format!("{}{}", UPLOADS_PREFIX, file_name))
    }

    /// Map a stored path to a file inside the uploads directory
    pub fn resolve(&self, stored_path: &str) -> Option<PathBuf> {
        let name = stored_path
            .trim_start_matches('/')
            .strip_prefix(UPLOADS_PREFIX)?;
        is_plain_file_name(name).then(|| self.dir.join(name))
    }

    /// Delete a stored file; returns whether a file was removed
    pub fn delete(&self, stored_path: &str) -> bool {
        let Some(path) = self.resolve(stored_path) else {
            log::warn!("Refusing to delete file outside uploads: {}", stored_path);
            return false;
        };
        if !path.exists() {
            return false;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Deleted upload: {}", path.display());
                true
            }
            Err(e) => {
                log::warn!("Failed to delete upload {}: {}", path.display(), e);
                false
            }
        }
    }
}
