use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error};
use tempfile::Builder;

use crate::Error;

/// Tracks files written to disk so a native share UI can pick them up.
///
/// Files are released once their share is dismissed; whatever is left is
/// deleted when the plugin is dropped.
#[derive(Clone, Default)]
pub struct PluginTempFileManager {
    managed_files: Arc<Mutex<Vec<PathBuf>>>,
    root: Option<PathBuf>,
}

impl PluginTempFileManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes into `root` instead of the plugin directory under the system temp dir.
    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Writes `data` to a uniquely named file whose name ends with `name`.
    pub fn materialize(&self, name: &str, data: &[u8]) -> Result<PathBuf, Error> {
        // Only the final component is kept so a name cannot escape the temp dir.
        let sanitized_name = Path::new(name)
            .file_name()
            .ok_or_else(|| Error::InvalidArgs(format!("Invalid file name: {}", name)))?
            .to_str()
            .ok_or_else(|| {
                Error::InvalidArgs("File name contains invalid UTF-8 characters.".to_string())
            })?;

        let dir = self.dir()?;
        let mut temp_file = Builder::new()
            .prefix(&format!("{}-", uuid::Uuid::new_v4()))
            .suffix(&format!("-{}", sanitized_name))
            .tempfile_in(dir)
            .map_err(|e| Error::TempFile(format!("Failed to create temp file: {}", e)))?;
        temp_file
            .write_all(data)
            .map_err(|e| Error::TempFile(format!("Failed to write to temp file: {}", e)))?;
        let (_, path) = temp_file
            .keep()
            .map_err(|e| Error::TempFile(format!("Failed to persist temp file: {}", e)))?;

        debug!("Wrote {} bytes to {}", data.len(), path.display());
        self.lock_files().push(path.clone());
        Ok(path)
    }

    pub fn managed_count(&self) -> usize {
        self.lock_files().len()
    }

    pub fn release(&self, path: &Path) -> Result<(), Error> {
        let mut files = self.lock_files();
        let index = files
            .iter()
            .position(|p| p == path)
            .ok_or_else(|| {
                Error::TempFile(format!("File not found in managed list: {}", path.display()))
            })?;
        let file_path = files.remove(index);
        std::fs::remove_file(&file_path).map_err(|e| {
            Error::TempFile(format!("Failed to delete file {}: {}", file_path.display(), e))
        })
    }

    pub fn release_all(&self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = self.release(path) {
                error!("{}", e);
            }
        }
    }

    pub fn cleanup_all_managed_files(&self) {
        let mut files = self.lock_files();
        for path in files.drain(..) {
            if let Err(e) = std::fs::remove_file(&path) {
                error!("Failed to delete file {}: {}", path.display(), e);
            }
        }
    }

    fn dir(&self) -> Result<PathBuf, Error> {
        let dir = match &self.root {
            Some(root) => root.clone(),
            None => std::env::temp_dir().join("tauri-plugin-sharekit"),
        };
        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .map_err(|e| Error::TempFile(format!("Failed to create temp dir: {}", e)))?;
        }
        Ok(dir)
    }

    fn lock_files(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        match self.managed_files.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("Temp file list was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialize_keeps_only_the_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let manager = PluginTempFileManager::in_dir(dir.path());

        let path = manager.materialize("../../etc/passwd", b"secret").unwrap();
        assert_eq!(path.parent(), Some(dir.path()));
        assert!(path.to_string_lossy().ends_with("-passwd"));
        assert_eq!(std::fs::read(&path).unwrap(), b"secret");
    }

    #[test]
    fn release_deletes_the_file_and_forgets_it() {
        let dir = tempfile::tempdir().unwrap();
        let manager = PluginTempFileManager::in_dir(dir.path());

        let path = manager.materialize("report.pdf", b"%PDF").unwrap();
        assert_eq!(manager.managed_count(), 1);
        manager.release(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(manager.managed_count(), 0);
        assert!(manager.release(&path).is_err());
    }

    #[test]
    fn cleanup_removes_everything_left() {
        let dir = tempfile::tempdir().unwrap();
        let manager = PluginTempFileManager::in_dir(dir.path());
        let shared = manager.clone();

        let a = manager.materialize("a.txt", b"a").unwrap();
        let b = shared.materialize("b.txt", b"b").unwrap();
        manager.cleanup_all_managed_files();

        assert!(!a.exists());
        assert!(!b.exists());
        assert_eq!(shared.managed_count(), 0);
    }

    #[test]
    fn empty_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manager = PluginTempFileManager::in_dir(dir.path());
        assert!(manager.materialize("..", b"").is_err());
    }
}
