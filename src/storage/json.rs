use std::{
    fs::{self, OpenOptions, rename, write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use uuid::Uuid;

use crate::storage::{Storage, StorageError};

/// Number of previous versions kept per document
const BACKUPS_PER_KEY: usize = 5;

/// One `<key>.json` file per document inside a data directory
#[derive(Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Creates the data directory if it doesn't exist yet
    pub fn open(root: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).map_err(|e| StorageError::CreateDirFailed {
            path: root.clone(),
            source: e,
        })?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn create_backup_dir(&self) -> Result<(), StorageError> {
        let backups_dir = self.get_backup_dir();
        fs::create_dir(&backups_dir).map_err(|e| StorageError::BackupFailed {
            path: backups_dir,
            source: e,
        })?;
        Ok(())
    }

    fn create_backup(&self, key: &str) -> Result<u64, StorageError> {
        let path = self.document_path(key);
        let file_exists = fs::exists(&path).map_err(|e| StorageError::BackupFailed {
            path: path.clone(),
            source: e,
        })?;
        if !file_exists {
            return Ok(0);
        }

        let backup_path = self.get_backup_path(key);
        let copy_result = fs::copy(&path, &backup_path);
        match copy_result {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.create_backup_dir()?;
                self.create_backup(key)
            }
            Err(e) => Err(StorageError::BackupFailed {
                path: backup_path,
                source: e,
            }),
            Ok(bytes) => Ok(bytes),
        }
    }

    fn cleanup_old_backups(&self, key: &str) -> Result<(), StorageError> {
        let backup_dir = self.get_backup_dir();
        let backup_dir_exists =
            fs::exists(&backup_dir).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        if !backup_dir_exists {
            return Ok(());
        }

        let prefix = format!("{key}-");
        let mut file_entries = fs::read_dir(&backup_dir)
            .map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?
            .flatten()
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect::<Vec<_>>();

        file_entries.sort();

        let number_of_files_to_delete = file_entries.len().saturating_sub(BACKUPS_PER_KEY);
        if number_of_files_to_delete == 0 {
            return Ok(());
        }

        for file_path in &file_entries[0..number_of_files_to_delete] {
            fs::remove_file(file_path).map_err(|e| StorageError::CleanupFailed {
                dir: backup_dir.clone(),
                source: e,
            })?;
        }

        Ok(())
    }

    fn get_backup_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    fn get_backup_path(&self, key: &str) -> PathBuf {
        // Fixed-width nanoseconds keep lexical order equal to age order
        let stamp = jiff::Timestamp::now().as_nanosecond();
        self.get_backup_dir()
            .join(format!("{key}-{stamp:020}.json"))
    }
}

impl Storage for JsonFileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.document_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::LoadFailed { path, source: e }),
        }
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StorageError> {
        let path = self.document_path(key);

        let unique_temp = format!("{}.tmp.{}", path.display(), Uuid::new_v4());
        let temp_path = PathBuf::from(&unique_temp);
        write(&temp_path, contents).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        let lock_file_path = path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_file_path)
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path.clone(),
                source: e,
            })?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::SaveFailed {
                path: lock_file_path,
                source: e,
            })?;

        self.create_backup(key)?;
        self.cleanup_old_backups(key)?;

        rename(&temp_path, &path).map_err(|e| StorageError::SaveFailed {
            path: path.clone(),
            source: e,
        })?;

        lock_file.unlock().map_err(|e| StorageError::SaveFailed {
            path: path.clone(),
            source: e,
        })?;

        tracing::debug!(key, path = %path.display(), "document written");
        Ok(())
    }
}
