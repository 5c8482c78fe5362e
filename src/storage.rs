//! Account snapshot persistence
//!
//! Flat JSON snapshots: an array of `{username, points, gamble_loss}` records. Writes go to a
//! temporary file in the target directory which is then renamed over the old snapshot, so a
//! crash mid-write never leaves a truncated file behind.

use crate::{errors::StorageError, ledger::Account};
use std::{
    fs,
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::info;

/// Loads and saves full account snapshots
pub trait AccountStore: Send + Sync {
    fn load_accounts(&self) -> Result<Vec<Account>, StorageError>;
    fn save_accounts(&self, accounts: &[Account]) -> Result<(), StorageError>;
}

/// Snapshot file on the local filesystem
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl AccountStore for JsonFileStore {
    /// A missing file is a first run and yields no accounts
    fn load_accounts(&self) -> Result<Vec<Account>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No account snapshot yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let accounts: Vec<Account> =
            serde_json::from_slice(&bytes).map_err(|source| StorageError::Decode {
                path: self.path.display().to_string(),
                source,
            })?;

        info!(count = accounts.len(), path = %self.path.display(), "Loaded accounts");
        Ok(accounts)
    }

    fn save_accounts(&self, accounts: &[Account]) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let temp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, accounts).map_err(StorageError::Encode)?;
            writer.flush().map_err(|e| self.io_error(e))?;
        }
        temp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        temp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        info!(count = accounts.len(), path = %self.path.display(), "Saved accounts");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str, points: u64, loss: u64) -> Account {
        Account {
            username: name.to_string(),
            balance: points,
            gamble_loss: loss,
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("user_data.json"));
        let accounts = vec![account("ana", 10, 0), account("bia", 0, 25)];

        store.save_accounts(&accounts).unwrap();

        assert_eq!(store.load_accounts().unwrap(), accounts);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nothing.json"));

        assert!(store.load_accounts().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_data.json");
        fs::write(&path, "{not json").unwrap();

        let result = JsonFileStore::new(&path).load_accounts();
        assert!(matches!(result, Err(StorageError::Decode { .. })));
    }

    #[test]
    fn test_reads_records_without_loss_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_data.json");
        fs::write(&path, r#"[{"username": "old", "points": 7}]"#).unwrap();

        let accounts = JsonFileStore::new(&path).load_accounts().unwrap();
        assert_eq!(accounts, vec![account("old", 7, 0)]);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("user_data.json"));

        store.save_accounts(&[account("a", 1, 0), account("b", 2, 0)]).unwrap();
        store.save_accounts(&[account("a", 5, 0)]).unwrap();

        assert_eq!(store.load_accounts().unwrap(), vec![account("a", 5, 0)]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_directory_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(matches!(store.load_accounts(), Err(StorageError::Io { .. })));
    }
}
