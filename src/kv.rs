use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PersistenceError;

const STORE_VERSION: u32 = 1;

/// Named string-set values that survive process restarts.
pub trait KeyValueStore: Send + Sync {
    fn get_string_set(&self, key: &str) -> Result<Option<BTreeSet<String>>, PersistenceError>;

    /// Returns only once the value is durably written.
    fn set_string_set(&self, key: &str, value: &BTreeSet<String>) -> Result<(), PersistenceError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get_string_set(&self, key: &str) -> Result<Option<BTreeSet<String>>, PersistenceError> {
        (**self).get_string_set(key)
    }

    fn set_string_set(&self, key: &str, value: &BTreeSet<String>) -> Result<(), PersistenceError> {
        (**self).set_string_set(key, value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// A versioned JSON document on disk, replaced atomically on every write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreFile, PersistenceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(StoreFile::default()),
            Err(source) => {
                return Err(PersistenceError::Io {
                    action: "read",
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(StoreFile::default());
        }
        let file = serde_json::from_str::<StoreFile>(&raw).map_err(|err| {
            PersistenceError::Corrupt {
                path: self.path.clone(),
                reason: err.to_string(),
            }
        })?;
        if file.version != STORE_VERSION {
            return Err(PersistenceError::Corrupt {
                path: self.path.clone(),
                reason: format!("unsupported version {}", file.version),
            });
        }
        Ok(file)
    }

    fn save(&self, file: &StoreFile) -> Result<(), PersistenceError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| PersistenceError::Io {
                action: "create directory",
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(file)?;
        write_atomically(&self.path, json.as_bytes())
    }
}

/// Writes through a sibling temp file, renames it over `path`, then syncs the
/// directory so the rename itself survives a crash. The temp file never
/// outlives a failed write.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let tmp = path.with_extension("json.tmp");
    let written = File::create(&tmp)
        .map_err(io_error("create", &tmp))
        .and_then(|mut out| {
            out.write_all(bytes).map_err(io_error("write", &tmp))?;
            out.sync_all().map_err(io_error("sync", &tmp))
        })
        .and_then(|()| fs::rename(&tmp, path).map_err(io_error("swap", path)));
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    sync_parent_dir(path)
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<(), PersistenceError> {
    let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Ok(());
    };
    File::open(dir)
        .and_then(|handle| handle.sync_all())
        .map_err(io_error("sync directory", dir))
}

// Directories cannot be opened for syncing here; the rename is as durable as it gets.
#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<(), PersistenceError> {
    Ok(())
}

fn io_error(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> PersistenceError {
    let path = path.to_path_buf();
    move |source| PersistenceError::Io {
        action,
        path,
        source,
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_string_set(&self, key: &str) -> Result<Option<BTreeSet<String>>, PersistenceError> {
        Ok(self.load()?.entries.remove(key))
    }

    fn set_string_set(&self, key: &str, value: &BTreeSet<String>) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.load()?;
        file.version = STORE_VERSION;
        file.entries.insert(key.to_string(), value.clone());
        self.save(&file)?;
        debug!(key, path = %self.path.display(), count = value.len(), "store written");
        Ok(())
    }
}

/// In-process store. Share it behind an `Arc` to simulate a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, BTreeSet<String>>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail until switched off again.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, BTreeSet<String>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string_set(&self, key: &str) -> Result<Option<BTreeSet<String>>, PersistenceError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set_string_set(&self, key: &str, value: &BTreeSet<String>) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "memory store is rejecting writes".to_string(),
            ));
        }
        self.entries().insert(key.to_string(), value.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
