//! JSON file backed store

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use fd_lock::RwLock;
use futures::{future::BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tokio::{sync::Mutex, task};
use tracing::{debug, warn};

use super::KeyValueStore;

/// Stores all records as one JSON object in a single file.
///
/// Every access holds an exclusive lock on a sibling `.lock` file, so stores
/// opened on the same path (from this process or another one) never lose each
/// other's writes. Writes go to a fresh temporary file in the same directory
/// which is then renamed over the original.
#[derive(Debug, Clone)]
pub struct FileStore {
    inner: Arc<StoreFiles>,
    /// Keeps one instance from tying up blocking threads on its own lock
    lock: Arc<Mutex<()>>,
}

#[derive(Debug)]
struct StoreFiles {
    path: PathBuf,
    dir: PathBuf,
    lock_path: PathBuf,
    corrupt_path: PathBuf,
}

impl FileStore {
    /// Open a store at `path`, creating parent directories as needed
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;

        debug!("Opened storage at {}", path.display());
        Ok(Self {
            inner: Arc::new(StoreFiles {
                lock_path: sibling(&path, "lock"),
                corrupt_path: sibling(&path, "corrupt"),
                dir,
                path,
            }),
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Run `op` on the records with the file lock held, writing them back when
    /// it reports a change.
    async fn locked<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Map<String, Value>) -> (T, bool) + Send + 'static,
    {
        let _guard = self.lock.lock().await;
        let files = self.inner.clone();
        task::spawn_blocking(move || files.with_records(op))
            .await
            .context("Storage task panicked")?
    }
}

impl StoreFiles {
    fn with_records<T>(&self, op: impl FnOnce(&mut Map<String, Value>) -> (T, bool)) -> Result<T> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .with_context(|| format!("Failed to open lock file {}", self.lock_path.display()))?;
        let mut lock = RwLock::new(lock_file);
        let _held = lock
            .write()
            .with_context(|| format!("Failed to lock {}", self.lock_path.display()))?;

        let mut records = self.read_all()?;
        let (result, changed) = op(&mut records);
        if changed {
            self.write_all(&records)?;
        }
        Ok(result)
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read storage from {}", self.path.display()))
            }
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                // Keep the bad file around instead of overwriting it on the next write
                fs::rename(&self.path, &self.corrupt_path).with_context(|| {
                    format!("Failed to move unreadable storage {} aside", self.path.display())
                })?;
                warn!(
                    "Storage file {} is not a JSON object, moved it to {} and starting empty",
                    self.path.display(),
                    self.corrupt_path.display()
                );
                Ok(Map::new())
            }
        }
    }

    fn write_all(&self, records: &Map<String, Value>) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(records)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Failed to create temporary file in {}", self.dir.display()))?;
        tmp.write_all(&serialized)
            .and_then(|_| tmp.as_file().sync_all())
            .with_context(|| format!("Failed to write {}", tmp.path().display()))?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace storage at {}", self.path.display()))?;
        Ok(())
    }
}

/// `storage.json` -> `storage.json.{suffix}`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

impl KeyValueStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
        let key = key.to_string();
        self.locked(move |records| (records.remove(&key), false)).boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<()>> {
        let key = key.to_string();
        self.locked(move |records| {
            records.insert(key, value);
            ((), true)
        })
        .boxed()
    }

    fn remove<'a>(&'a self, keys: &'a [&'a str]) -> BoxFuture<'a, Result<()>> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        self.locked(move |records| {
            for key in &keys {
                records.remove(key);
            }
            ((), true)
        })
        .boxed()
    }
}
