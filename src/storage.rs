#![warn(clippy::all)]

//! Persisted client state: a small string key-value store holding settings such as `lang`.

use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use fnv::FnvHashMap;
use log::{debug, trace};
use parking_lot::RwLock;

pub use self::Error as StorageError;

/// Key under which the user's language is stored.
pub const LANG: &str = "lang";

/// Errors when reading or writing a store.
#[derive(Debug, thiserror::Error)]
#[error("Storage error")]
pub enum Error {
  /// JSON errors (e.g. when the store file is not a JSON object of strings).
  #[error("Error parsing storage file `{}`: {}", .0.display(), .1)]
  Json(PathBuf, #[source] serde_json::Error),
  /// IO errors.
  #[error("IO error on storage file `{}`: {}", .0.display(), .1)]
  Io(PathBuf, #[source] io::Error),
}

/// A string key-value store.
///
/// Implementations must not cache reads: a value set through one handle is visible to the
/// next `get` through any other handle on the same store.
pub trait Storage: Send + Sync {
  /// Get the value stored under `key`, if any.
  fn get(&self, key: &str) -> Result<Option<String>, Error>;

  /// Store `value` under `key`, replacing any previous value.
  fn set(&self, key: &str, value: &str) -> Result<(), Error>;

  /// Remove `key` from the store.
  fn remove(&self, key: &str) -> Result<(), Error>;
}

/// A store living in memory for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStorage {
  entries: RwLock<FnvHashMap<String, String>>,
}

impl MemoryStorage {
  /// Create an empty store.
  pub fn new() -> Self {
    Self::default()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStorage {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let entries = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
    Self { entries: RwLock::new(entries) }
  }
}

impl Storage for MemoryStorage {
  fn get(&self, key: &str) -> Result<Option<String>, Error> {
    Ok(self.entries.read().get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), Error> {
    self.entries.write().insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), Error> {
    self.entries.write().remove(key);
    Ok(())
  }
}

/// A store backed by a JSON object file.
///
/// The file is read on every access. A missing file is an empty store and is created on the
/// first write.
pub struct FileStorage {
  path: PathBuf,
  // Serializes read-modify-write cycles from this handle.
  lock: RwLock<()>,
}

impl FileStorage {
  /// Use the store file at `path`.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), lock: RwLock::new(()) }
  }

  /// Path of the store file.
  pub fn path(&self) -> &Path {
    &self.path
  }

  fn load(&self) -> Result<FnvHashMap<String, String>, Error> {
    let file = match fs::File::open(&self.path) {
      Ok(file) => file,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        trace!("Storage file `{}` does not exist", self.path.display());
        return Ok(FnvHashMap::default());
      }
      Err(e) => return Err(Error::Io(self.path.clone(), e)),
    };

    serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::Json(self.path.clone(), e))
  }

  fn save(&self, entries: &FnvHashMap<String, String>) -> Result<(), Error> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).map_err(|e| Error::Io(self.path.clone(), e))?;
    }

    let contents = serde_json::to_string_pretty(entries).map_err(|e| Error::Json(self.path.clone(), e))?;
    fs::write(&self.path, contents).map_err(|e| Error::Io(self.path.clone(), e))?;
    debug!("Wrote {} entries to `{}`", entries.len(), self.path.display());
    Ok(())
  }

  fn update(&self, f: impl FnOnce(&mut FnvHashMap<String, String>)) -> Result<(), Error> {
    let _guard = self.lock.write();
    let mut entries = self.load()?;
    f(&mut entries);
    self.save(&entries)
  }
}

impl Storage for FileStorage {
  fn get(&self, key: &str) -> Result<Option<String>, Error> {
    let _guard = self.lock.read();
    Ok(self.load()?.remove(key))
  }

  fn set(&self, key: &str, value: &str) -> Result<(), Error> {
    self.update(|entries| {
      entries.insert(key.to_owned(), value.to_owned());
    })
  }

  fn remove(&self, key: &str) -> Result<(), Error> {
    self.update(|entries| {
      entries.remove(key);
    })
  }
}
