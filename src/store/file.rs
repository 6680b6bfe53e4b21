//! JSON file document store
//!
//! All documents of one kind live in a single JSON object keyed by name.
//! Every change rewrites the whole file through a temp file and a rename.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::{check_name, DocumentStore, StoreError, StoreResult};

pub struct JsonFileStore<D> {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    write_lock: Mutex<()>,
    _doc: PhantomData<fn() -> D>,
}

impl<D> JsonFileStore<D> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<D: Serialize + DeserializeOwned> JsonFileStore<D> {
    fn read_map(&self) -> StoreResult<BTreeMap<String, D>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to read store");
                return Err(StoreError::Io(e));
            }
        };
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let map: BTreeMap<String, D> = serde_json::from_str(&text)?;
        debug!(path = %self.path.display(), documents = map.len(), "Loaded store");
        Ok(map)
    }

    fn write_map(&self, map: &BTreeMap<String, D>) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(map)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json.as_bytes()).map_err(|e| {
            tracing::error!(path = %temp_path.display(), error = %e, "Failed to write temp file");
            StoreError::Io(e)
        })?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            tracing::error!(
                from = %temp_path.display(),
                to = %self.path.display(),
                error = %e,
                "Failed to rename temp file to target"
            );
            StoreError::Io(e)
        })?;
        Ok(())
    }
}

impl<D> DocumentStore<D> for JsonFileStore<D>
where
    D: Serialize + DeserializeOwned + Send + Sync,
{
    fn load_all(&self) -> StoreResult<BTreeMap<String, D>> {
        self.read_map()
    }

    fn save(&self, name: &str, doc: D) -> StoreResult<()> {
        let name = check_name(name)?;
        let _guard = self.write_lock.lock();
        let mut map = self.read_map()?;
        let replaced = map.insert(name.to_string(), doc).is_some();
        self.write_map(&map)?;
        info!(name, replaced, path = %self.path.display(), "Document saved");
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_map()?;
        if map.remove(name.trim()).is_none() {
            return Ok(false);
        }
        self.write_map(&map)?;
        info!(name, path = %self.path.display(), "Document deleted");
        Ok(true)
    }
}
