//! Staging slots handed between pipeline stages.
//!
//! The pipeline core never touches a store; [`crate::workspace::Workspace`]
//! reads and writes the slots around each stage. Slot presence is also what
//! decides which stage a user may reach next.

use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use log::debug;

/// Raw uploaded text.
pub const RAW_FILE_KEY: &str = "dataGlowFile";
/// Name of the uploaded file.
pub const FILE_NAME_KEY: &str = "dataGlowFileName";
/// Serialized cleaned table (`{columns, rows}` JSON).
pub const CLEANED_FILE_KEY: &str = "dataGlowCleanedFile";
/// Inference mode the upload was validated with (JSON).
pub const INFERENCE_KEY: &str = "dataGlowInference";

pub const ALL_KEYS: &[&str] = &[RAW_FILE_KEY, FILE_NAME_KEY, CLEANED_FILE_KEY, INFERENCE_KEY];

pub trait DocumentStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn clear(&mut self, key: &str) -> Result<()>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<()> {
        self.slots.remove(key);
        Ok(())
    }
}

/// One file per slot under a directory, so separate CLI invocations share
/// state.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Creating staging directory {root:?}"))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        {
            bail!("Invalid staging key '{key}'");
        }
        Ok(self.root.join(format!("{key}.slot")))
    }
}

impl DocumentStore for DirectoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Reading staging slot {path:?}")),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        let staging = path.with_extension("slot.tmp");
        fs::write(&staging, value).with_context(|| format!("Writing staging slot {staging:?}"))?;
        fs::rename(&staging, &path).with_context(|| format!("Committing staging slot {path:?}"))?;
        debug!("Staged {} byte(s) into '{key}'", value.len());
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("Removing staging slot {path:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exercise(store: &mut dyn DocumentStore) {
        assert_eq!(store.get(RAW_FILE_KEY).unwrap(), None);
        store.set(RAW_FILE_KEY, "a,b\n1,2").unwrap();
        assert!(store.contains(RAW_FILE_KEY).unwrap());
        assert_eq!(
            store.get(RAW_FILE_KEY).unwrap().as_deref(),
            Some("a,b\n1,2")
        );
        store.set(RAW_FILE_KEY, "replaced").unwrap();
        assert_eq!(store.get(RAW_FILE_KEY).unwrap().as_deref(), Some("replaced"));
        store.clear(RAW_FILE_KEY).unwrap();
        store.clear(RAW_FILE_KEY).unwrap();
        assert!(!store.contains(RAW_FILE_KEY).unwrap());
    }

    #[test]
    fn memory_store_round_trips_slots() {
        exercise(&mut MemoryStore::new());
    }

    #[test]
    fn directory_store_round_trips_slots() {
        let dir = tempdir().expect("temp dir");
        let mut store = DirectoryStore::open(dir.path().join("stage")).unwrap();
        exercise(&mut store);
    }

    #[test]
    fn directory_store_rejects_path_like_keys() {
        let dir = tempdir().expect("temp dir");
        let store = DirectoryStore::open(dir.path()).unwrap();
        assert!(store.get("../escape").is_err());
        assert!(store.get("").is_err());
    }
}
