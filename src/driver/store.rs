//! Object store abstraction
//!
//! The load driver talks to storage only through [`ObjectStore`], so the same
//! timing and telemetry code runs against any backend that can put, get, and
//! delete whole objects by key. [`LocalObjectStore`] maps keys to files below
//! a root directory.

use crate::Result;
use anyhow::Context;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

/// Minimal whole-object storage interface
pub trait ObjectStore: Send + Sync {
    /// Store everything `data` yields under `key`, returning the bytes written
    fn put_object(&self, key: &str, data: &mut dyn Read) -> Result<u64>;

    /// Open `key` for streaming reads
    fn get_object(&self, key: &str) -> Result<Box<dyn Read + Send>>;

    /// Remove every key in `keys`; keys that do not exist are ignored
    fn delete_objects(&self, keys: &[String]) -> Result<usize>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Object store backed by a local directory
///
/// Keys may contain `/` to place objects in subdirectories. Absolute keys and
/// keys containing `..` are rejected.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create store directory: {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            anyhow::bail!("Invalid object key: {:?}", key);
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for LocalObjectStore {
    fn put_object(&self, key: &str, data: &mut dyn Read) -> Result<u64> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = File::create(&path)
            .with_context(|| format!("Failed to create object: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        let written = io::copy(data, &mut writer)
            .with_context(|| format!("Failed to write object: {}", key))?;
        writer.flush()?;

        Ok(written)
    }

    fn get_object(&self, key: &str) -> Result<Box<dyn Read + Send>> {
        let path = self.path_for(key)?;
        let file = File::open(&path)
            .with_context(|| format!("Failed to open object: {}", path.display()))?;
        Ok(Box::new(file))
    }

    fn delete_objects(&self, keys: &[String]) -> Result<usize> {
        let mut deleted = 0;
        for key in keys {
            let path = self.path_for(key)?;
            match fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to delete object: {}", path.display()));
                }
            }
        }
        Ok(deleted)
    }

    fn name(&self) -> &str {
        "local"
    }
}
