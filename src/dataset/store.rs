//! URL-addressable file store.
//!
//! The verifier only needs two store operations: enumerating the keys under
//! a dataset id and resolving a key to a local filesystem path usable as an
//! external-table location.

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Represents a parsed store URL
#[derive(Debug, Clone)]
pub enum StoreUrl {
    Local(PathBuf),
}

impl StoreUrl {
    /// Parse a store URL into a StoreUrl
    pub fn parse(raw: &str) -> Result<Self> {
        // Try parsing as URL first
        if let Ok(url) = Url::parse(raw) {
            match url.scheme() {
                // The writer's native local-filesystem scheme
                "hfs" => Ok(StoreUrl::Local(PathBuf::from(url.path()))),
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|_| anyhow!("Invalid file:// URL: {}", raw))?;
                    Ok(StoreUrl::Local(path))
                }
                scheme => Err(anyhow!("Unsupported store scheme: {}", scheme)),
            }
        } else {
            // Treat as local directory path
            Ok(StoreUrl::Local(PathBuf::from(raw)))
        }
    }
}

/// Key-addressed access to the files of a dataset
pub trait Store: Send + Sync {
    /// All keys under the given prefix, sorted, `/`-separated
    fn iter_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Absolute filesystem location of a key (or key prefix)
    fn location(&self, key: &str) -> PathBuf;
}

/// Store over a local filesystem directory
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn open(url: &StoreUrl) -> Result<Self> {
        let StoreUrl::Local(root) = url;
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create store directory {}", root.display()))?;
        Ok(Self { root: root.clone() })
    }

    fn collect_keys(&self, dir: &Path, out: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to list store directory {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_dir() {
                self.collect_keys(&path, out)?;
            } else {
                let rel = path
                    .strip_prefix(&self.root)
                    .expect("store keys live under the root");
                let key = rel
                    .to_str()
                    .with_context(|| format!("Non-UTF-8 store key {}", rel.display()))?;
                out.push(key.to_string());
            }
        }
        Ok(())
    }
}

impl Store for LocalStore {
    fn iter_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = self.root.join(prefix);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        self.collect_keys(&dir, &mut keys)?;
        keys.sort();
        Ok(keys)
    }

    fn location(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}
