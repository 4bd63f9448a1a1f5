//! Content-addressed tile cache on the local filesystem
//!
//! Tiles are stored under the user cache dir keyed by their CDN path
//! (`floors/floor-<n>/tiles/<dir>/<tile>.png`), so the cache doubles as the
//! working tree for the xtask download/upload tooling. All operations
//! complete immediately; misses are `None`, not errors.

use super::TileError;
use std::path::PathBuf;

/// Cache directory name under the platform cache root.
const CACHE_DIR_NAME: &str = "dungeon-atlas";

#[derive(Debug, Clone)]
pub struct TileCache {
    base_dir: PathBuf,
}

impl TileCache {
    /// Cache rooted at the platform cache dir (falls back to `./cache` when
    /// the platform reports none).
    pub fn new() -> Self {
        let base_dir = dirs::cache_dir()
            .map(|d| d.join(CACHE_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("cache"));
        Self { base_dir }
    }

    /// Cache rooted at a custom directory (tests, xtask).
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Read a cached entry. A miss is `None`.
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        std::fs::read(self.resolve(path)).ok()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    /// Write an entry, creating parent directories as needed.
    pub fn write(&self, path: &str, data: &[u8]) -> Result<(), TileError> {
        let full_path = self.resolve(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full_path, data)?;
        Ok(())
    }

    /// Remove an entry. Removing a missing entry is fine.
    pub fn remove(&self, path: &str) -> Result<(), TileError> {
        match std::fs::remove_file(self.resolve(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new()
    }
}
