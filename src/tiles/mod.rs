//! Tile Fetch Service
//!
//! Resolves a (floor, directory, tile) address to PNG bytes with path-based
//! routing: the content-addressed disk cache first, then the remote CDN.
//! Fetched bytes are decode-validated before they are cached or handed to the
//! renderer, so a corrupt tile surfaces as a [`TileError::Decode`] gap instead
//! of a texture panic.
//!
//! A failed tile means "this one tile is missing" - never a floor-load
//! failure. Callers run fetches through [`async_ops`] and poll each frame.

pub mod async_ops;
pub mod cache;
pub mod remote;

use cache::TileCache;
use remote::RemoteTiles;
use std::fmt;

/// Tile fetch error taxonomy
#[derive(Debug, Clone, PartialEq)]
pub enum TileError {
    /// The CDN has no such tile
    NotFound(String),
    /// Transport-level failure (after the retry)
    Network(String),
    /// Bytes arrived but are not a decodable PNG
    Decode(String),
    /// Local filesystem error
    Io(String),
    /// No fetch capability on this target (WASM without bundled tiles)
    Unsupported,
}

impl fmt::Display for TileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileError::NotFound(path) => write!(f, "tile not found: {}", path),
            TileError::Network(msg) => write!(f, "network error: {}", msg),
            TileError::Decode(msg) => write!(f, "bad tile data: {}", msg),
            TileError::Io(msg) => write!(f, "I/O error: {}", msg),
            TileError::Unsupported => write!(f, "tile fetch not supported on this target"),
        }
    }
}

impl std::error::Error for TileError {}

impl From<std::io::Error> for TileError {
    fn from(e: std::io::Error) -> Self {
        TileError::Io(e.to_string())
    }
}

/// Cache/CDN path for one tile of a floor.
pub fn tile_path(floor_number: &str, directory: i32, tile: i32) -> String {
    format!(
        "floors/floor-{}/tiles/{}/{}.png",
        floor_number, directory, tile
    )
}

/// Cache/CDN path for a floor's tile config.
pub fn config_path(floor_number: &str) -> String {
    format!("floors/floor-{}/required_tiles.json", floor_number)
}

/// Unified tile access with cache -> remote routing.
#[derive(Debug, Clone)]
pub struct TileStore {
    cache: TileCache,
    remote: RemoteTiles,
}

impl TileStore {
    pub fn new() -> Self {
        Self {
            cache: TileCache::new(),
            remote: RemoteTiles::from_env(),
        }
    }

    /// Store with explicit backends (tests).
    pub fn with_backends(cache: TileCache, remote: RemoteTiles) -> Self {
        Self { cache, remote }
    }

    /// Fetch one tile, blocking. Cache hits skip the network entirely;
    /// misses are fetched, validated, and written back to the cache.
    pub fn fetch_tile_blocking(&self, path: &str) -> Result<Vec<u8>, TileError> {
        if let Some(bytes) = self.cache.read(path) {
            return validate_png(bytes, path);
        }

        let bytes = self.remote.fetch(path)?;
        let bytes = validate_png(bytes, path)?;
        if let Err(e) = self.cache.write(path, &bytes) {
            eprintln!("Failed to cache {}: {}", path, e);
        }
        Ok(bytes)
    }

    /// Fetch a floor config, blocking. Checks the bundled assets first so a
    /// checkout works offline, then the cache, then the CDN.
    pub fn fetch_config_blocking(&self, path: &str) -> Result<Vec<u8>, TileError> {
        let bundled = std::path::Path::new("assets").join(path);
        if let Ok(bytes) = std::fs::read(&bundled) {
            return Ok(bytes);
        }

        if let Some(bytes) = self.cache.read(path) {
            return Ok(bytes);
        }

        let bytes = self.remote.fetch(path)?;
        if let Err(e) = self.cache.write(path, &bytes) {
            eprintln!("Failed to cache {}: {}", path, e);
        }
        Ok(bytes)
    }
}

impl Default for TileStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject bytes that do not decode as PNG.
fn validate_png(bytes: Vec<u8>, path: &str) -> Result<Vec<u8>, TileError> {
    match image::load_from_memory_with_format(&bytes, image::ImageFormat::Png) {
        Ok(_) => Ok(bytes),
        Err(e) => Err(TileError::Decode(format!("{}: {}", path, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Minimal valid 1x1 PNG.
    fn tiny_png() -> Vec<u8> {
        let mut bytes = Vec::new();
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([10, 20, 30, 255]));
        image::DynamicImage::ImageRgba8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        bytes
    }

    fn offline_store(dir: &TempDir) -> TileStore {
        TileStore::with_backends(
            TileCache::with_base_dir(dir.path()),
            RemoteTiles::unreachable(),
        )
    }

    #[test]
    fn test_paths_are_content_addressed() {
        assert_eq!(tile_path("3", 12, 7), "floors/floor-3/tiles/12/7.png");
        assert_eq!(tile_path("6.5", 0, 0), "floors/floor-6.5/tiles/0/0.png");
        assert_eq!(config_path("1"), "floors/floor-1/required_tiles.json");
    }

    #[test]
    fn test_cache_hit_skips_network() {
        let dir = TempDir::new().unwrap();
        let store = offline_store(&dir);
        let path = tile_path("1", 2, 3);

        // Seed the cache; the unreachable remote proves no network is used.
        store.cache.write(&path, &tiny_png()).unwrap();
        let bytes = store.fetch_tile_blocking(&path).unwrap();
        assert_eq!(bytes, tiny_png());
    }

    #[test]
    fn test_cache_miss_without_network_fails() {
        let dir = TempDir::new().unwrap();
        let store = offline_store(&dir);
        let err = store.fetch_tile_blocking(&tile_path("1", 0, 0)).unwrap_err();
        assert!(matches!(err, TileError::Network(_)));
    }

    #[test]
    fn test_corrupt_cached_tile_is_a_decode_error() {
        let dir = TempDir::new().unwrap();
        let store = offline_store(&dir);
        let path = tile_path("1", 0, 0);
        store.cache.write(&path, b"not a png").unwrap();
        let err = store.fetch_tile_blocking(&path).unwrap_err();
        assert!(matches!(err, TileError::Decode(_)));
    }

    #[test]
    fn test_cached_config_read_without_network() {
        // Floor 99 has no bundled config, so this exercises the cache path.
        let dir = TempDir::new().unwrap();
        let store = offline_store(&dir);
        let path = config_path("99");
        store.cache.write(&path, br#"{"tiles": {}}"#).unwrap();
        let bytes = store.fetch_config_blocking(&path).unwrap();
        assert_eq!(bytes, br#"{"tiles": {}}"#);
    }

    #[test]
    fn test_bundled_config_wins_over_cache() {
        // Floor 1 ships in assets/; the cache copy must not shadow it.
        let dir = TempDir::new().unwrap();
        let store = offline_store(&dir);
        let path = config_path("1");
        store.cache.write(&path, b"stale").unwrap();
        let bytes = store.fetch_config_blocking(&path).unwrap();
        assert_ne!(bytes, b"stale");
        assert!(std::str::from_utf8(&bytes).unwrap().contains("primary"));
    }
}
