//! Fire-and-poll tile fetches
//!
//! Each fetch runs on its own background thread and reports through an mpsc
//! channel; the frame loop polls pending operations without blocking. This is
//! the only place the crate spawns threads - everything downstream of the
//! channel happens on the main thread, so no shared-state locking exists.

use super::{TileError, TileStore};

#[cfg(not(target_arch = "wasm32"))]
use std::sync::mpsc::{channel, Receiver, TryRecvError};
#[cfg(not(target_arch = "wasm32"))]
use std::thread;

pub type FetchResult = Result<Vec<u8>, TileError>;

/// A pending fetch that can be polled each frame.
#[cfg(not(target_arch = "wasm32"))]
pub struct AsyncFetch {
    receiver: Receiver<FetchResult>,
    result: Option<FetchResult>,
}

#[cfg(not(target_arch = "wasm32"))]
impl AsyncFetch {
    fn from_receiver(receiver: Receiver<FetchResult>) -> Self {
        Self {
            receiver,
            result: None,
        }
    }

    /// Poll the channel; true once a result is available.
    pub fn is_complete(&mut self) -> bool {
        if self.result.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(result) => {
                self.result = Some(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                // Worker panicked or dropped the sender.
                self.result = Some(Err(TileError::Network("fetch worker died".into())));
                true
            }
        }
    }

    /// Take the result if complete.
    pub fn take(mut self) -> Option<FetchResult> {
        if self.result.is_none() {
            if let Ok(result) = self.receiver.try_recv() {
                self.result = Some(result);
            }
        }
        self.result
    }
}

/// One tile fetch in flight, tagged with its placement address.
pub struct PendingTile {
    pub directory: i32,
    pub tile: i32,
    pub path: String,
    pub op: AsyncFetch,
}

/// Start a background tile fetch.
#[cfg(not(target_arch = "wasm32"))]
pub fn fetch_tile_async(store: &TileStore, directory: i32, tile: i32, path: String) -> PendingTile {
    let (sender, receiver) = channel();
    let store = store.clone();
    let thread_path = path.clone();

    thread::spawn(move || {
        let result = store.fetch_tile_blocking(&thread_path);
        let _ = sender.send(result);
    });

    PendingTile {
        directory,
        tile,
        path,
        op: AsyncFetch::from_receiver(receiver),
    }
}

/// A floor config fetch in flight.
pub struct PendingConfig {
    pub path: String,
    pub op: AsyncFetch,
}

/// Start a background floor-config fetch.
#[cfg(not(target_arch = "wasm32"))]
pub fn fetch_config_async(store: &TileStore, path: String) -> PendingConfig {
    let (sender, receiver) = channel();
    let store = store.clone();
    let thread_path = path.clone();

    thread::spawn(move || {
        let result = store.fetch_config_blocking(&thread_path);
        let _ = sender.send(result);
    });

    PendingConfig {
        path,
        op: AsyncFetch::from_receiver(receiver),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WASM: no threads - operations complete immediately from bundled assets
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
pub struct AsyncFetch {
    result: Option<FetchResult>,
}

#[cfg(target_arch = "wasm32")]
impl AsyncFetch {
    pub fn is_complete(&mut self) -> bool {
        true
    }

    pub fn take(self) -> Option<FetchResult> {
        self.result
    }
}

#[cfg(target_arch = "wasm32")]
pub fn fetch_tile_async(store: &TileStore, directory: i32, tile: i32, path: String) -> PendingTile {
    let result = store.fetch_tile_blocking(&path);
    PendingTile {
        directory,
        tile,
        path,
        op: AsyncFetch {
            result: Some(result),
        },
    }
}

#[cfg(target_arch = "wasm32")]
pub fn fetch_config_async(store: &TileStore, path: String) -> PendingConfig {
    let result = store.fetch_config_blocking(&path);
    PendingConfig {
        path,
        op: AsyncFetch {
            result: Some(result),
        },
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::tiles::cache::TileCache;
    use crate::tiles::remote::RemoteTiles;
    use crate::tiles::tile_path;
    use tempfile::TempDir;

    fn wait(mut op: AsyncFetch) -> FetchResult {
        for _ in 0..500 {
            if op.is_complete() {
                return op.take().unwrap();
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        panic!("fetch never completed");
    }

    #[test]
    fn test_cached_tile_resolves_in_background() {
        let dir = TempDir::new().unwrap();
        let cache = TileCache::with_base_dir(dir.path());
        let path = tile_path("1", 0, 0);

        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        cache.write(&path, &png).unwrap();

        let store = TileStore::with_backends(cache, RemoteTiles::unreachable());
        let pending = fetch_tile_async(&store, 0, 0, path);
        assert_eq!(wait(pending.op).unwrap(), png);
    }

    #[test]
    fn test_failed_fetch_reports_error_not_panic() {
        let dir = TempDir::new().unwrap();
        let store = TileStore::with_backends(
            TileCache::with_base_dir(dir.path()),
            RemoteTiles::unreachable(),
        );
        let pending = fetch_tile_async(&store, 3, 4, tile_path("1", 3, 4));
        assert!(wait(pending.op).is_err());
    }
}
