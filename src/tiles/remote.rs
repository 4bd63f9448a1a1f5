//! Remote CDN backend
//!
//! Plain HTTP GETs against the tile CDN via `ureq` (native only). A transport
//! failure is retried once after a short delay; the retry policy lives here
//! and nowhere else. When a tile key is configured the request carries an
//! opaque signature header - nothing above this module knows about it.

use super::TileError;

/// Default CDN root; override with `ATLAS_TILE_BASE_URL`.
const DEFAULT_BASE_URL: &str = "https://tiles.dungeonatlas.net";

/// Env var holding the optional signing key.
const TILE_KEY_ENV: &str = "ATLAS_TILE_KEY";

/// Delay before the single retry.
#[cfg(not(target_arch = "wasm32"))]
const RETRY_DELAY_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct RemoteTiles {
    base_url: String,
    key: Option<String>,
}

impl RemoteTiles {
    /// Backend configured from the environment.
    pub fn from_env() -> Self {
        let base_url = std::env::var("ATLAS_TILE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let key = std::env::var(TILE_KEY_ENV).ok();
        Self::new(base_url, key)
    }

    pub fn new(base_url: impl Into<String>, key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            key,
        }
    }

    /// A backend that always fails with a network error (offline tests).
    pub fn unreachable() -> Self {
        Self::new("http://127.0.0.1:9", None)
    }

    /// GET a path relative to the CDN root, retrying once on transport
    /// failure.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn fetch(&self, path: &str) -> Result<Vec<u8>, TileError> {
        match self.fetch_once(path) {
            Err(TileError::Network(_)) => {
                std::thread::sleep(std::time::Duration::from_millis(RETRY_DELAY_MS));
                self.fetch_once(path)
            }
            other => other,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn fetch_once(&self, path: &str) -> Result<Vec<u8>, TileError> {
        use std::io::Read;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let mut request = ureq::get(&url);
        if let Some(signature) = self.signature(path) {
            request = request.set("X-Atlas-Signature", &signature);
        }

        let response = match request.call() {
            Ok(r) => r,
            Err(ureq::Error::Status(404, _)) => return Err(TileError::NotFound(path.to_string())),
            Err(ureq::Error::Status(code, _)) => {
                return Err(TileError::Network(format!("{}: HTTP {}", path, code)))
            }
            Err(e) => return Err(TileError::Network(format!("{}: {}", path, e))),
        };

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| TileError::Network(format!("{}: {}", path, e)))?;
        Ok(bytes)
    }

    /// No network capability on WASM; bundled assets are the only source.
    #[cfg(target_arch = "wasm32")]
    pub fn fetch(&self, _path: &str) -> Result<Vec<u8>, TileError> {
        Err(TileError::Unsupported)
    }

    /// Opaque request signature when a key is configured.
    #[cfg(not(target_arch = "wasm32"))]
    fn signature(&self, path: &str) -> Option<String> {
        use base64::Engine as _;
        use sha2::{Digest, Sha256};

        let key = self.key.as_ref()?;
        let digest = Sha256::digest(format!("{}{}", key, path).as_bytes());
        Some(base64::engine::general_purpose::STANDARD.encode(digest))
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_backend_reports_network_error() {
        let remote = RemoteTiles::unreachable();
        let err = remote.fetch("floors/floor-1/tiles/0/0.png").unwrap_err();
        assert!(matches!(err, TileError::Network(_)));
    }

    #[test]
    fn test_signature_requires_key() {
        let unsigned = RemoteTiles::new("http://x", None);
        assert!(unsigned.signature("a/b.png").is_none());

        let signed = RemoteTiles::new("http://x", Some("secret".into()));
        let sig = signed.signature("a/b.png").unwrap();
        assert!(!sig.is_empty());
        // Same key + path is deterministic, different path differs.
        assert_eq!(sig, signed.signature("a/b.png").unwrap());
        assert_ne!(sig, signed.signature("a/c.png").unwrap());
    }
}
