//! Floor catalog and tile-layer cache
//!
//! Owns the per-floor tile layers and the guarded load state machine. A layer
//! is built once - config fetch, normalization, layout, one background fetch
//! per placed tile - then cached so revisiting a floor is a pure layer swap.
//! At most one load is in flight; floor selections arriving during a load are
//! dropped, not queued. Per-tile failures leave holes, never abort the floor.

use macroquad::prelude::*;
use std::collections::HashMap;

use crate::layout::{compute_layout, parse_floor_config, FloorLayout, TILE_SIZE};
use crate::tiles::async_ops::{fetch_config_async, fetch_tile_async, PendingConfig, PendingTile};
use crate::tiles::{config_path, tile_path, TileStore};

/// Every floor of the atlas, in switcher order.
pub const FLOORS: &[&str] = &[
    "Level 1", "Level 2", "Level 3", "Level 4", "Level 5", "Level 6", "Level 6.5", "Level 7",
    "Level 8",
];

/// The CDN floor number for a floor name ("Level 6.5" -> "6.5").
pub fn floor_number(floor: &str) -> &str {
    floor.split(' ').nth(1).unwrap_or(floor)
}

/// One floor's built tile layer: placements plus the textures that arrived.
pub struct FloorLayer {
    pub layout: FloorLayout,
    /// Textures keyed by (directory, tile). Missing entries render as holes.
    pub textures: HashMap<(i32, i32), Texture2D>,
    /// Count of tiles that failed to fetch.
    pub missing: usize,
}

enum LoadPhase {
    Config(PendingConfig),
    Tiles { total: usize, pending: Vec<PendingTile> },
}

struct FloorLoad {
    floor: String,
    phase: LoadPhase,
}

/// Outcome of a floor selection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Cached layer attached; caller should refit the view.
    Attached,
    /// Load started; the layer attaches when [`FloorLayers::poll`] completes.
    Loading,
    /// A load is already in flight - this request was dropped.
    Busy,
    /// Already the active floor.
    NoChange,
}

/// The floor-layer cache and its load state machine.
pub struct FloorLayers {
    store: TileStore,
    layers: HashMap<String, FloorLayer>,
    active: Option<String>,
    load: Option<FloorLoad>,
}

impl FloorLayers {
    pub fn new(store: TileStore) -> Self {
        Self {
            store,
            layers: HashMap::new(),
            active: None,
            load: None,
        }
    }

    pub fn active_floor(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_layer(&self) -> Option<&FloorLayer> {
        self.active.as_ref().and_then(|f| self.layers.get(f))
    }

    pub fn is_loading(&self) -> bool {
        self.load.is_some()
    }

    /// Load progress as (fraction, message) while a load is in flight.
    pub fn progress(&self) -> Option<(f32, String)> {
        let load = self.load.as_ref()?;
        match &load.phase {
            LoadPhase::Config(_) => Some((0.05, format!("Loading {} config...", load.floor))),
            LoadPhase::Tiles { total, pending } => {
                let done = total.saturating_sub(pending.len());
                let fraction = if *total == 0 {
                    1.0
                } else {
                    0.1 + 0.9 * done as f32 / *total as f32
                };
                Some((
                    fraction,
                    format!("Loading {} ({}/{} tiles)...", load.floor, done, total),
                ))
            }
        }
    }

    /// Request a floor. Cached floors attach immediately (detaching whatever
    /// was active); uncached floors start a guarded load.
    pub fn select(&mut self, floor: &str) -> SelectOutcome {
        if self.active.as_deref() == Some(floor) {
            return SelectOutcome::NoChange;
        }

        if self.load.is_some() {
            // At most one load in flight; callers re-issue after completion.
            eprintln!("Floor load in flight, dropping selection of {}", floor);
            return SelectOutcome::Busy;
        }

        if self.layers.contains_key(floor) {
            self.active = Some(floor.to_string());
            return SelectOutcome::Attached;
        }

        let path = config_path(floor_number(floor));
        self.load = Some(FloorLoad {
            floor: floor.to_string(),
            phase: LoadPhase::Config(fetch_config_async(&self.store, path)),
        });
        SelectOutcome::Loading
    }

    /// Drive the in-flight load, if any. Returns the floor name when a load
    /// just completed and attached.
    pub fn poll(&mut self) -> Option<String> {
        let FloorLoad { floor, phase } = self.load.take()?;

        match phase {
            LoadPhase::Config(mut pending) => {
                if !pending.op.is_complete() {
                    self.load = Some(FloorLoad {
                        floor,
                        phase: LoadPhase::Config(pending),
                    });
                    return None;
                }
                match pending.op.take() {
                    Some(Ok(bytes)) => self.begin_tile_phase(floor, &bytes),
                    Some(Err(e)) => {
                        // This floor stays blank; other floors remain usable.
                        eprintln!("Failed to load config for {}: {}", floor, e);
                    }
                    None => {}
                }
                None
            }
            LoadPhase::Tiles { total, mut pending } => {
                let mut still_pending = Vec::new();
                for mut tile in pending.drain(..) {
                    if !tile.op.is_complete() {
                        still_pending.push(tile);
                        continue;
                    }
                    let (directory, tile_index) = (tile.directory, tile.tile);
                    let Some(result) = tile.op.take() else { continue };
                    let Some(layer) = self.layers.get_mut(&floor) else { continue };
                    match result {
                        Ok(bytes) => {
                            let texture =
                                Texture2D::from_file_with_format(&bytes, Some(ImageFormat::Png));
                            texture.set_filter(FilterMode::Linear);
                            layer.textures.insert((directory, tile_index), texture);
                        }
                        Err(e) => {
                            // One missing tile renders as a hole.
                            eprintln!("Tile {}/{} on {}: {}", directory, tile_index, floor, e);
                            layer.missing += 1;
                        }
                    }
                }

                if still_pending.is_empty() {
                    self.active = Some(floor.clone());
                    Some(floor)
                } else {
                    self.load = Some(FloorLoad {
                        floor,
                        phase: LoadPhase::Tiles {
                            total,
                            pending: still_pending,
                        },
                    });
                    None
                }
            }
        }
    }

    /// Parse a fetched config and start the tile phase (or abandon the load
    /// on a malformed config).
    fn begin_tile_phase(&mut self, floor: String, bytes: &[u8]) {
        let json = match std::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Config for {} is not UTF-8: {}", floor, e);
                return;
            }
        };
        let tile_layout = match parse_floor_config(json) {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Config for {}: {}", floor, e);
                return;
            }
        };

        let layout = compute_layout(&tile_layout, TILE_SIZE);
        let number = floor_number(&floor).to_string();

        // Deterministic fetch order: column-major, then row - completion
        // order does not matter, each tile is positioned by its own address.
        let pending: Vec<PendingTile> = layout
            .tiles
            .iter()
            .map(|placed| {
                fetch_tile_async(
                    &self.store,
                    placed.directory,
                    placed.tile,
                    tile_path(&number, placed.directory, placed.tile),
                )
            })
            .collect();
        let total = pending.len();

        self.layers.insert(
            floor.clone(),
            FloorLayer {
                layout,
                textures: HashMap::new(),
                missing: 0,
            },
        );
        self.load = Some(FloorLoad {
            floor,
            phase: LoadPhase::Tiles { total, pending },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::cache::TileCache;
    use crate::tiles::remote::RemoteTiles;
    use tempfile::TempDir;

    fn offline_layers(dir: &TempDir) -> FloorLayers {
        FloorLayers::new(TileStore::with_backends(
            TileCache::with_base_dir(dir.path()),
            RemoteTiles::unreachable(),
        ))
    }

    fn drive_to_idle(layers: &mut FloorLayers) {
        for _ in 0..1000 {
            layers.poll();
            if !layers.is_loading() {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        panic!("load never settled");
    }

    #[test]
    fn test_floor_numbers() {
        assert_eq!(floor_number("Level 1"), "1");
        assert_eq!(floor_number("Level 6.5"), "6.5");
    }

    #[test]
    fn test_selection_during_load_is_dropped() {
        let dir = TempDir::new().unwrap();
        let mut layers = offline_layers(&dir);

        assert_eq!(layers.select("Level 1"), SelectOutcome::Loading);
        // Second call while the load is in flight is a no-op.
        assert_eq!(layers.select("Level 2"), SelectOutcome::Busy);
        drive_to_idle(&mut layers);
    }

    #[test]
    fn test_bad_config_leaves_floor_blank_not_broken() {
        // Floor 99 has no bundled config, so the corrupt cached one is used.
        let dir = TempDir::new().unwrap();
        let cache = TileCache::with_base_dir(dir.path());
        cache
            .write("floors/floor-99/required_tiles.json", b"not json at all")
            .unwrap();
        let mut layers = FloorLayers::new(TileStore::with_backends(
            cache,
            RemoteTiles::unreachable(),
        ));

        assert_eq!(layers.select("Level 99"), SelectOutcome::Loading);
        drive_to_idle(&mut layers);
        assert_eq!(layers.active_floor(), None);
        // The store is usable for other floors afterwards.
        assert_eq!(layers.select("Level 98"), SelectOutcome::Loading);
        drive_to_idle(&mut layers);
    }

    #[test]
    fn test_unreachable_config_fetch_settles_without_attach() {
        let dir = TempDir::new().unwrap();
        let mut layers = offline_layers(&dir);
        assert_eq!(layers.select("Level 99"), SelectOutcome::Loading);
        drive_to_idle(&mut layers);
        // No bundled config, no cache, no network: nothing attached.
        assert_eq!(layers.active_floor(), None);
    }

    #[test]
    fn test_holed_floor_still_attaches_and_is_cached() {
        // Floor 1's bundled config parses, but every tile fetch fails
        // offline: the floor attaches with holes rather than failing.
        let dir = TempDir::new().unwrap();
        let mut layers = offline_layers(&dir);
        assert_eq!(layers.select("Level 1"), SelectOutcome::Loading);
        drive_to_idle(&mut layers);

        assert_eq!(layers.active_floor(), Some("Level 1"));
        let layer = layers.active_layer().unwrap();
        assert!(layer.missing > 0);
        assert!(layer.textures.is_empty());
        assert!(!layer.layout.tiles.is_empty());

        // Reselecting is a no-op; the cached layer is reused.
        assert_eq!(layers.select("Level 1"), SelectOutcome::NoChange);
    }
}
