//! Tile-Space Layout Engine
//!
//! Partitions a floor's composite image into a grid of fixed-size tiles and
//! computes the rectangular placement of every tile in one shared planar
//! coordinate system, along with the floor's overall bounding box.
//!
//! The plane is y-down with the origin at the top-left of the primary set.
//! Tile rows are inverted: row 0 of a set is its bottom-most tile, so tile
//! `(col, row)` occupies `y ∈ [(num_rows-row-1)·ts, (num_rows-row)·ts]`.
//!
//! Secondary tile-sets are packed into columns to the right of the primary,
//! each column vertically centered against the primary's height.

use serde::Deserialize;
use std::fmt;

/// Edge length of one tile in plane units (native tile resolution).
pub const TILE_SIZE: f32 = 256.0;

/// Seam-hiding padding applied by the renderer, not by the layout engine.
/// Placements store exact rects; inflate at draw time.
pub const TILE_OVERLAP: f32 = 0.1;

/// Maximum number of secondary sets stacked into one layout column.
/// A layout tunable, not an invariant - tests pin behavior at this value only.
pub const SECONDARY_COLUMN_CAP: usize = 4;

// ─────────────────────────────────────────────────────────────────────────────
// Plane geometry
// ─────────────────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle in plane coordinates (y-down, top < bottom).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaneRect {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl PlaneRect {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Grow the rect by `pad` on every side (seam overlap at draw time).
    pub fn inflate(&self, pad: f32) -> Self {
        Self {
            top: self.top - pad,
            bottom: self.bottom + pad,
            left: self.left - pad,
            right: self.right + pad,
        }
    }
}

/// A floor's overall bounding box, anchored at the plane origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaneBounds {
    pub width: f32,
    pub height: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Floor tile configuration
// ─────────────────────────────────────────────────────────────────────────────

/// One value or a list of values, as ignore rules appear in floor configs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(i32),
    Many(Vec<i32>),
}

impl OneOrMany {
    pub fn matches(&self, value: i32) -> bool {
        match self {
            OneOrMany::One(v) => *v == value,
            OneOrMany::Many(vs) => vs.contains(&value),
        }
    }
}

/// A `(directory, tile)` exclusion. A cell is ignored only when both match.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IgnoreRule {
    pub dir: OneOrMany,
    pub tile: OneOrMany,
}

/// One contiguous rectangular range of tiles.
///
/// `start_dir..=end_dir` is the column range (tile directories on the CDN),
/// `start_tile..=end_tile` the row range within each column. `offset_x`
/// shifts the set horizontally in the shared plane.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSetConfig {
    pub start_dir: i32,
    pub end_dir: i32,
    pub start_tile: i32,
    pub end_tile: i32,
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub ignore: Vec<IgnoreRule>,
}

impl TileSetConfig {
    /// Number of columns, 0 for a malformed (reversed) range.
    pub fn num_cols(&self) -> i32 {
        (self.end_dir - self.start_dir + 1).max(0)
    }

    /// Number of rows, 0 for a malformed (reversed) range.
    pub fn num_rows(&self) -> i32 {
        (self.end_tile - self.start_tile + 1).max(0)
    }

    pub fn is_valid(&self) -> bool {
        self.end_dir >= self.start_dir && self.end_tile >= self.start_tile
    }

    pub fn width(&self, tile_size: f32) -> f32 {
        self.num_cols() as f32 * tile_size
    }

    pub fn height(&self, tile_size: f32) -> f32 {
        self.num_rows() as f32 * tile_size
    }

    /// Check a `(directory, tile)` pair against this set's ignore rules.
    pub fn is_ignored(&self, directory: i32, tile: i32) -> bool {
        self.ignore
            .iter()
            .any(|rule| rule.dir.matches(directory) && rule.tile.matches(tile))
    }
}

/// A floor's normalized tile configuration: one primary set plus any number
/// of secondary sets placed beside it.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorTileLayout {
    pub primary: TileSetConfig,
    pub secondaries: Vec<TileSetConfig>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Config parsing and normalization
// ─────────────────────────────────────────────────────────────────────────────

/// A floor's tile config fails to parse; that floor stays blank, others load.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "bad floor config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// The `tiles` object as it appears on disk. Three shapes are accepted:
/// the current `{primary, secondaries}` form, the legacy singular
/// `{primary, secondary}` form, and the oldest flat form where the object
/// itself is a single tile-set range.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTiles {
    Wrapped {
        primary: TileSetConfig,
        #[serde(default)]
        secondaries: Option<Vec<TileSetConfig>>,
        #[serde(default)]
        secondary: Option<TileSetConfig>,
    },
    Flat(TileSetConfig),
}

impl RawTiles {
    /// Collapse every accepted shape into the one the engine understands.
    fn normalize(self) -> FloorTileLayout {
        match self {
            RawTiles::Wrapped {
                primary,
                secondaries,
                secondary,
            } => {
                let secondaries = match (secondaries, secondary) {
                    (Some(list), _) => list,
                    (None, Some(single)) => vec![single],
                    (None, None) => Vec::new(),
                };
                FloorTileLayout {
                    primary,
                    secondaries,
                }
            }
            RawTiles::Flat(primary) => FloorTileLayout {
                primary,
                secondaries: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct FloorConfigFile {
    tiles: RawTiles,
}

/// Parse a floor's `required_tiles.json` into a normalized layout.
///
/// This is the single normalization boundary: nothing downstream ever sees a
/// legacy shape.
pub fn parse_floor_config(json: &str) -> Result<FloorTileLayout, ConfigError> {
    let file: FloorConfigFile =
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(file.tiles.normalize())
}

// ─────────────────────────────────────────────────────────────────────────────
// Layout computation
// ─────────────────────────────────────────────────────────────────────────────

/// One tile's placement: its CDN address and its rect in the shared plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub directory: i32,
    pub tile: i32,
    pub rect: PlaneRect,
}

/// The computed placement of every tile of a floor, plus its bounding box.
#[derive(Debug, Clone, Default)]
pub struct FloorLayout {
    pub tiles: Vec<PlacedTile>,
    pub bounds: PlaneBounds,
}

/// Compute all tile placements for a floor.
///
/// Secondary sets are packed into columns of at most [`SECONDARY_COLUMN_CAP`]
/// members, laid out left-to-right starting one tile past the primary, each
/// column vertically centered against the primary's height. Malformed sets
/// (reversed ranges) contribute nothing - never an error.
pub fn compute_layout(layout: &FloorTileLayout, tile_size: f32) -> FloorLayout {
    let mut tiles = Vec::new();

    let primary = &layout.primary;
    let primary_width = primary.width(tile_size);
    let primary_height = primary.height(tile_size);
    place_set(primary, primary.offset_x, 0.0, tile_size, &mut tiles);

    // Malformed secondaries place no tiles and must not reserve column space.
    let secondaries: Vec<&TileSetConfig> =
        layout.secondaries.iter().filter(|s| s.is_valid()).collect();

    let mut current_x = primary_width;
    for column in secondaries.chunks(SECONDARY_COLUMN_CAP) {
        let column_width = column
            .iter()
            .map(|s| (s.num_cols() as f32 - 0.5) * tile_size)
            .fold(0.0f32, f32::max);
        let column_height: f32 = column.iter().map(|s| s.height(tile_size)).sum();

        let column_x = current_x + tile_size;
        let vertical_offset = (primary_height - column_height) / 2.0;

        let mut y_cursor = vertical_offset;
        for set in column {
            place_set(set, column_x + set.offset_x, y_cursor, tile_size, &mut tiles);
            y_cursor += set.height(tile_size);
        }

        current_x = column_x + column_width;
    }

    FloorLayout {
        tiles,
        bounds: PlaneBounds {
            width: current_x,
            height: primary_height,
        },
    }
}

/// Place one set's non-ignored cells. Column-major, rows inverted so the
/// smallest tile index lands at the bottom of the set.
fn place_set(
    set: &TileSetConfig,
    x_offset: f32,
    vertical_offset: f32,
    tile_size: f32,
    out: &mut Vec<PlacedTile>,
) {
    let num_cols = set.num_cols();
    let num_rows = set.num_rows();

    for col in 0..num_cols {
        for row in 0..num_rows {
            let directory = col + set.start_dir;
            let tile = row + set.start_tile;
            if set.is_ignored(directory, tile) {
                continue;
            }

            let top = (num_rows - row - 1) as f32 * tile_size + vertical_offset;
            let left = col as f32 * tile_size + x_offset;
            out.push(PlacedTile {
                directory,
                tile,
                rect: PlaneRect {
                    top,
                    bottom: top + tile_size,
                    left,
                    right: left + tile_size,
                },
            });
        }
    }
}
