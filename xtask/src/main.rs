//! Asset automation tasks for Dungeon Atlas
//!
//! Usage:
//!   cargo xtask download-tiles 3        # Fetch floor 3's tiles from the CDN
//!   cargo xtask upload-tiles 3          # Push floor 3's local tiles to the CDN
//!   cargo xtask optimize-tiles          # Re-encode every bundled tile PNG
//!   cargo xtask gen-favicons            # Regenerate the favicon set

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default CDN root; override with `ATLAS_TILE_BASE_URL`.
const DEFAULT_BASE_URL: &str = "https://tiles.dungeonatlas.net";

/// Politeness delay between tile downloads.
const DOWNLOAD_DELAY_MS: u64 = 150;

/// Attempts per file before giving up on it.
const DOWNLOAD_ATTEMPTS: u32 = 3;

/// Upload retry ceiling (exponential backoff: 1s, 2s, 4s, ...).
const UPLOAD_ATTEMPTS: u32 = 5;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Asset automation for Dungeon Atlas")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a floor's tiles per its required_tiles.json
    DownloadTiles {
        /// Floor number, e.g. "3" or "6.5"
        floor: String,
        /// CDN root override
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Upload a floor's local tiles to the CDN
    UploadTiles {
        /// Floor number, e.g. "3" or "6.5"
        floor: String,
        /// CDN root override
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Re-encode bundled tile PNGs with maximum compression
    OptimizeTiles {
        /// Limit to one floor number
        #[arg(long)]
        floor: Option<String>,
    },
    /// Regenerate the favicon set from the logo
    GenFavicons,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::DownloadTiles { floor, base_url } => download_tiles(&floor, base_url),
        Commands::UploadTiles { floor, base_url } => upload_tiles(&floor, base_url),
        Commands::OptimizeTiles { floor } => optimize_tiles(floor.as_deref()),
        Commands::GenFavicons => gen_favicons(),
    }
}

/// Get the project root directory
fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

fn base_url(override_url: Option<String>) -> String {
    override_url
        .or_else(|| std::env::var("ATLAS_TILE_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Floor config (same shapes the app accepts, kept standalone)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IntOrList {
    One(i32),
    Many(Vec<i32>),
}

impl IntOrList {
    fn matches(&self, value: i32) -> bool {
        match self {
            IntOrList::One(v) => *v == value,
            IntOrList::Many(vs) => vs.contains(&value),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct IgnoreRule {
    dir: IntOrList,
    tile: IntOrList,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileRange {
    start_dir: i32,
    end_dir: i32,
    start_tile: i32,
    end_tile: i32,
    #[serde(default)]
    ignore: Vec<IgnoreRule>,
}

impl TileRange {
    fn is_ignored(&self, dir: i32, tile: i32) -> bool {
        self.ignore
            .iter()
            .any(|rule| rule.dir.matches(dir) && rule.tile.matches(tile))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawTiles {
    Wrapped {
        primary: TileRange,
        #[serde(default)]
        secondaries: Option<Vec<TileRange>>,
        #[serde(default)]
        secondary: Option<TileRange>,
    },
    Flat(TileRange),
}

#[derive(Debug, Clone, Deserialize)]
struct FloorConfig {
    tiles: RawTiles,
}

/// Every tile range of the floor: primary first, then secondaries.
fn load_ranges(floor: &str) -> Result<Vec<TileRange>> {
    let config_path = project_root()
        .join("assets/floors")
        .join(format!("floor-{}", floor))
        .join("required_tiles.json");
    let text = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Reading {}", config_path.display()))?;
    let config: FloorConfig = serde_json::from_str(&text)
        .with_context(|| format!("Parsing {}", config_path.display()))?;

    Ok(match config.tiles {
        RawTiles::Wrapped {
            primary,
            secondaries,
            secondary,
        } => {
            let mut ranges = vec![primary];
            match (secondaries, secondary) {
                (Some(list), _) => ranges.extend(list),
                (None, Some(single)) => ranges.push(single),
                (None, None) => {}
            }
            ranges
        }
        RawTiles::Flat(range) => vec![range],
    })
}

/// (directory, tile) pairs the floor actually needs - ignored cells are
/// excluded from download entirely.
fn required_tiles(ranges: &[TileRange]) -> Vec<(i32, i32)> {
    let mut tiles = Vec::new();
    for range in ranges {
        for dir in range.start_dir..=range.end_dir {
            for tile in range.start_tile..=range.end_tile {
                if !range.is_ignored(dir, tile) && !tiles.contains(&(dir, tile)) {
                    tiles.push((dir, tile));
                }
            }
        }
    }
    tiles
}

// ─────────────────────────────────────────────────────────────────────────────
// download-tiles
// ─────────────────────────────────────────────────────────────────────────────

fn download_tiles(floor: &str, base_url_override: Option<String>) -> Result<()> {
    let base = base_url(base_url_override);
    let ranges = load_ranges(floor)?;
    let needed = required_tiles(&ranges);
    let tiles_dir = project_root()
        .join("assets/floors")
        .join(format!("floor-{}", floor))
        .join("tiles");

    cleanup_out_of_range(&tiles_dir, &ranges)?;

    let bar = ProgressBar::new(needed.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
            .unwrap()
            .progress_chars("=> "),
    );
    bar.set_message(format!("floor-{}", floor));

    let mut downloaded = 0usize;
    let mut failed = 0usize;
    for (dir, tile) in &needed {
        bar.inc(1);
        let dest = tiles_dir.join(dir.to_string()).join(format!("{}.png", tile));
        if dest.is_file() {
            continue;
        }

        let url = format!("{}/floors/floor-{}/tiles/{}/{}.png", base, floor, dir, tile);
        match fetch_with_retry(&url, DOWNLOAD_ATTEMPTS) {
            Ok(bytes) => {
                std::fs::create_dir_all(dest.parent().unwrap())?;
                std::fs::write(&dest, bytes)?;
                downloaded += 1;
            }
            Err(e) => {
                bar.println(format!("Failed {}/{}.png: {}", dir, tile, e));
                failed += 1;
            }
        }
        std::thread::sleep(Duration::from_millis(DOWNLOAD_DELAY_MS));
    }
    bar.finish();

    println!(
        "floor-{}: {} downloaded, {} already present, {} failed",
        floor,
        downloaded,
        needed.len() - downloaded - failed,
        failed
    );
    if failed > 0 {
        bail!("{} tiles failed to download", failed);
    }
    Ok(())
}

/// Remove local tiles outside the configured ranges.
fn cleanup_out_of_range(tiles_dir: &Path, ranges: &[TileRange]) -> Result<()> {
    let Ok(dirs) = std::fs::read_dir(tiles_dir) else {
        return Ok(()); // Nothing downloaded yet
    };

    let needed = required_tiles(ranges);
    for dir_entry in dirs.filter_map(|e| e.ok()) {
        let dir_path = dir_entry.path();
        if !dir_path.is_dir() {
            continue;
        }
        let Some(dir_num) = dir_path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.parse::<i32>().ok())
        else {
            continue;
        };

        for file_entry in std::fs::read_dir(&dir_path)?.filter_map(|e| e.ok()) {
            let file_path = file_entry.path();
            let Some(tile_num) = file_path
                .file_stem()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<i32>().ok())
            else {
                continue;
            };
            if !needed.contains(&(dir_num, tile_num)) {
                println!("Removing out-of-range tile {}", file_path.display());
                std::fs::remove_file(&file_path)?;
            }
        }

        // Drop the directory if it emptied out.
        if std::fs::read_dir(&dir_path)?.next().is_none() {
            std::fs::remove_dir(&dir_path)?;
        }
    }
    Ok(())
}

fn fetch_with_retry(url: &str, attempts: u32) -> Result<Vec<u8>> {
    let mut last_err = None;
    for attempt in 0..attempts {
        if attempt > 0 {
            std::thread::sleep(Duration::from_millis(500));
        }
        match ureq::get(url).call() {
            Ok(response) => {
                let mut bytes = Vec::new();
                use std::io::Read;
                response.into_reader().read_to_end(&mut bytes)?;
                return Ok(bytes);
            }
            Err(e) => last_err = Some(e),
        }
    }
    bail!("{}", last_err.unwrap())
}

// ─────────────────────────────────────────────────────────────────────────────
// upload-tiles
// ─────────────────────────────────────────────────────────────────────────────

fn upload_tiles(floor: &str, base_url_override: Option<String>) -> Result<()> {
    let base = base_url(base_url_override);
    let floor_dir = project_root()
        .join("assets/floors")
        .join(format!("floor-{}", floor));
    if !floor_dir.is_dir() {
        bail!("No local floor at {}", floor_dir.display());
    }

    let mut files = Vec::new();
    collect_files(&floor_dir, &mut files)?;

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
            .unwrap()
            .progress_chars("=> "),
    );
    bar.set_message(format!("upload floor-{}", floor));

    let token = std::env::var("ATLAS_UPLOAD_TOKEN").ok();
    for file in &files {
        bar.inc(1);
        let relative = file
            .strip_prefix(project_root().join("assets"))
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        let url = format!("{}/{}", base, relative);
        let bytes = std::fs::read(file)?;
        upload_with_backoff(&url, &bytes, token.as_deref())
            .with_context(|| format!("Uploading {}", relative))?;
    }
    bar.finish();

    println!("floor-{}: {} files uploaded", floor, files.len());
    Ok(())
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)?.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// PUT with exponential backoff: 1s, 2s, 4s, ... between attempts.
fn upload_with_backoff(url: &str, bytes: &[u8], token: Option<&str>) -> Result<()> {
    let mut delay = Duration::from_secs(1);
    let mut last_err = None;
    for attempt in 0..UPLOAD_ATTEMPTS {
        if attempt > 0 {
            std::thread::sleep(delay);
            delay *= 2;
        }
        let mut request = ureq::put(url);
        if let Some(token) = token {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }
        match request.send_bytes(bytes) {
            Ok(_) => return Ok(()),
            Err(e) => last_err = Some(e),
        }
    }
    bail!("{}", last_err.unwrap())
}

// ─────────────────────────────────────────────────────────────────────────────
// optimize-tiles
// ─────────────────────────────────────────────────────────────────────────────

fn optimize_tiles(floor: Option<&str>) -> Result<()> {
    let floors_dir = project_root().join("assets/floors");
    let mut targets = Vec::new();

    match floor {
        Some(f) => targets.push(floors_dir.join(format!("floor-{}", f)).join("tiles")),
        None => {
            for entry in std::fs::read_dir(&floors_dir)
                .with_context(|| format!("Reading {}", floors_dir.display()))?
                .filter_map(|e| e.ok())
            {
                if entry.path().is_dir() {
                    targets.push(entry.path().join("tiles"));
                }
            }
        }
    }

    let mut pngs = Vec::new();
    for target in &targets {
        if target.is_dir() {
            collect_files(target, &mut pngs)?;
        }
    }
    pngs.retain(|p| p.extension().map(|e| e == "png").unwrap_or(false));

    let bar = ProgressBar::new(pngs.len() as u64);
    let mut saved: i64 = 0;
    for path in &pngs {
        bar.inc(1);
        match reencode_png(path) {
            Ok(delta) => saved += delta,
            Err(e) => bar.println(format!("Skipping {}: {}", path.display(), e)),
        }
    }
    bar.finish();

    println!("{} tiles re-encoded, {} bytes saved", pngs.len(), saved);
    Ok(())
}

/// Re-encode one PNG with maximum compression, in place. Returns bytes saved.
fn reencode_png(path: &Path) -> Result<i64> {
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};

    let before = std::fs::metadata(path)?.len() as i64;
    let img = image::open(path)?;

    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        std::io::Cursor::new(&mut out),
        CompressionType::Best,
        FilterType::Adaptive,
    );
    img.write_with_encoder(encoder)?;

    // Keep the original if re-encoding didn't help.
    if (out.len() as i64) < before {
        std::fs::write(path, &out)?;
        Ok(before - out.len() as i64)
    } else {
        Ok(0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// gen-favicons
// ─────────────────────────────────────────────────────────────────────────────

const FAVICON_SIZES: &[(u32, &str)] = &[
    (16, "favicon-16x16.png"),
    (32, "favicon-32x32.png"),
    (180, "apple-touch-icon.png"),
    (192, "android-chrome-192x192.png"),
    (512, "android-chrome-512x512.png"),
];

fn gen_favicons() -> Result<()> {
    let root = project_root();
    let logo_path = root.join("assets/branding/logo.png");
    let favicon_dir = root.join("assets/favicon");
    std::fs::create_dir_all(&favicon_dir)?;

    let logo = image::open(&logo_path)
        .with_context(|| format!("Opening {}", logo_path.display()))?;

    for (size, name) in FAVICON_SIZES {
        let resized = logo.resize(*size, *size, image::imageops::FilterType::Lanczos3);
        resized.save(favicon_dir.join(name))?;
        println!("Generated {}", name);
    }

    let ico = logo.resize(32, 32, image::imageops::FilterType::Lanczos3);
    ico.save(favicon_dir.join("favicon.ico"))?;
    println!("Generated favicon.ico");

    Ok(())
}
