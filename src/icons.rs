//! Icon registry and texture library
//!
//! The registry is the static table of known marker icons (asset path plus
//! base scale percentage) and the category-to-default-icon mapping. The
//! library owns the loaded textures; markers reference icons by path so the
//! overlay engine stays free of texture handles.

use lazy_static::lazy_static;
use macroquad::prelude::*;
use std::collections::HashMap;

/// One registered icon: asset path and base scale percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconDef {
    pub path: &'static str,
    pub scale: f32,
}

pub const STAIRS: IconDef = IconDef { path: "icons/Stairs.png", scale: 250.0 };
pub const SKULL: IconDef = IconDef { path: "icons/skull2.png", scale: 100.0 };
pub const STAR: IconDef = IconDef { path: "icons/star.png", scale: 100.0 };
pub const GATE_RED: IconDef = IconDef { path: "icons/Gates_Red.png", scale: 100.0 };
pub const GATE_YELLOW: IconDef = IconDef { path: "icons/Gates_Yellow.png", scale: 150.0 };
pub const GATE_SILVER: IconDef = IconDef { path: "icons/Gates_Silver.png", scale: 150.0 };
pub const LADDERS: IconDef = IconDef { path: "icons/ladder.png", scale: 300.0 };
pub const TELEPORT_TILE: IconDef = IconDef { path: "icons/teleport-rune.png", scale: 125.0 };
pub const GEM_VENDOR: IconDef = IconDef { path: "icons/treasure.png", scale: 125.0 };
pub const CAVE: IconDef = IconDef { path: "icons/cave.png", scale: 150.0 };
pub const FLAG: IconDef = IconDef { path: "icons/flag.png", scale: 150.0 };
pub const HIDDEN_PASSAGE: IconDef = IconDef { path: "icons/hidden_passage.png", scale: 125.0 };
pub const TRAP: IconDef = IconDef { path: "icons/trap.png", scale: 150.0 };
pub const TREASURE_CHEST: IconDef = IconDef { path: "icons/treasure_chest.png", scale: 135.0 };
pub const PORTAL: IconDef = IconDef { path: "icons/portal.png", scale: 150.0 };
pub const SECRET_DOOR: IconDef = IconDef { path: "icons/secret-door.png", scale: 150.0 };
pub const BOSS: IconDef = IconDef { path: "icons/boss.png", scale: 150.0 };
pub const AMBUSH: IconDef = IconDef { path: "icons/swords.png", scale: 150.0 };
pub const LEVER: IconDef = IconDef { path: "icons/lever.png", scale: 150.0 };
pub const BARRIER: IconDef = IconDef { path: "icons/barrier.png", scale: 150.0 };
pub const CRYSTAL: IconDef = IconDef { path: "icons/crystal.png", scale: 125.0 };
pub const BRIDGE: IconDef = IconDef { path: "icons/bridge.png", scale: 250.0 };
pub const EXCLAMATION_MARK: IconDef = IconDef { path: "icons/exclamation-mark.png", scale: 200.0 };
pub const PILGRIM: IconDef = IconDef { path: "icons/pilgrim.png", scale: 150.0 };

/// Every registered icon (drives lookup and preloading).
pub const ALL_ICONS: &[IconDef] = &[
    STAIRS, SKULL, STAR, GATE_RED, GATE_YELLOW, GATE_SILVER, LADDERS,
    TELEPORT_TILE, GEM_VENDOR, CAVE, FLAG, HIDDEN_PASSAGE, TRAP,
    TREASURE_CHEST, PORTAL, SECRET_DOOR, BOSS, AMBUSH, LEVER, BARRIER,
    CRYSTAL, BRIDGE, EXCLAMATION_MARK, PILGRIM,
];

lazy_static! {
    static ref BY_PATH: HashMap<&'static str, IconDef> =
        ALL_ICONS.iter().map(|def| (def.path, *def)).collect();
}

/// Look an icon up by its asset path (as referenced from `Location.icon`).
pub fn lookup(path: &str) -> Option<IconDef> {
    BY_PATH.get(path).copied()
}

/// Default icon for a `main/sub` category pair, lower-cased before matching.
pub fn default_for_category(main_category: &str, sub_category: &str) -> Option<IconDef> {
    let key = format!("{}/{}", main_category, sub_category).to_lowercase();
    match key.as_str() {
        "passage/stairs" => Some(STAIRS),
        "passage/portals" => Some(GATE_YELLOW),
        "passage/ladders" => Some(LADDERS),
        "passage/hidden" => Some(HIDDEN_PASSAGE),
        "hazards/traps" => Some(TRAP),
        "hazards/ambushes" => Some(AMBUSH),
        "npcs/vendors" => Some(GEM_VENDOR),
        "quests/bosses" => Some(BOSS),
        _ => None,
    }
}

/// Fallback square color for a main category with no matching icon.
pub fn category_color(main_category: &str) -> Color {
    match main_category {
        "Passage" => Color::from_rgba(231, 76, 60, 255),
        "Runes" => Color::from_rgba(241, 196, 15, 255),
        "Hazards" => Color::from_rgba(155, 89, 182, 255),
        "NPCs" => Color::from_rgba(46, 204, 113, 255),
        "Quests" => Color::from_rgba(230, 126, 34, 255),
        _ => Color::from_rgba(52, 152, 219, 255),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Texture library
// ─────────────────────────────────────────────────────────────────────────────

/// Loaded icon textures keyed by asset path. Missing files are remembered so
/// each path is attempted at most once; markers whose texture is absent fall
/// back to the category square.
#[derive(Default)]
pub struct IconLibrary {
    textures: HashMap<String, Option<Texture2D>>,
}

impl IconLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload every registered icon plus any extra paths referenced by the
    /// location data.
    pub async fn preload<I: IntoIterator<Item = String>>(&mut self, extra_paths: I) {
        for def in ALL_ICONS {
            self.load(def.path).await;
        }
        for path in extra_paths {
            self.load(&path).await;
        }
    }

    async fn load(&mut self, path: &str) {
        if self.textures.contains_key(path) {
            return;
        }
        let asset_path = format!("assets/{}", path);
        let loaded = match load_texture(&asset_path).await {
            Ok(texture) => {
                texture.set_filter(FilterMode::Linear);
                Some(texture)
            }
            Err(e) => {
                eprintln!("Failed to load icon {}: {}", asset_path, e);
                None
            }
        };
        self.textures.insert(path.to_string(), loaded);
    }

    pub fn get(&self, path: &str) -> Option<&Texture2D> {
        self.textures.get(path).and_then(|t| t.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_path() {
        let def = lookup("icons/Stairs.png").unwrap();
        assert_eq!(def.scale, 250.0);
        assert!(lookup("icons/not-an-icon.png").is_none());
    }

    #[test]
    fn test_category_defaults_are_case_insensitive() {
        assert_eq!(default_for_category("Passage", "Stairs"), Some(STAIRS));
        assert_eq!(default_for_category("passage", "PORTALS"), Some(GATE_YELLOW));
        assert_eq!(default_for_category("Runes", "first circle"), None);
    }

    #[test]
    fn test_fallback_colors_keyed_by_main_category() {
        assert_ne!(category_color("Passage"), category_color("Runes"));
        // Unknown categories share the generic fallback.
        assert_eq!(category_color("Menageries"), category_color("Scripts"));
    }
}
