//! Location and route data model
//!
//! Plain-JSON shapes produced by the atlas data authors. Coordinate pairs are
//! `[y, x]` in plane units, matching the row-major convention the map data
//! was authored in. Parsing is the only place these files are interpreted;
//! everything downstream works with the typed model.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// A point in a floor's plane (y-down).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Build from a `[y, x]` pair as it appears in data files.
    pub fn from_pair(pair: [f32; 2]) -> Self {
        Self {
            y: pair[0],
            x: pair[1],
        }
    }
}

/// A location id as authored: either a number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LocationId {
    Int(i64),
    Str(String),
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationId::Int(n) => write!(f, "{}", n),
            LocationId::Str(s) => write!(f, "{}", s),
        }
    }
}

/// A single coordinate pair or a list of them (multi-instance items).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    One([f32; 2]),
    Many(Vec<[f32; 2]>),
}

impl Coordinates {
    /// Expand to a uniform point list.
    pub fn points(&self) -> Vec<Point2> {
        match self {
            Coordinates::One(pair) => vec![Point2::from_pair(*pair)],
            Coordinates::Many(pairs) => pairs.iter().map(|p| Point2::from_pair(*p)).collect(),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, Coordinates::Many(_))
    }
}

/// One point of interest on a floor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub title: String,
    pub description: String,
    pub coordinates: Coordinates,
    /// Icon path relative to the asset root, e.g. "icons/Stairs.png".
    #[serde(default)]
    pub icon: Option<String>,
    /// Icon scale percentage; overrides the registry's base scale.
    #[serde(default)]
    pub scale: Option<f32>,
    /// Per-instance container names, matching `coordinates` positionally.
    #[serde(default)]
    pub container: Option<Vec<String>>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub codex_upgrade: Option<String>,
    #[serde(default)]
    pub words: Option<String>,
}

impl Location {
    /// The container entry matching one expanded coordinate, if any.
    pub fn container_at(&self, index: usize) -> Option<&str> {
        self.container
            .as_ref()
            .and_then(|c| c.get(index))
            .map(String::as_str)
    }
}

/// Subcategory name -> locations.
pub type CategoryData = BTreeMap<String, Vec<Location>>;
/// Main category name ("Passage", "Runes", ...) -> subcategories.
pub type LevelData = BTreeMap<String, CategoryData>;
/// Floor name -> level data.
pub type LocationsData = BTreeMap<String, LevelData>;

/// One point along a route segment. Carries either explicit coordinates or a
/// reference to a [`Location`] resolved at draw time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoutePoint {
    #[serde(default)]
    pub coordinates: Option<[f32; 2]>,
    #[serde(default, rename = "locationId")]
    pub location_id: Option<LocationId>,
    #[serde(default)]
    pub description: Option<String>,
    /// Extra polyline vertices between this point and the next.
    #[serde(default, rename = "pathPoints")]
    pub path_points: Option<Vec<[f32; 2]>>,
    /// Break line continuity before the next point.
    #[serde(default)]
    pub gap: bool,
}

/// The part of a route that lives on one floor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteSegment {
    pub level: String,
    pub points: Vec<RoutePoint>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Route {
    pub id: String,
    pub title: String,
    pub description: String,
    pub segments: Vec<RouteSegment>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, rename = "dashArray")]
    pub dash_array: Option<String>,
    /// Skip curve interpolation for this route.
    #[serde(default, rename = "straightLines")]
    pub straight_lines: bool,
}

/// Route category -> routes.
pub type RoutesData = BTreeMap<String, Vec<Route>>;

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// The locations or routes file fails to parse. The atlas still runs; the
/// affected overlay set is simply empty.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    Parse(String),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Parse(msg) => write!(f, "bad atlas data: {}", msg),
        }
    }
}

impl std::error::Error for DataError {}

/// Parse and validate the locations file.
///
/// The `container`/`coordinates` length invariant is enforced here: a
/// mismatched container list is logged and dropped rather than carried into
/// the overlay engine.
pub fn parse_locations(json: &str) -> Result<LocationsData, DataError> {
    let mut data: LocationsData =
        serde_json::from_str(json).map_err(|e| DataError::Parse(e.to_string()))?;

    for (floor, level) in data.iter_mut() {
        for categories in level.values_mut() {
            for locations in categories.values_mut() {
                for loc in locations.iter_mut() {
                    let count = loc.coordinates.points().len();
                    if let Some(container) = &loc.container {
                        if container.len() != count {
                            eprintln!(
                                "Location {} on {}: {} container entries for {} coordinates, dropping containers",
                                loc.id, floor, container.len(), count
                            );
                            loc.container = None;
                        }
                    }
                }
            }
        }
    }

    Ok(data)
}

/// Parse the routes file.
pub fn parse_routes(json: &str) -> Result<RoutesData, DataError> {
    serde_json::from_str(json).map_err(|e| DataError::Parse(e.to_string()))
}

/// Find a location by id anywhere in the data set (route references are
/// floor-agnostic: ids are unique across the atlas).
pub fn find_location<'a>(data: &'a LocationsData, id: &LocationId) -> Option<&'a Location> {
    for level in data.values() {
        for categories in level.values() {
            for locations in categories.values() {
                if let Some(loc) = locations.iter().find(|l| &l.id == id) {
                    return Some(loc);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LOCATIONS: &str = r#"{
        "Level 1": {
            "Passage": {
                "stairs": [
                    {"id": 1, "title": "Grand Stair", "description": "Down to 2",
                     "coordinates": [128, 640]}
                ],
                "portals": [
                    {"id": "p-moongate", "title": "Moongate", "description": "Twin gates",
                     "coordinates": [[100, 200], [300, 400]],
                     "container": ["west wing", "east wing"],
                     "icon": "icons/Gates_Yellow.png", "scale": 175}
                ]
            },
            "Runes": {
                "first circle": [
                    {"id": 7, "title": "Knock", "description": "An unlocking rune",
                     "coordinates": [512, 512], "words": "Ex Por",
                     "codex_upgrade": "Opens reinforced doors"}
                ]
            }
        }
    }"#;

    #[test]
    fn test_parse_locations_shapes() {
        let data = parse_locations(SAMPLE_LOCATIONS).unwrap();
        let level = &data["Level 1"];
        let stairs = &level["Passage"]["stairs"][0];
        assert_eq!(stairs.coordinates.points(), vec![Point2::new(640.0, 128.0)]);
        assert!(!stairs.coordinates.is_multi());

        let gate = &level["Passage"]["portals"][0];
        assert!(gate.coordinates.is_multi());
        assert_eq!(gate.coordinates.points().len(), 2);
        assert_eq!(gate.container_at(1), Some("east wing"));
        assert_eq!(gate.scale, Some(175.0));

        let rune = &level["Runes"]["first circle"][0];
        assert_eq!(rune.words.as_deref(), Some("Ex Por"));
    }

    #[test]
    fn test_coordinate_pairs_are_y_then_x() {
        let p = Point2::from_pair([10.0, 20.0]);
        assert_eq!(p.y, 10.0);
        assert_eq!(p.x, 20.0);
    }

    #[test]
    fn test_mismatched_container_is_dropped() {
        let json = r#"{"Level 1": {"Loot": {"chests": [
            {"id": 1, "title": "Chest", "description": "d",
             "coordinates": [[0, 0], [1, 1]], "container": ["only one"]}
        ]}}}"#;
        let data = parse_locations(json).unwrap();
        let chest = &data["Level 1"]["Loot"]["chests"][0];
        assert!(chest.container.is_none());
    }

    #[test]
    fn test_find_location_by_either_id_kind() {
        let data = parse_locations(SAMPLE_LOCATIONS).unwrap();
        assert!(find_location(&data, &LocationId::Int(1)).is_some());
        assert!(find_location(&data, &LocationId::Str("p-moongate".into())).is_some());
        assert!(find_location(&data, &LocationId::Int(999)).is_none());
    }

    #[test]
    fn test_parse_routes_camel_case_fields() {
        let json = r##"{"farming": [{
            "id": "r1", "title": "Ore loop", "description": "Mining circuit",
            "color": "#2ecc71", "dashArray": "10, 6", "straightLines": false,
            "segments": [{"level": "Level 2", "points": [
                {"coordinates": [10, 10], "description": "Entrance"},
                {"coordinates": [50, 80], "pathPoints": [[30, 40]], "gap": true},
                {"locationId": 7}
            ]}]
        }]}"##;
        let routes = parse_routes(json).unwrap();
        let route = &routes["farming"][0];
        assert_eq!(route.dash_array.as_deref(), Some("10, 6"));
        let points = &route.segments[0].points;
        assert_eq!(points[1].path_points.as_ref().unwrap().len(), 1);
        assert!(points[1].gap);
        assert_eq!(points[2].location_id, Some(LocationId::Int(7)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_locations("[]").is_err());
        assert!(parse_routes("nope").is_err());
    }
}
