//! Marker & Route Overlay Engine
//!
//! Converts the location/route data model into positioned markers and
//! interpolated path geometry in the floor's plane. Pure given
//! `(floor, data, visibility)`: rendering backends turn the structs produced
//! here into pixels, and every rebuild fully replaces the previous overlay
//! (no incremental diffing).

use macroquad::prelude::Color;

use crate::categories::{canonical_category, VisibilityStore};
use crate::icons;
use crate::model::{find_location, Location, LocationsData, Point2, RoutesData};

/// Sub-segments inserted between each consecutive pair of route points.
pub const SPLINE_SUBDIVISIONS: usize = 16;

/// Default route line color when a route does not specify one.
const ROUTE_DEFAULT_COLOR: Color = Color::new(0.2, 0.53, 1.0, 1.0);

// ─────────────────────────────────────────────────────────────────────────────
// Markers
// ─────────────────────────────────────────────────────────────────────────────

/// How a marker is drawn: a registered image icon or a colored square.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerIcon {
    Image { path: String, scale: f32 },
    Square { color: Color },
}

/// One positioned marker. Carries its originating location (and, for
/// multi-instance locations, which coordinate index it represents) so popup
/// content can be derived later.
#[derive(Debug, Clone)]
pub struct Marker {
    pub position: Point2,
    pub icon: MarkerIcon,
    pub main_category: String,
    /// Canonical-cased subcategory name.
    pub category: String,
    pub location: Location,
    /// Index into the location's coordinate list when it was multi-valued.
    pub container_index: Option<usize>,
}

impl Marker {
    /// Icon scale percentage (squares draw at the base size).
    pub fn scale_percent(&self) -> f32 {
        match &self.icon {
            MarkerIcon::Image { scale, .. } => *scale,
            MarkerIcon::Square { .. } => 100.0,
        }
    }
}

/// Resolve the icon for a location per the atlas rules: an explicit icon path
/// wins (registry provides its base scale), then the category default, then a
/// colored square keyed by main category. `Location.scale` overrides any base.
fn resolve_icon(main_category: &str, sub_category: &str, location: &Location) -> MarkerIcon {
    if let Some(path) = &location.icon {
        let base = icons::lookup(path).map(|def| def.scale).unwrap_or(100.0);
        return MarkerIcon::Image {
            path: path.clone(),
            scale: location.scale.unwrap_or(base),
        };
    }

    if let Some(def) = icons::default_for_category(main_category, sub_category) {
        return MarkerIcon::Image {
            path: def.path.to_string(),
            scale: location.scale.unwrap_or(def.scale),
        };
    }

    MarkerIcon::Square {
        color: icons::category_color(main_category),
    }
}

/// Build the full marker set for one floor, filtered by category visibility.
pub fn build_markers(
    floor: &str,
    data: &LocationsData,
    visibility: &VisibilityStore,
) -> Vec<Marker> {
    let mut markers = Vec::new();

    let Some(level) = data.get(floor) else {
        return markers;
    };

    for (main_category, categories) in level {
        for (sub_category, locations) in categories {
            let category = canonical_category(sub_category);
            if !visibility.is_visible(&category) {
                continue;
            }

            for location in locations {
                let icon = resolve_icon(main_category, sub_category, location);
                let multi = location.coordinates.is_multi();
                for (index, position) in location.coordinates.points().into_iter().enumerate() {
                    markers.push(Marker {
                        position,
                        icon: icon.clone(),
                        main_category: main_category.clone(),
                        category: category.clone(),
                        location: location.clone(),
                        container_index: if multi { Some(index) } else { None },
                    });
                }
            }
        }
    }

    markers
}

// ─────────────────────────────────────────────────────────────────────────────
// Routes
// ─────────────────────────────────────────────────────────────────────────────

/// One drawable polyline of a route (already smoothed unless the route opted
/// for straight lines).
#[derive(Debug, Clone)]
pub struct RoutePath {
    pub route_id: String,
    pub points: Vec<Point2>,
    pub color: Color,
    pub dash: Option<Vec<f32>>,
}

/// A labeled point marker along a route ("Start" / "End" / "Step N").
#[derive(Debug, Clone)]
pub struct RouteMarker {
    pub route_id: String,
    pub position: Point2,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct RouteOverlay {
    pub paths: Vec<RoutePath>,
    pub markers: Vec<RouteMarker>,
}

/// Build route polylines and route-point markers for one floor.
///
/// Points referencing an unknown location id are skipped (logged); the rest
/// of the route still draws. A `gap` point ends its path-segment, so the line
/// breaks without breaking the logical route.
pub fn build_routes(
    floor: &str,
    routes: &RoutesData,
    locations: &LocationsData,
    visibility: &VisibilityStore,
) -> RouteOverlay {
    let mut overlay = RouteOverlay::default();

    for (category, category_routes) in routes {
        if !visibility.is_visible(&canonical_category(category)) {
            continue;
        }

        for route in category_routes {
            let color = route
                .color
                .as_deref()
                .and_then(parse_color)
                .unwrap_or(ROUTE_DEFAULT_COLOR);
            let dash = route.dash_array.as_deref().and_then(parse_dash_array);

            for segment in route.segments.iter().filter(|s| s.level == floor) {
                let count = segment.points.len();
                let mut current: Vec<Point2> = Vec::new();
                let mut raw_segments: Vec<Vec<Point2>> = Vec::new();

                for (index, point) in segment.points.iter().enumerate() {
                    let referenced = point
                        .location_id
                        .as_ref()
                        .map(|id| (id, find_location(locations, id)));

                    let position = match (point.coordinates, &referenced) {
                        (Some(pair), _) => Point2::from_pair(pair),
                        (None, Some((_, Some(loc)))) => match loc.coordinates.points().first() {
                            Some(p) => *p,
                            None => continue,
                        },
                        (None, Some((id, None))) => {
                            eprintln!(
                                "Route {}: point {} references unknown location {}, skipping",
                                route.id, index, id
                            );
                            continue;
                        }
                        (None, None) => continue,
                    };

                    current.push(position);

                    let description = point.description.clone().or_else(|| match &referenced {
                        Some((_, Some(loc))) => Some(loc.description.clone()),
                        _ => None,
                    });
                    if let Some(description) = description {
                        let label = if index == 0 {
                            "Start".to_string()
                        } else if index + 1 == count {
                            "End".to_string()
                        } else {
                            format!("Step {}", index)
                        };
                        overlay.markers.push(RouteMarker {
                            route_id: route.id.clone(),
                            position,
                            label,
                            description,
                        });
                    }

                    if point.gap && index + 1 < count {
                        raw_segments.push(std::mem::take(&mut current));
                    } else if let Some(extra) = &point.path_points {
                        if index + 1 < count {
                            current.extend(extra.iter().map(|p| Point2::from_pair(*p)));
                        }
                    }
                }

                if !current.is_empty() {
                    raw_segments.push(current);
                }

                for raw in raw_segments {
                    let points = if route.straight_lines {
                        raw
                    } else {
                        catmull_rom(&raw, SPLINE_SUBDIVISIONS)
                    };
                    overlay.paths.push(RoutePath {
                        route_id: route.id.clone(),
                        points,
                        color,
                        dash: dash.clone(),
                    });
                }
            }
        }
    }

    overlay
}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Catmull-Rom spline through the given points.
///
/// Ends are clamped by duplicating the first/last point as virtual
/// neighbors. Fewer than 3 points pass through unchanged - a straight pair
/// needs no smoothing.
pub fn catmull_rom(points: &[Point2], subdivisions: usize) -> Vec<Point2> {
    if points.len() < 3 || subdivisions < 2 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity((points.len() - 1) * subdivisions + 1);
    let last = points.len() - 1;

    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];

        for step in 0..subdivisions {
            let t = step as f32 / subdivisions as f32;
            out.push(catmull_rom_point(p0, p1, p2, p3, t));
        }
    }

    out.push(points[last]);
    out
}

fn catmull_rom_point(p0: Point2, p1: Point2, p2: Point2, p3: Point2, t: f32) -> Point2 {
    let t2 = t * t;
    let t3 = t2 * t;
    let interp = |a: f32, b: f32, c: f32, d: f32| -> f32 {
        0.5 * ((2.0 * b)
            + (-a + c) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };
    Point2::new(
        interp(p0.x, p1.x, p2.x, p3.x),
        interp(p0.y, p1.y, p2.y, p3.y),
    )
}

/// Parse a `#rrggbb` color string.
pub fn parse_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::from_rgba(r, g, b, 255))
}

/// Parse a dash pattern like `"10, 6"` into on/off lengths.
pub fn parse_dash_array(dash: &str) -> Option<Vec<f32>> {
    let parts: Vec<f32> = dash
        .split(',')
        .filter_map(|p| p.trim().parse::<f32>().ok())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_locations, parse_routes};

    const LOCATIONS: &str = r#"{
        "Level 1": {
            "Passage": {
                "stairs": [
                    {"id": 1, "title": "Stair", "description": "down",
                     "coordinates": [100, 100]}
                ],
                "portals": [
                    {"id": 2, "title": "Twin gates", "description": "paired",
                     "coordinates": [[10, 20], [30, 40]],
                     "container": ["west", "east"]}
                ]
            },
            "Runes": {
                "first circle": [
                    {"id": 3, "title": "Knock", "description": "rune",
                     "coordinates": [50, 50]},
                    {"id": 4, "title": "Mend", "description": "rune",
                     "coordinates": [60, 60], "icon": "icons/star.png", "scale": 220}
                ]
            },
            "Menageries": {
                "beasts": [
                    {"id": 5, "title": "Dire wolf", "description": "bitey",
                     "coordinates": [70, 70]}
                ]
            }
        }
    }"#;

    fn data() -> crate::model::LocationsData {
        parse_locations(LOCATIONS).unwrap()
    }

    #[test]
    fn test_hidden_category_produces_no_markers() {
        let mut vis = VisibilityStore::new();
        vis.toggle("First circle");
        let markers = build_markers("Level 1", &data(), &vis);
        assert!(markers.iter().all(|m| m.category != "First circle"));
        // Other visible subcategories still produce markers.
        assert!(markers.iter().any(|m| m.category == "Stairs"));
        assert!(markers.iter().any(|m| m.category == "Portals"));
    }

    #[test]
    fn test_multi_coordinates_expand_with_container_index() {
        let markers = build_markers("Level 1", &data(), &VisibilityStore::new());
        let gates: Vec<_> = markers.iter().filter(|m| m.category == "Portals").collect();
        assert_eq!(gates.len(), 2);
        assert_eq!(gates[0].container_index, Some(0));
        assert_eq!(gates[1].container_index, Some(1));
        assert_eq!(gates[1].location.container_at(1), Some("east"));

        let stair = markers.iter().find(|m| m.category == "Stairs").unwrap();
        assert_eq!(stair.container_index, None);
        // [y, x] pair maps to plane position.
        assert_eq!(stair.position, Point2::new(100.0, 100.0));
    }

    #[test]
    fn test_icon_resolution_order() {
        let markers = build_markers("Level 1", &data(), &VisibilityStore::new());

        // Explicit icon with a scale override.
        let mend = markers.iter().find(|m| m.location.title == "Mend").unwrap();
        assert_eq!(
            mend.icon,
            MarkerIcon::Image { path: "icons/star.png".into(), scale: 220.0 }
        );

        // Category default for passage/stairs.
        let stair = markers.iter().find(|m| m.category == "Stairs").unwrap();
        assert_eq!(
            stair.icon,
            MarkerIcon::Image { path: "icons/Stairs.png".into(), scale: 250.0 }
        );

        // No icon, no default: colored square keyed by main category.
        let wolf = markers.iter().find(|m| m.category == "Beasts").unwrap();
        assert!(matches!(wolf.icon, MarkerIcon::Square { .. }));
    }

    #[test]
    fn test_unknown_floor_is_empty() {
        let markers = build_markers("Level 9", &data(), &VisibilityStore::new());
        assert!(markers.is_empty());
    }

    #[test]
    fn test_double_toggle_restores_marker_set() {
        let data = data();
        let mut vis = VisibilityStore::new();
        let before = build_markers("Level 1", &data, &vis);
        vis.toggle("Stairs");
        vis.toggle("Stairs");
        let after = build_markers("Level 1", &data, &vis);
        assert_eq!(before.len(), after.len());
        assert!(before
            .iter()
            .zip(&after)
            .all(|(a, b)| a.position == b.position && a.category == b.category));
    }

    // ── Catmull-Rom ────────────────────────────────────────────────────────

    #[test]
    fn test_spline_two_points_unchanged() {
        let pts = vec![Point2::new(0.0, 0.0), Point2::new(10.0, 10.0)];
        assert_eq!(catmull_rom(&pts, SPLINE_SUBDIVISIONS), pts);
    }

    #[test]
    fn test_spline_three_points_interpolates() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 0.0),
        ];
        let smooth = catmull_rom(&pts, SPLINE_SUBDIVISIONS);
        assert!(smooth.len() > 2);
        assert_eq!(smooth.len(), 2 * SPLINE_SUBDIVISIONS + 1);
        // Clamped ends: the curve passes through the original endpoints.
        assert_eq!(smooth[0], pts[0]);
        assert_eq!(*smooth.last().unwrap(), pts[2]);
        // And through every original point.
        assert_eq!(smooth[SPLINE_SUBDIVISIONS], pts[1]);
    }

    // ── Routes ─────────────────────────────────────────────────────────────

    fn routes_json(points: &str, extra: &str) -> crate::model::RoutesData {
        let json = format!(
            r#"{{"farming": [{{
                "id": "r1", "title": "Loop", "description": "d"{},
                "segments": [{{"level": "Level 1", "points": {}}}]
            }}]}}"#,
            extra, points
        );
        parse_routes(&json).unwrap()
    }

    #[test]
    fn test_gap_breaks_into_two_path_segments() {
        let routes = routes_json(
            r#"[{"coordinates": [0, 0]},
                {"coordinates": [10, 10], "gap": true},
                {"coordinates": [20, 20]},
                {"coordinates": [30, 30]}]"#,
            "",
        );
        let overlay = build_routes("Level 1", &routes, &data(), &VisibilityStore::new());
        assert_eq!(overlay.paths.len(), 2);
        // No line connects the pre-gap point to the post-gap point.
        let first_end = *overlay.paths[0].points.last().unwrap();
        let second_start = overlay.paths[1].points[0];
        assert_eq!(first_end, Point2::new(10.0, 10.0));
        assert_eq!(second_start, Point2::new(20.0, 20.0));
    }

    #[test]
    fn test_path_points_inserted_before_next_point() {
        let routes = routes_json(
            r#"[{"coordinates": [0, 0], "pathPoints": [[1, 1], [2, 2]]},
                {"coordinates": [10, 10]}]"#,
            r#", "straightLines": true"#,
        );
        let overlay = build_routes("Level 1", &routes, &data(), &VisibilityStore::new());
        assert_eq!(overlay.paths.len(), 1);
        assert_eq!(overlay.paths[0].points.len(), 4);
        assert_eq!(overlay.paths[0].points[1], Point2::new(1.0, 1.0));
    }

    #[test]
    fn test_location_reference_resolution() {
        let routes = routes_json(
            r#"[{"locationId": 1},
                {"locationId": 999},
                {"coordinates": [5, 5]}]"#,
            r#", "straightLines": true"#,
        );
        let overlay = build_routes("Level 1", &routes, &data(), &VisibilityStore::new());
        // Unknown id skipped; known id resolves to the location's position.
        assert_eq!(overlay.paths.len(), 1);
        assert_eq!(overlay.paths[0].points.len(), 2);
        assert_eq!(overlay.paths[0].points[0], Point2::new(100.0, 100.0));
        // The resolved point inherits the location's description for its marker.
        assert_eq!(overlay.markers[0].description, "down");
        assert_eq!(overlay.markers[0].label, "Start");
    }

    #[test]
    fn test_route_marker_labels_by_position() {
        let routes = routes_json(
            r#"[{"coordinates": [0, 0], "description": "begin"},
                {"coordinates": [1, 1], "description": "middle"},
                {"coordinates": [2, 2], "description": "finish"}]"#,
            "",
        );
        let overlay = build_routes("Level 1", &routes, &data(), &VisibilityStore::new());
        let labels: Vec<_> = overlay.markers.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Start", "Step 1", "End"]);
    }

    #[test]
    fn test_hidden_route_category_draws_nothing() {
        let routes = routes_json(r#"[{"coordinates": [0, 0]}, {"coordinates": [1, 1]}]"#, "");
        let mut vis = VisibilityStore::new();
        vis.toggle("farming");
        let overlay = build_routes("Level 1", &routes, &data(), &vis);
        assert!(overlay.paths.is_empty());
        assert!(overlay.markers.is_empty());
    }

    #[test]
    fn test_other_floor_segments_excluded() {
        let json = r#"{"farming": [{
            "id": "r1", "title": "Loop", "description": "d",
            "segments": [{"level": "Level 2", "points": [
                {"coordinates": [0, 0]}, {"coordinates": [1, 1]}
            ]}]
        }]}"#;
        let routes = parse_routes(json).unwrap();
        let overlay = build_routes("Level 1", &routes, &data(), &VisibilityStore::new());
        assert!(overlay.paths.is_empty());
    }

    #[test]
    fn test_straight_lines_skips_smoothing() {
        let routes = routes_json(
            r#"[{"coordinates": [0, 0]}, {"coordinates": [10, 0]}, {"coordinates": [20, 5]}]"#,
            r#", "straightLines": true"#,
        );
        let overlay = build_routes("Level 1", &routes, &data(), &VisibilityStore::new());
        assert_eq!(overlay.paths[0].points.len(), 3);
    }

    #[test]
    fn test_color_and_dash_parsing() {
        assert_eq!(
            parse_color("#ff8000"),
            Some(Color::from_rgba(255, 128, 0, 255))
        );
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_dash_array("10, 6"), Some(vec![10.0, 6.0]));
        assert_eq!(parse_dash_array(""), None);
    }
}
