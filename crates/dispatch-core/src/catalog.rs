//! Pre-computed route catalog and endpoint lookup.
//!
//! The catalog document groups routes by category (`canteen_to_dorm`,
//! `gate_to_dorm`, ...). Categories keep the order they appear in the
//! document, and the whole catalog is flattened once into a single list
//! that [`RouteCatalog::find_route`] scans.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::{is_near, path_length_m, Coordinate};

pub const CANTEEN_TO_DORM: &str = "canteen_to_dorm";
pub const GATE_TO_DORM: &str = "gate_to_dorm";

/// Label of a route endpoint. Planner output carries location names,
/// hand-written catalogs sometimes carry the raw point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteEndpoint {
    Point(Coordinate),
    Name(String),
}

impl fmt::Display for RouteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteEndpoint::Point(c) => write!(f, "[{}, {}]", c.lon, c.lat),
            RouteEndpoint::Name(name) => f.write_str(name),
        }
    }
}

/// A precomputed flight corridor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub from: Option<RouteEndpoint>,
    #[serde(default)]
    pub to: Option<RouteEndpoint>,
    #[serde(default)]
    pub path: Vec<Coordinate>,
    /// Cruise altitude in meters; the planner writes it as `height`.
    #[serde(default, rename = "height", alias = "altitude", alias = "altitude_m")]
    pub altitude_m: Option<f64>,
}

impl Route {
    pub fn new(path: Vec<Coordinate>, altitude_m: Option<f64>) -> Self {
        Self {
            from: None,
            to: None,
            path,
            altitude_m,
        }
    }

    /// Attach endpoint labels.
    pub fn labeled(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from = Some(RouteEndpoint::Name(from.into()));
        self.to = Some(RouteEndpoint::Name(to.into()));
        self
    }

    /// True when the route's first and last path points are near `start`/`end`.
    pub fn connects(&self, start: Coordinate, end: Coordinate) -> bool {
        is_near(Some(start), self.path.first().copied()) && is_near(Some(end), self.path.last().copied())
    }
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    category: usize,
    index: usize,
    route: Route,
}

/// A catalog hit: the route plus where it was registered.
#[derive(Debug, Clone, Copy)]
pub struct RouteMatch<'a> {
    pub category: &'a str,
    pub index: usize,
    pub route: &'a Route,
}

/// Flattened, read-only route catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "CatalogDocument")]
pub struct RouteCatalog {
    categories: Vec<String>,
    entries: Vec<CatalogEntry>,
}

impl RouteCatalog {
    /// Build a catalog from categories in registration order.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<Route>)>,
        S: Into<String>,
    {
        let mut names = Vec::new();
        let mut entries = Vec::new();

        for (category, routes) in categories {
            let category_idx = names.len();
            names.push(category.into());
            entries.extend(routes.into_iter().enumerate().map(|(index, route)| CatalogEntry {
                category: category_idx,
                index,
                route,
            }));
        }

        Self {
            categories: names,
            entries,
        }
    }

    /// The catalog used when no route data could be loaded.
    pub fn empty() -> Self {
        Self::new([(CANTEEN_TO_DORM, Vec::new()), (GATE_TO_DORM, Vec::new())])
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    /// Iterate routes in scan order.
    pub fn routes(&self) -> impl Iterator<Item = RouteMatch<'_>> {
        self.entries.iter().map(|entry| RouteMatch {
            category: &self.categories[entry.category],
            index: entry.index,
            route: &entry.route,
        })
    }

    /// First route (in scan order) whose path starts near `start` and ends near `end`.
    ///
    /// Routes without path points are skipped.
    pub fn find_route(&self, start: Coordinate, end: Coordinate) -> Option<RouteMatch<'_>> {
        self.routes()
            .filter(|m| !m.route.path.is_empty())
            .find(|m| m.route.connects(start, end))
    }

    /// Route counts and mean lengths per category.
    pub fn stats(&self) -> CatalogStats {
        let categories: Vec<CategoryStats> = self
            .categories
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let lengths: Vec<f64> = self
                    .entries
                    .iter()
                    .filter(|e| e.category == idx)
                    .map(|e| &e.route)
                    .filter(|r| !r.path.is_empty())
                    .map(|r| path_length_m(&r.path))
                    .collect();
                CategoryStats {
                    name: name.clone(),
                    route_count: self.entries.iter().filter(|e| e.category == idx).count(),
                    mean_length_m: mean(&lengths),
                }
            })
            .collect();

        let all_lengths: Vec<f64> = self
            .entries
            .iter()
            .filter(|e| !e.route.path.is_empty())
            .map(|e| path_length_m(&e.route.path))
            .collect();

        CatalogStats {
            total_routes: self.entries.len(),
            mean_length_m: mean(&all_lengths),
            categories,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStats {
    pub name: String,
    pub route_count: usize,
    pub mean_length_m: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_routes: usize,
    pub mean_length_m: Option<f64>,
    pub categories: Vec<CategoryStats>,
}

/// On-disk shape: `{ "routes": { "<category>": [Route, ...] } }`.
/// Other top-level keys (planner statistics and the like) are ignored.
#[derive(Deserialize)]
struct CatalogDocument {
    #[serde(deserialize_with = "ordered_categories")]
    routes: Vec<(String, Vec<Route>)>,
}

impl From<CatalogDocument> for RouteCatalog {
    fn from(doc: CatalogDocument) -> Self {
        RouteCatalog::new(doc.routes)
    }
}

/// Read the category map keeping document order (a plain map type would sort it).
fn ordered_categories<'de, D>(deserializer: D) -> Result<Vec<(String, Vec<Route>)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CategoriesVisitor;

    impl<'de> Visitor<'de> for CategoriesVisitor {
        type Value = Vec<(String, Vec<Route>)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of route category name to route list")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut categories = Vec::new();
            while let Some((name, routes)) = map.next_entry::<String, Vec<Route>>()? {
                categories.push((name, routes));
            }
            Ok(categories)
        }
    }

    deserializer.deserialize_map(CategoriesVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat)
    }

    #[test]
    fn empty_catalog_has_canonical_categories() {
        let catalog = RouteCatalog::empty();
        assert!(catalog.is_empty());
        let names: Vec<&str> = catalog.categories().collect();
        assert_eq!(names, vec![CANTEEN_TO_DORM, GATE_TO_DORM]);
        assert!(catalog.find_route(pt(0.0, 0.0), pt(1.0, 1.0)).is_none());
    }

    #[test]
    fn coordinate_endpoints_and_altitude_alias_parse() {
        let json = r#"{
            "routes": {
                "gate_to_dorm": [
                    {
                        "from": [116.0, 40.0],
                        "to": "紫荆学生公寓1号楼",
                        "path": [[116.0, 40.0], [116.01, 40.01]],
                        "altitude": 90
                    }
                ]
            }
        }"#;
        let catalog = RouteCatalog::from_json(json).unwrap();
        let hit = catalog.find_route(pt(116.0, 40.0), pt(116.01, 40.01)).expect("route");

        assert_eq!(hit.route.from, Some(RouteEndpoint::Point(pt(116.0, 40.0))));
        assert_eq!(hit.route.to, Some(RouteEndpoint::Name("紫荆学生公寓1号楼".into())));
        assert_eq!(hit.route.altitude_m, Some(90.0));
        assert_eq!(hit.route.from.as_ref().unwrap().to_string(), "[116, 40]");
    }

    #[test]
    fn labeled_route_writes_planner_field_names() {
        let route = Route::new(vec![pt(116.0, 40.0), pt(116.01, 40.01)], Some(60.0)).labeled("东门", "紫荆学生公寓2号楼");
        assert_eq!(route.from, Some(RouteEndpoint::Name("东门".into())));

        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["from"], "东门");
        assert_eq!(json["to"], "紫荆学生公寓2号楼");
        assert_eq!(json["height"], 60.0);
        assert_eq!(json["path"][0], serde_json::json!([116.0, 40.0]));
    }

    #[test]
    fn exact_endpoints_match() {
        let start = pt(116.315263, 40.0053343);
        let end = pt(116.320263, 40.0103343);
        let catalog = RouteCatalog::new([(
            CANTEEN_TO_DORM,
            vec![Route::new(vec![start, pt(116.317, 40.008), end], Some(75.0))],
        )]);

        let hit = catalog.find_route(start, end).expect("route");
        assert_eq!(hit.category, CANTEEN_TO_DORM);
        assert_eq!(hit.index, 0);
        assert_eq!(hit.route.path.len(), 3);
    }

    #[test]
    fn first_match_wins_across_categories() {
        let start = pt(116.0, 40.0);
        let end = pt(116.01, 40.01);
        let catalog = RouteCatalog::new([
            (CANTEEN_TO_DORM, vec![Route::new(vec![pt(0.0, 0.0), pt(1.0, 1.0)], None)]),
            (
                GATE_TO_DORM,
                vec![
                    Route::new(vec![start, end], Some(100.0)),
                    Route::new(vec![start, pt(116.005, 40.005), end], Some(50.0)),
                ],
            ),
        ]);

        let hit = catalog.find_route(start, end).expect("route");
        assert_eq!(hit.category, GATE_TO_DORM);
        assert_eq!(hit.index, 0);
        assert_eq!(hit.route.altitude_m, Some(100.0));
    }

    #[test]
    fn skips_routes_without_points() {
        let start = pt(116.0, 40.0);
        let end = pt(116.01, 40.01);
        let catalog = RouteCatalog::new([(
            CANTEEN_TO_DORM,
            vec![Route::new(Vec::new(), Some(50.0)), Route::new(vec![start, end], None)],
        )]);

        assert_eq!(catalog.find_route(start, end).map(|m| m.index), Some(1));
    }

    #[test]
    fn reversed_route_does_not_match() {
        let start = pt(116.0, 40.0);
        let end = pt(116.01, 40.01);
        let catalog = RouteCatalog::new([(GATE_TO_DORM, vec![Route::new(vec![end, start], None)])]);
        assert!(catalog.find_route(start, end).is_none());
    }

    #[test]
    fn parses_planner_document_in_order() {
        let json = r#"{
            "routes": {
                "gate_to_dorm": [
                    {"from": "Gate 1", "to": "Dorm 1", "path": [[116.0, 40.0], [116.01, 40.01]], "height": 100}
                ],
                "canteen_to_dorm": [
                    {"from": "Canteen 1", "to": "Dorm 1", "path": [[116.0, 40.0], [116.01, 40.01]], "height": 75}
                ]
            },
            "statistics": {"total_gate_routes": 1}
        }"#;

        let catalog = RouteCatalog::from_json(json).unwrap();
        let names: Vec<&str> = catalog.categories().collect();
        assert_eq!(names, vec![GATE_TO_DORM, CANTEEN_TO_DORM]);

        let hit = catalog.find_route(pt(116.0, 40.0), pt(116.01, 40.01)).unwrap();
        assert_eq!(hit.category, GATE_TO_DORM);
        assert_eq!(hit.route.altitude_m, Some(100.0));
        assert_eq!(hit.route.from, Some(RouteEndpoint::Name("Gate 1".into())));
    }

    #[test]
    fn stats_report_counts_and_lengths() {
        let catalog = RouteCatalog::new([
            (CANTEEN_TO_DORM, vec![Route::new(vec![pt(0.0, 0.0), pt(0.0, 0.001)], None)]),
            (GATE_TO_DORM, vec![]),
        ]);

        let stats = catalog.stats();
        assert_eq!(stats.total_routes, 1);
        assert_eq!(stats.categories[0].route_count, 1);
        assert_eq!(stats.categories[1].route_count, 0);
        assert!(stats.categories[1].mean_length_m.is_none());
        let mean = stats.mean_length_m.unwrap();
        assert!((mean - 111.2).abs() < 1.0);
    }
}
