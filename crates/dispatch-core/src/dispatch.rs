//! Flight assignment for orders: catalog lookup with straight-line fallback.

use serde::{Deserialize, Serialize};

use crate::catalog::RouteCatalog;
use crate::geo::{lerp, Coordinate};
use crate::orders::Order;

/// Altitude used for synthesized paths and catalog routes without one.
pub const DEFAULT_ALTITUDE_M: f64 = 75.0;

/// Segments in a synthesized path (points = steps + 1).
pub const FALLBACK_STEPS: usize = 20;

/// Where an assignment's path came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RouteSource {
    Catalog { category: String, index: usize },
    Synthesized,
}

/// A concrete flight for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightAssignment {
    pub path: Vec<Coordinate>,
    pub altitude_m: f64,
    pub source: RouteSource,
}

/// Straight line from `start` to `end` in [`FALLBACK_STEPS`] equal segments.
pub fn synthesize_path(start: Coordinate, end: Coordinate) -> Vec<Coordinate> {
    (0..=FALLBACK_STEPS)
        .map(|i| lerp(start, end, i as f64 / FALLBACK_STEPS as f64))
        .collect()
}

/// Pick a flight path and altitude for `order`. Never fails: a missing
/// catalog or a lookup miss degrades to a synthesized straight line.
pub fn dispatch(order: &Order, catalog: Option<&RouteCatalog>) -> FlightAssignment {
    let hit = catalog.and_then(|c| c.find_route(order.start_point, order.end_point));

    match hit {
        Some(hit) => {
            tracing::debug!(
                order_id = %order.id,
                category = hit.category,
                index = hit.index,
                "Using catalog route"
            );
            FlightAssignment {
                path: hit.route.path.clone(),
                altitude_m: hit.route.altitude_m.unwrap_or(DEFAULT_ALTITUDE_M),
                source: RouteSource::Catalog {
                    category: hit.category.to_string(),
                    index: hit.index,
                },
            }
        }
        None => {
            tracing::debug!(order_id = %order.id, "No catalog route, synthesizing straight path");
            FlightAssignment {
                path: synthesize_path(order.start_point, order.end_point),
                altitude_m: DEFAULT_ALTITUDE_M,
                source: RouteSource::Synthesized,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Route, CANTEEN_TO_DORM, GATE_TO_DORM};
    use crate::locations::LocationRegistry;
    use crate::orders::OrderRequest;

    fn canteen_order() -> Order {
        Order::from_request(&LocationRegistry::builtin(), &OrderRequest::new("canteen_1", "dorm_1")).unwrap()
    }

    #[test]
    fn synthesized_path_has_21_points_between_endpoints() {
        let start = Coordinate::new(116.315263, 40.0053343);
        let end = Coordinate::new(116.320263, 40.0103343);
        let path = synthesize_path(start, end);

        assert_eq!(path.len(), 21);
        assert_eq!(path[0], start);
        assert!((path[20].lon - end.lon).abs() < 1e-12);
        assert!((path[20].lat - end.lat).abs() < 1e-12);
        assert!((path[10].lon - 116.317763).abs() < 1e-9);
        assert!((path[10].lat - 40.0078343).abs() < 1e-9);
    }

    #[test]
    fn no_catalog_falls_back() {
        let order = canteen_order();
        let assignment = dispatch(&order, None);
        assert_eq!(assignment.source, RouteSource::Synthesized);
        assert_eq!(assignment.altitude_m, DEFAULT_ALTITUDE_M);
        assert_eq!(assignment.path.len(), 21);
        assert_eq!(assignment.path[0], order.start_point);
    }

    #[test]
    fn catalog_miss_falls_back() {
        let order = canteen_order();
        let catalog = RouteCatalog::new([(
            GATE_TO_DORM,
            vec![Route::new(vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)], Some(100.0))],
        )]);
        let assignment = dispatch(&order, Some(&catalog));
        assert_eq!(assignment.source, RouteSource::Synthesized);
        assert_eq!(assignment.altitude_m, 75.0);
    }

    #[test]
    fn catalog_hit_uses_route_path_and_altitude() {
        let order = canteen_order();
        let route_path = vec![order.start_point, Coordinate::new(116.318, 40.007), order.end_point];
        let catalog = RouteCatalog::new([(CANTEEN_TO_DORM, vec![Route::new(route_path.clone(), Some(50.0))])]);

        let assignment = dispatch(&order, Some(&catalog));
        assert_eq!(assignment.path, route_path);
        assert_eq!(assignment.altitude_m, 50.0);
        assert_eq!(
            assignment.source,
            RouteSource::Catalog { category: CANTEEN_TO_DORM.into(), index: 0 }
        );
    }

    #[test]
    fn catalog_hit_without_altitude_uses_default() {
        let order = canteen_order();
        let catalog = RouteCatalog::new([(
            CANTEEN_TO_DORM,
            vec![Route::new(vec![order.start_point, order.end_point], None)],
        )]);
        assert_eq!(dispatch(&order, Some(&catalog)).altitude_m, DEFAULT_ALTITUDE_M);
    }
}
