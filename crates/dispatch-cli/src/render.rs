//! Plain-text rendering for terminal output.

use dispatch_core::{DroneView, LocationRegistry, Order, SimulationSnapshot, TickReport};

pub fn order_line(order: &Order) -> String {
    format!(
        "{} {:<10} {:?} {} -> {}",
        order.id, order.order_number, order.status, order.start_location_name, order.end_location_name
    )
}

pub fn drone_line(view: &DroneView) -> String {
    let drone = &view.drone;
    format!(
        "{} [{}] {:?} {:>5.1}% idx {}/{} pos ({:.6}, {:.6}) {:.0}m left",
        drone.id,
        drone.order_id,
        drone.status,
        view.progress_percent,
        drone.path_index,
        drone.path.len().saturating_sub(1),
        drone.current_position.lon,
        drone.current_position.lat,
        view.remaining_distance_m,
    )
}

pub fn snapshot_summary(snapshot: &SimulationSnapshot) -> String {
    let state = if snapshot.running { "RUNNING" } else { "STOPPED" };
    let mut out = format!(
        "{} at {}X, tick {}, {} orders, {} drones",
        state,
        snapshot.speed_multiplier,
        snapshot.tick_count,
        snapshot.orders.len(),
        snapshot.drones.len()
    );
    for order in &snapshot.orders {
        out.push_str("\n  ");
        out.push_str(&order_line(order));
    }
    for drone in &snapshot.drones {
        out.push_str("\n  ");
        out.push_str(&drone_line(drone));
    }
    out
}

pub fn tick_line(report: &TickReport) -> String {
    let mut parts = vec![format!("tick {}", report.tick)];
    if !report.departed.is_empty() {
        parts.push(format!("departed {}", report.departed.join(",")));
    }
    if report.moved > 0 {
        parts.push(format!("{} moving", report.moved));
    }
    if !report.completed_orders.is_empty() {
        parts.push(format!("completed {}", report.completed_orders.join(",")));
    }
    parts.join(" | ")
}

pub fn locations_table(registry: &LocationRegistry) -> String {
    registry
        .all()
        .map(|loc| {
            format!(
                "{:<10} {:<8} ({:.6}, {:.6}) {}",
                loc.id, loc.category, loc.coordinates.lon, loc.coordinates.lat, loc.name
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
