//! Campus delivery dispatch CLI.
//!
//! Talks to a running dispatch server, or runs the simulation offline with
//! `simulate`.
//!
//! Usage:
//!   cargo run -p dispatch-cli --bin dispatch -- order --from gate_1 --to dorm_1
//!   cargo run -p dispatch-cli --bin dispatch -- start --speed 5
//!   cargo run -p dispatch-cli --bin dispatch -- watch --events tick
//!   cargo run -p dispatch-cli --bin dispatch -- simulate --speed 5

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tokio::time;

use dispatch_cli::render;
use dispatch_cli::DispatchClient;
use dispatch_core::{
    LocationRegistry, OrderRequest, RouteCatalog, Simulation, SpeedMultiplier, BASE_TICK_INTERVAL,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Campus drone delivery dispatch")]
struct Args {
    /// Dispatch server URL
    #[arg(long, global = true, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a delivery order
    Order {
        /// Pickup location id (gate or canteen)
        #[arg(long)]
        from: String,
        /// Drop-off location id (dorm)
        #[arg(long)]
        to: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Assign a drone to a pending order
    Dispatch { order_id: String },
    /// Start the simulation clock
    Start {
        #[arg(long)]
        speed: Option<f64>,
    },
    /// Stop the simulation clock
    Stop,
    /// Clear all orders and drones
    Reset,
    /// Change the speed multiplier
    Speed { value: f64 },
    /// Print the current snapshot
    Status,
    /// List known pickup and drop-off locations
    Locations,
    /// Show route catalog statistics
    Routes,
    /// Follow the snapshot stream
    Watch {
        /// Comma-separated events to receive, e.g. `tick,reset`
        #[arg(long)]
        events: Option<String>,
    },
    /// Run a simulation locally without a server
    Simulate {
        /// Pickup/drop-off pairs as `from:to`
        #[arg(long = "order", default_values_t = [String::from("gate_1:dorm_1")])]
        orders: Vec<String>,
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Route catalog JSON file
        #[arg(long)]
        routes: Option<std::path::PathBuf>,
        /// Give up after this many ticks
        #[arg(long, default_value_t = 1000)]
        max_ticks: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let client = DispatchClient::new(&args.url);

    match args.command {
        Command::Order { from, to, description } => {
            let mut request = OrderRequest::new(from, to);
            if let Some(text) = description {
                request = request.with_description(text);
            }
            let order = client.submit_order(&request).await?;
            println!("Created {}", render::order_line(&order));
        }
        Command::Dispatch { order_id } => {
            let drone = client.dispatch_order(&order_id).await?;
            println!("{} assigned to {} ({} waypoints)", drone.id, drone.order_id, drone.path.len());
        }
        Command::Start { speed } => {
            let snapshot = client.start(speed).await?;
            println!("{}", render::snapshot_summary(&snapshot));
        }
        Command::Stop => {
            let snapshot = client.stop().await?;
            println!("{}", render::snapshot_summary(&snapshot));
        }
        Command::Reset => {
            client.reset().await?;
            println!("Simulation reset");
        }
        Command::Speed { value } => {
            let snapshot = client.set_speed(value).await?;
            println!("Speed set to {}X", snapshot.speed_multiplier);
        }
        Command::Status => {
            let snapshot = client.snapshot().await?;
            println!("{}", render::snapshot_summary(&snapshot));
        }
        Command::Locations => {
            let registry = client.locations().await?;
            println!("{}", render::locations_table(&registry));
        }
        Command::Routes => {
            let stats = client.route_stats().await?;
            println!("{} routes", stats.total_routes);
            for category in &stats.categories {
                let mean = category
                    .mean_length_m
                    .map(|m| format!("{:.0}m", m))
                    .unwrap_or_else(|| "-".to_string());
                println!("  {:<20} {:>4} routes, mean {}", category.name, category.route_count, mean);
            }
        }
        Command::Watch { events } => watch(&client, events.as_deref()).await?,
        Command::Simulate { orders, speed, routes, max_ticks } => {
            simulate(&orders, speed, routes.as_deref(), max_ticks).await?
        }
    }

    Ok(())
}

async fn watch(client: &DispatchClient, events: Option<&str>) -> Result<()> {
    let mut stream = client.connect_stream(events).await?;
    println!("Connected, Ctrl+C to quit");

    loop {
        tokio::select! {
            frame = stream.next_frame() => {
                match frame? {
                    Some(frame) => {
                        println!("[{}] {}", frame.event, render::snapshot_summary(&frame.snapshot));
                    }
                    None => {
                        println!("Server closed the stream");
                        return Ok(());
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

async fn simulate(
    pairs: &[String],
    speed: f64,
    routes: Option<&std::path::Path>,
    max_ticks: u64,
) -> Result<()> {
    let speed = SpeedMultiplier::new(speed)?;
    let catalog = match routes {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Some(RouteCatalog::from_json(&text)?)
        }
        None => None,
    };

    let mut sim = Simulation::new(LocationRegistry::builtin(), catalog);
    sim.set_speed(speed);
    for pair in pairs {
        let (from, to) = pair
            .split_once(':')
            .with_context(|| format!("expected from:to, got {}", pair))?;
        let order = sim.submit_order(&OrderRequest::new(from, to))?;
        println!("Created {}", render::order_line(&order));
    }

    let launched = sim.start();
    println!("Started at {} with {} drones", speed, launched.len());

    let period: Duration = speed.tick_interval(BASE_TICK_INTERVAL);
    let mut ticker = time::interval(period);
    ticker.tick().await;

    while sim.tick_count() < max_ticks {
        ticker.tick().await;
        let report = sim.tick();
        println!("{}", render::tick_line(&report));
        if sim.drones().iter().all(|d| d.is_completed()) {
            println!("All deliveries completed after {} ticks", sim.tick_count());
            return Ok(());
        }
    }

    anyhow::bail!("deliveries still in flight after {} ticks", max_ticks)
}
