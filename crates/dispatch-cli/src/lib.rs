//! Dispatch CLI - command line tools for the campus delivery simulation.
//!
//! - `client`: HTTP/WebSocket client for the dispatch server
//! - `render`: plain-text rendering of orders and drones

pub mod client;
pub mod render;

pub use client::{DispatchClient, SnapshotStream, StreamFrame};
