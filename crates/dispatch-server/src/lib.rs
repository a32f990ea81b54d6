//! Shared library surface for dispatch server utilities and tests.

pub mod api;
pub mod config;
pub mod loops;
pub mod providers;
pub mod state;
