//! Shared building blocks for debug-harness.
//!
//! - **config**: TOML configuration with per-session timing knobs
//! - **markers**: prompt grammar and well-known debugger output markers
//! - **io_util**: bounded-length stream reads

pub mod config;
pub mod io_util;
pub mod markers;
