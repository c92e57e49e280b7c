//! Configuration management for the lift simulation server.
//!
//! Loads configuration from environment variables with sensible defaults.

use liftsim_runtime::{RuntimeConfig, TripTiming};
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Simulation timing configuration.
    pub simulation: SimulationConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Graceful shutdown timeout in seconds.
    pub shutdown_timeout: u64,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (created if missing).
    pub path: String,
}

/// Simulation timing configuration.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Milliseconds per floor traversed.
    pub floor_trip_ms: u64,
    /// Door opening delay in milliseconds.
    pub door_open_ms: u64,
    /// Door closing delay in milliseconds.
    pub door_close_ms: u64,
    /// Bound on the status broadcast channel.
    pub broadcast_depth: usize,
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parsed_env("PORT", 8080),
                log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
                shutdown_timeout: parsed_env("SHUTDOWN_TIMEOUT", 20),
            },
            database: DatabaseConfig {
                path: env::var("DATABASE_PATH")
                    .unwrap_or_else(|_| "./db/lift_simulation.sqlite".to_string()),
            },
            simulation: SimulationConfig {
                floor_trip_ms: parsed_env("FLOOR_TRIP_MS", 2000),
                door_open_ms: parsed_env("DOOR_OPEN_MS", 2500),
                door_close_ms: parsed_env("DOOR_CLOSE_MS", 2500),
                broadcast_depth: parsed_env("BROADCAST_DEPTH", 64),
            },
        }
    }

    /// The runtime tunables derived from this configuration.
    #[must_use]
    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            timing: TripTiming {
                floor_travel: Duration::from_millis(self.simulation.floor_trip_ms),
                door_open: Duration::from_millis(self.simulation.door_open_ms),
                door_close: Duration::from_millis(self.simulation.door_close_ms),
            },
            broadcast_depth: self.simulation.broadcast_depth,
        }
    }

    /// `host:port` for the TCP listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
