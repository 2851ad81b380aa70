//! # Fleet Tracking
//!
//! Wires the route definition and runtime configuration into a ready-to-use
//! [`IngestService`].

mod config;
pub mod route_file;

use std::path::Path;

pub use realtime::{Error, Result};
pub use route_analytics::{AnalyticsSnapshot, RouteGeometry};
pub use vehicle_tracking::{Config, IngestService, Ping, Provider, TrackingRecord, VehicleUpdate};

pub use self::config::*;
use self::route_file::RouteDefinition;

/// Build an ingest service for the route in `route_file`.
///
/// # Errors
///
/// Returns an error when the route file cannot be read or describes an
/// invalid route.
pub fn build_service<P: Provider>(
    provider: P, route_file: impl AsRef<Path>, config: Config,
) -> Result<IngestService<P>> {
    let route = RouteDefinition::from_file(route_file)?.geometry()?;
    Ok(IngestService::new(provider, route, config))
}

/// Build an ingest service from `ROUTE_FILE` and the tracking environment
/// variables.
///
/// # Errors
///
/// Returns an error when the route file cannot be read or describes an
/// invalid route.
pub fn service_from_env<P: Provider>(provider: P) -> Result<IngestService<P>> {
    build_service(provider, get_route_file(), Config::from_env())
}
