//! # Route file
//!
//! YAML route definitions: an ordered polyline and the stops served along it.
//!
//! ```yaml
//! id: "NX1"
//! name: "Northern Express"
//! points:
//!   - { lat: -36.8485, lng: 174.7633 }
//!   - { lat: -36.8400, lng: 174.7500 }
//! stops:
//!   - { id: "britomart", name: "Britomart", lat: -36.8443, lng: 174.7676 }
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context as _;
use realtime::{Result, validation};
use route_analytics::{Coordinate, RouteGeometry, Stop};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub id: String,
    pub name: String,
    pub points: Vec<RoutePoint>,
    #[serde(default)]
    pub stops: Vec<StopDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopDefinition {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl RouteDefinition {
    /// Parse a route definition from YAML.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the document is not a valid route
    /// definition.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|err| validation!("invalid route definition: {err}"))
    }

    /// Read and parse a route definition file.
    ///
    /// # Errors
    ///
    /// Returns an internal error when the file cannot be read and a
    /// validation error when it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("failed to read route file {}", path.display()))?;
        Self::from_yaml(&yaml)
    }

    /// Build the route geometry, validating points and stops.
    ///
    /// # Errors
    ///
    /// Returns the validation or computation error raised while loading the
    /// geometry, prefixed with the route id.
    pub fn geometry(&self) -> Result<RouteGeometry> {
        let points = self.points.iter().map(|p| Coordinate::new(p.lat, p.lng)).collect();
        let stops = self
            .stops
            .iter()
            .map(|s| Stop::new(s.id.clone(), s.name.clone(), Coordinate::new(s.lat, s.lng)))
            .collect();

        let geometry =
            RouteGeometry::load(points, stops).with_context(|| format!("route {}", self.id))?;
        tracing::info!(route_id = %self.id, route_name = %self.name, "route loaded");
        Ok(geometry)
    }
}
