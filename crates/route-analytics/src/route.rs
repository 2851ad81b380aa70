//! Route geometry and map-matching onto the route polyline.

use std::collections::HashSet;

use anyhow::Context as _;
use realtime::{Result, computation, validation};
use serde::{Deserialize, Serialize};

use crate::geo::{Coordinate, closest_point_on_segment};

// Segments closer than this are considered equidistant.
const TIE_EPSILON_KM: f64 = 1e-9;

/// A named stop on the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    /// Unique within a route.
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
}

impl Stop {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self { id: id.into(), name: name.into(), coordinate }
    }
}

/// Result of projecting a raw coordinate onto the route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// Nearest point on the route.
    pub matched: Coordinate,
    /// Great-circle path length from the route start to `matched`.
    pub cumulative_distance_km: f64,
    /// Distance between the query point and `matched`.
    pub distance_to_route_km: f64,
    /// Index of the matched segment (segment `i` runs from point `i` to `i + 1`).
    pub segment_index: usize,
}

/// Immutable route polyline and its stops.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    points: Vec<Coordinate>,
    // cumulative_km[i] is the path length from points[0] to points[i]
    cumulative_km: Vec<f64>,
    stops: Vec<Stop>,
}

impl RouteGeometry {
    /// Load a route from its ordered points (travel order) and stops.
    ///
    /// # Errors
    ///
    /// Returns a validation error when fewer than two points are given, a
    /// coordinate is out of range, or a stop id is blank or duplicated.
    /// Returns a computation error when two consecutive points coincide.
    pub fn load(points: Vec<Coordinate>, stops: Vec<Stop>) -> Result<Self> {
        if points.len() < 2 {
            return Err(validation!("route needs at least 2 points, got {}", points.len()));
        }

        for (index, point) in points.iter().enumerate() {
            point.validate().with_context(|| format!("route point {index}"))?;
        }

        let mut cumulative_km = Vec::with_capacity(points.len());
        cumulative_km.push(0.0);
        for (index, pair) in points.windows(2).enumerate() {
            let length = pair[0].distance_km(&pair[1]);
            if pair[0] == pair[1] || length <= 0.0 {
                return Err(computation!(
                    "zero-length segment {index} at ({}, {})",
                    pair[0].latitude,
                    pair[0].longitude
                ));
            }
            let total = cumulative_km[index] + length;
            cumulative_km.push(total);
        }

        let mut seen = HashSet::new();
        for stop in &stops {
            if stop.id.trim().is_empty() {
                return Err(validation!("stop `{}` has a blank id", stop.name));
            }
            stop.coordinate.validate().with_context(|| format!("stop {}", stop.id))?;
            if !seen.insert(stop.id.as_str()) {
                return Err(validation!("duplicate stop id {}", stop.id));
            }
        }

        tracing::debug!(
            points = points.len(),
            stops = stops.len(),
            length_km = cumulative_km.last().copied().unwrap_or_default(),
            "route loaded"
        );

        Ok(Self { points, cumulative_km, stops })
    }

    /// Project `point` onto the nearest segment of the route.
    ///
    /// Equidistant segments resolve to the one nearer the route start so
    /// progress leans forward under ambiguity.
    #[must_use]
    pub fn project(&self, point: Coordinate) -> Projection {
        let mut best: Option<Projection> = None;

        for (index, pair) in self.points.windows(2).enumerate() {
            let matched = closest_point_on_segment(point, pair[0], pair[1]);
            let distance = point.distance_km(&matched);

            if best.is_some_and(|b| distance >= b.distance_to_route_km - TIE_EPSILON_KM) {
                continue;
            }

            best = Some(Projection {
                matched,
                cumulative_distance_km: self.cumulative_km[index] + pair[0].distance_km(&matched),
                distance_to_route_km: distance,
                segment_index: index,
            });
        }

        // a loaded route always has at least one segment
        best.unwrap_or_else(|| Projection {
            matched: self.points[0],
            cumulative_distance_km: 0.0,
            distance_to_route_km: point.distance_km(&self.points[0]),
            segment_index: 0,
        })
    }

    /// Stops in configured order.
    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Route points in travel order.
    #[must_use]
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Total path length of the route.
    #[must_use]
    pub fn length_km(&self) -> f64 {
        self.cumulative_km.last().copied().unwrap_or_default()
    }

    /// Look up a stop by id.
    #[must_use]
    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stops.iter().find(|stop| stop.id == id)
    }
}

#[cfg(test)]
mod tests {
    use realtime::Error;

    use super::*;

    fn equator_route() -> RouteGeometry {
        RouteGeometry::load(
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0)],
            vec![Stop::new("A", "Midway", Coordinate::new(0.0, 0.5))],
        )
        .expect("route should load")
    }

    #[test]
    fn rejects_single_point() {
        let err = RouteGeometry::load(vec![Coordinate::new(0.0, 0.0)], vec![]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn rejects_duplicate_stop_ids() {
        let err = RouteGeometry::load(
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0)],
            vec![
                Stop::new("A", "First", Coordinate::new(0.0, 0.1)),
                Stop::new("A", "Second", Coordinate::new(0.0, 0.9)),
            ],
        )
        .unwrap_err();
        assert_eq!(err, Error::Validation("duplicate stop id A".to_string()));
    }

    #[test]
    fn rejects_zero_length_segment() {
        let err = RouteGeometry::load(
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0)],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }

    #[test]
    fn rejects_out_of_range_point() {
        let err = RouteGeometry::load(
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(95.0, 1.0)],
            vec![],
        )
        .unwrap_err();
        let Error::Validation(description) = err else {
            panic!("expected validation error");
        };
        assert!(description.starts_with("route point 1"), "{description}");
    }

    #[test]
    fn length_sums_segments() {
        let route = RouteGeometry::load(
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.5), Coordinate::new(0.0, 1.0)],
            vec![],
        )
        .expect("route should load");
        let direct = Coordinate::new(0.0, 0.0).distance_km(&Coordinate::new(0.0, 1.0));
        assert!((route.length_km() - direct).abs() < 1e-9);
    }

    #[test]
    fn projection_on_segment_is_closer_than_endpoints() {
        let route = RouteGeometry::load(
            vec![Coordinate::new(-36.8485, 174.7633), Coordinate::new(-36.8600, 174.7800)],
            vec![],
        )
        .expect("route should load");

        for query in [
            Coordinate::new(-36.8500, 174.7700),
            Coordinate::new(-36.8590, 174.7650),
            Coordinate::new(-36.8400, 174.7600),
            Coordinate::new(-36.8700, 174.7900),
        ] {
            let projection = route.project(query);
            let to_start = query.distance_km(&route.points()[0]);
            let to_end = query.distance_km(&route.points()[1]);
            assert!(projection.distance_to_route_km <= to_start + 1e-9);
            assert!(projection.distance_to_route_km <= to_end + 1e-9);
        }
    }

    #[test]
    fn projection_midpoint() {
        let route = equator_route();
        let projection = route.project(Coordinate::new(0.01, 0.5));

        assert_eq!(projection.segment_index, 0);
        assert!((projection.matched.longitude - 0.5).abs() < 1e-9);
        assert!((projection.cumulative_distance_km - route.length_km() / 2.0).abs() < 1e-6);
    }

    #[test]
    fn projection_picks_nearest_segment() {
        // L-shaped route: east along the equator, then north
        let route = RouteGeometry::load(
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.1), Coordinate::new(0.1, 0.1)],
            vec![],
        )
        .expect("route should load");

        let projection = route.project(Coordinate::new(0.05, 0.11));
        assert_eq!(projection.segment_index, 1);
        let first_leg = route.points()[0].distance_km(&route.points()[1]);
        assert!(projection.cumulative_distance_km > first_leg);
    }

    #[test]
    fn tie_prefers_earlier_segment() {
        // out and back: both segments are equidistant from any query
        let route = RouteGeometry::load(
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.1), Coordinate::new(0.0, 0.0)],
            vec![],
        )
        .expect("route should load");

        let projection = route.project(Coordinate::new(0.001, 0.05));
        assert_eq!(projection.segment_index, 0);
        assert!(projection.cumulative_distance_km < route.length_km() / 2.0);
    }

    #[test]
    fn projection_across_antimeridian() {
        let route = RouteGeometry::load(
            vec![Coordinate::new(-17.0, 179.9), Coordinate::new(-17.0, -179.9)],
            vec![],
        )
        .expect("route should load");
        assert!((route.length_km() - 21.27).abs() < 0.01, "{}", route.length_km());

        let projection = route.project(Coordinate::new(-17.0, 179.95));
        assert!(projection.distance_to_route_km < 1e-6, "{projection:?}");
        assert!((projection.cumulative_distance_km - route.length_km() / 4.0).abs() < 1e-6);

        let projection = route.project(Coordinate::new(-17.0, -179.95));
        assert!(projection.distance_to_route_km < 1e-6, "{projection:?}");
        assert!((projection.cumulative_distance_km - route.length_km() * 0.75).abs() < 1e-6);
    }

    #[test]
    fn stop_lookup() {
        let route = equator_route();
        assert_eq!(route.stop("A").map(|s| s.name.as_str()), Some("Midway"));
        assert!(route.stop("B").is_none());
    }
}
