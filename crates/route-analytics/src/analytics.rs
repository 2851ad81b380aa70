//! Speed, progress, next stop and ETA derived from a vehicle's recent history.

use realtime::{Result, computation};
use serde::{Deserialize, Serialize};

use crate::geo::Position;
use crate::history::PositionHistory;
use crate::route::{RouteGeometry, Stop};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Tunable thresholds for the analytics computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsConfig {
    /// Stops at or within this distance are treated as the current stop and
    /// never reported as "next".
    #[serde(default = "AnalyticsConfig::default_stop_exclusion_km")]
    pub stop_exclusion_km: f64,

    /// ETA is only reported above this speed.
    #[serde(default = "AnalyticsConfig::default_stationary_speed_kmh")]
    pub stationary_speed_kmh: f64,
}

impl AnalyticsConfig {
    const fn default_stop_exclusion_km() -> f64 {
        0.05
    }

    const fn default_stationary_speed_kmh() -> f64 {
        1.0
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            stop_exclusion_km: Self::default_stop_exclusion_km(),
            stationary_speed_kmh: Self::default_stationary_speed_kmh(),
        }
    }
}

/// The stop a vehicle is heading for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStop {
    pub stop: Stop,
    /// Great-circle distance from the current position.
    pub distance_km: f64,
}

/// Derived metrics for one vehicle, recomputed on every ping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub speed_kmh: f64,
    pub distance_traveled_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_stop: Option<NextStop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_minutes: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    #[must_use]
    pub const fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Thresholds this engine was built with.
    #[must_use]
    pub const fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Compute the snapshot for `history` against `route`.
    ///
    /// # Errors
    ///
    /// Returns a computation error if the result is not finite, which only
    /// happens with malformed route data.
    pub fn compute(
        &self, history: &PositionHistory, route: &RouteGeometry,
    ) -> Result<AnalyticsSnapshot> {
        let Some((previous, current)) = history.latest_pair() else {
            let distance_traveled_km = history
                .latest()
                .map_or(0.0, |p| route.project(p.coordinate()).cumulative_distance_km);
            return Ok(AnalyticsSnapshot { distance_traveled_km, ..AnalyticsSnapshot::default() });
        };

        let speed_kmh = speed_kmh(previous, current);
        let distance_traveled_km = route.project(current.coordinate()).cumulative_distance_km;
        let next_stop = self.next_stop(current, route.stops());

        let eta_minutes = next_stop
            .as_ref()
            .filter(|_| speed_kmh > self.config.stationary_speed_kmh)
            .map(|next| next.distance_km / speed_kmh * 60.0);

        if !speed_kmh.is_finite()
            || !distance_traveled_km.is_finite()
            || eta_minutes.is_some_and(|eta| !eta.is_finite())
        {
            return Err(computation!(
                "non-finite analytics: speed {speed_kmh}, distance {distance_traveled_km}"
            ));
        }

        Ok(AnalyticsSnapshot { speed_kmh, distance_traveled_km, next_stop, eta_minutes })
    }

    // Closest stop strictly outside the exclusion radius; the first in
    // configured order wins a tie.
    fn next_stop(&self, current: &Position, stops: &[Stop]) -> Option<NextStop> {
        let here = current.coordinate();
        let mut best: Option<NextStop> = None;

        for stop in stops {
            let distance_km = here.distance_km(&stop.coordinate);
            if distance_km <= self.config.stop_exclusion_km {
                continue;
            }
            if best.as_ref().is_some_and(|b| distance_km >= b.distance_km) {
                continue;
            }
            best = Some(NextStop { stop: stop.clone(), distance_km });
        }

        best
    }
}

/// Instantaneous speed between two positions in km/h.
///
/// Returns 0 when the elapsed time is zero or negative (clock skew or
/// duplicate pings).
#[must_use]
pub fn speed_kmh(previous: &Position, current: &Position) -> f64 {
    let elapsed = current.timestamp - previous.timestamp;
    #[allow(clippy::cast_precision_loss)]
    let elapsed_hours = elapsed.num_milliseconds() as f64 / MILLIS_PER_HOUR;
    if elapsed_hours <= 0.0 {
        return 0.0;
    }
    (previous.distance_km(current) / elapsed_hours).max(0.0)
}
