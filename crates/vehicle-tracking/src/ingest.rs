//! # Ingest
//!
//! Accepts position pings, keeps per-vehicle tracking state current and
//! derives live analytics against the configured route.

use std::sync::Arc;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use realtime::{Message, Publisher, Result, StateStore, not_found, validation};
use route_analytics::{
    AnalyticsEngine, AnalyticsSnapshot, Position, PositionHistory, RouteGeometry,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::key_locker::KeyLocker;
use crate::provider::Provider;
use crate::store::{TrackingRecord, TrackingStateStore};

/// A raw position report from a vehicle.
///
/// Coordinates are optional so a report with missing fields can be rejected
/// with a validation error instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ping {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Ping {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self { latitude: Some(latitude), longitude: Some(longitude), timestamp }
    }

    /// Convert to a validated position.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a coordinate is missing, non-finite or
    /// out of range.
    pub fn position(&self) -> Result<Position> {
        let Some(latitude) = self.latitude else {
            return Err(validation!("ping is missing latitude"));
        };
        let Some(longitude) = self.longitude else {
            return Err(validation!("ping is missing longitude"));
        };
        Position::new(latitude, longitude, self.timestamp)
    }
}

/// Published to observers after every accepted ping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    pub id: String,
    pub vehicle_id: String,
    pub timestamp: DateTime<Utc>,
    pub snapshot: AnalyticsSnapshot,
}

impl VehicleUpdate {
    #[must_use]
    pub fn new(vehicle_id: &str, timestamp: DateTime<Utc>, snapshot: AnalyticsSnapshot) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vehicle_id: vehicle_id.to_string(),
            timestamp,
            snapshot,
        }
    }
}

/// Entry point for position reports and tracking lifecycle changes.
///
/// Operations on the same vehicle are serialized; different vehicles proceed
/// in parallel.
pub struct IngestService<P: Provider> {
    provider: P,
    route: Arc<RouteGeometry>,
    engine: AnalyticsEngine,
    config: Config,
    store: TrackingStateStore,
    locker: KeyLocker,
}

impl<P: Provider> IngestService<P> {
    pub fn new(provider: P, route: impl Into<Arc<RouteGeometry>>, config: Config) -> Self {
        Self {
            provider,
            route: route.into(),
            engine: AnalyticsEngine::new(config.analytics),
            store: TrackingStateStore::new(config.history_capacity),
            locker: KeyLocker::new(),
            config,
        }
    }

    /// Accept a ping for `vehicle_id` and return the refreshed analytics.
    ///
    /// Nothing is changed unless the analytics computed and the record was
    /// persisted. Publishing the resulting [`VehicleUpdate`] is best effort.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank vehicle id or a bad coordinate,
    /// a computation error when analytics cannot be derived, and an internal
    /// error when the state store fails.
    pub async fn report(&self, vehicle_id: &str, ping: &Ping) -> Result<AnalyticsSnapshot> {
        check_vehicle_id(vehicle_id)?;
        let position = ping.position()?;

        let _guard = self.locker.lock(vehicle_id).await;
        self.hydrate(vehicle_id).await?;

        let mut history = self
            .store
            .history(vehicle_id)
            .unwrap_or_else(|| PositionHistory::new(self.store.history_capacity()));
        history.push(position);
        let snapshot = self.engine.compute(&history, &self.route)?;

        let record = TrackingRecord::reported(vehicle_id, position, ping.timestamp);
        self.persist(&record).await?;
        self.store.upsert(vehicle_id, position, ping.timestamp);

        tracing::debug!(
            vehicle_id = %vehicle_id,
            speed_kmh = snapshot.speed_kmh,
            distance_traveled_km = snapshot.distance_traveled_km,
            next_stop = snapshot.next_stop.as_ref().map(|next| next.stop.id.as_str()),
            "position accepted"
        );

        self.publish(vehicle_id, ping.timestamp, &snapshot).await;
        Ok(snapshot)
    }

    /// Stop tracking `vehicle_id`. Stopping an inactive vehicle is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a not found error for an unknown vehicle and an internal error
    /// when the state store fails.
    pub async fn stop(&self, vehicle_id: &str) -> Result<TrackingRecord> {
        check_vehicle_id(vehicle_id)?;

        let _guard = self.locker.lock(vehicle_id).await;
        self.hydrate(vehicle_id).await?;

        let Some(mut record) = self.store.get(vehicle_id) else {
            return Err(not_found!("vehicle {vehicle_id} not found"));
        };
        if !record.is_active {
            tracing::debug!(vehicle_id = %vehicle_id, "vehicle already inactive");
            return Ok(record);
        }

        record.is_active = false;
        self.persist(&record).await?;
        let record = self.store.deactivate(vehicle_id)?;

        tracing::info!(vehicle_id = %vehicle_id, "tracking stopped");
        Ok(record)
    }

    /// Current tracking record for `vehicle_id`.
    ///
    /// # Errors
    ///
    /// Returns a not found error for an unknown vehicle.
    pub async fn lookup(&self, vehicle_id: &str) -> Result<TrackingRecord> {
        check_vehicle_id(vehicle_id)?;

        let _guard = self.locker.lock(vehicle_id).await;
        self.hydrate(vehicle_id).await?;

        self.store.get(vehicle_id).ok_or_else(|| not_found!("vehicle {vehicle_id} not found"))
    }

    /// Vehicles currently active on the route, ordered by id.
    pub fn active_vehicles(&self) -> Vec<TrackingRecord> {
        self.store.active()
    }

    /// Rolling position history held in memory for `vehicle_id`.
    pub fn history(&self, vehicle_id: &str) -> Option<PositionHistory> {
        self.store.history(vehicle_id)
    }

    /// Route every vehicle is matched against.
    pub fn route(&self) -> &RouteGeometry {
        &self.route
    }

    /// Runtime configuration the service was built with.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    // Load persisted state for a vehicle not yet tracked in memory.
    async fn hydrate(&self, vehicle_id: &str) -> Result<()> {
        if self.store.contains(vehicle_id) {
            return Ok(());
        }

        let key = self.config.vehicle_key(vehicle_id);
        let Some(bytes) =
            self.provider.get(&key).await.context("failed to read tracking state")?
        else {
            return Ok(());
        };

        let record: TrackingRecord = serde_json::from_slice(&bytes)?;
        if record.vehicle_id != vehicle_id {
            return Err(anyhow::anyhow!(
                "tracking state under {key} belongs to vehicle {}",
                record.vehicle_id
            )
            .into());
        }

        tracing::debug!(
            vehicle_id = %vehicle_id,
            active = record.is_active,
            "tracking state restored"
        );
        self.store.restore(record);
        Ok(())
    }

    async fn persist(&self, record: &TrackingRecord) -> Result<()> {
        let key = self.config.vehicle_key(&record.vehicle_id);
        let payload = serde_json::to_vec(record)?;
        self.provider
            .set(&key, &payload, None)
            .await
            .with_context(|| {
                format!("failed to persist tracking state for {}", record.vehicle_id)
            })?;
        Ok(())
    }

    async fn publish(
        &self, vehicle_id: &str, timestamp: DateTime<Utc>, snapshot: &AnalyticsSnapshot,
    ) {
        let update = VehicleUpdate::new(vehicle_id, timestamp, snapshot.clone());
        let payload = match serde_json::to_vec(&update) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(
                    vehicle_id = %vehicle_id,
                    error = %err,
                    "failed to serialize vehicle update"
                );
                return;
            }
        };

        let message = Message::new(&payload).with_header("key", vehicle_id);
        let topic = &self.config.topics.vehicle_update;
        if let Err(err) = self.provider.send(topic, &message).await {
            tracing::warn!(
                vehicle_id = %vehicle_id,
                topic = %topic,
                error = %err,
                "failed to publish vehicle update"
            );
        }
    }
}

fn check_vehicle_id(vehicle_id: &str) -> Result<()> {
    if vehicle_id.trim().is_empty() {
        return Err(validation!("vehicle id is blank"));
    }
    Ok(())
}
