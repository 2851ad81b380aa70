//! # Tracking state
//!
//! Authoritative in-memory state for every vehicle that has reported at least
//! once: the tracking record and its rolling position history.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use realtime::{Result, not_found};
use route_analytics::{Position, PositionHistory};
use serde::{Deserialize, Serialize};

/// Current tracking state for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRecord {
    pub vehicle_id: String,
    #[serde(default)]
    pub current_position: Option<Position>,
    pub is_active: bool,
    #[serde(default)]
    pub last_ping_at: Option<DateTime<Utc>>,
}

impl TrackingRecord {
    /// The record as it would look after accepting `position`.
    #[must_use]
    pub fn reported(vehicle_id: &str, position: Position, timestamp: DateTime<Utc>) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            current_position: Some(position),
            is_active: true,
            last_ping_at: Some(timestamp),
        }
    }
}

#[derive(Debug, Clone)]
struct VehicleState {
    record: TrackingRecord,
    history: PositionHistory,
}

/// Concurrent map of vehicle id to tracking state.
#[derive(Debug)]
pub struct TrackingStateStore {
    vehicles: DashMap<String, VehicleState>,
    history_capacity: usize,
}

impl TrackingStateStore {
    #[must_use]
    pub fn new(history_capacity: usize) -> Self {
        Self { vehicles: DashMap::new(), history_capacity }
    }

    /// Record a position for `vehicle_id`, creating the vehicle if needed.
    ///
    /// The record update and the history append happen under the same entry
    /// lock.
    pub fn upsert(
        &self, vehicle_id: &str, position: Position, timestamp: DateTime<Utc>,
    ) -> TrackingRecord {
        let mut entry = self.vehicles.entry(vehicle_id.to_string()).or_insert_with(|| {
            VehicleState {
                record: TrackingRecord::reported(vehicle_id, position, timestamp),
                history: PositionHistory::new(self.history_capacity),
            }
        });

        let state = entry.value_mut();
        state.record.current_position = Some(position);
        state.record.last_ping_at = Some(timestamp);
        state.record.is_active = true;
        state.history.push(position);

        state.record.clone()
    }

    /// Mark a vehicle inactive. Position and history are kept.
    ///
    /// # Errors
    ///
    /// Returns a not found error when the vehicle has never been seen.
    pub fn deactivate(&self, vehicle_id: &str) -> Result<TrackingRecord> {
        let Some(mut state) = self.vehicles.get_mut(vehicle_id) else {
            return Err(not_found!("vehicle {vehicle_id} not found"));
        };
        state.record.is_active = false;
        Ok(state.record.clone())
    }

    #[must_use]
    pub fn get(&self, vehicle_id: &str) -> Option<TrackingRecord> {
        self.vehicles.get(vehicle_id).map(|state| state.record.clone())
    }

    #[must_use]
    pub fn history(&self, vehicle_id: &str) -> Option<PositionHistory> {
        self.vehicles.get(vehicle_id).map(|state| state.history.clone())
    }

    #[must_use]
    pub fn contains(&self, vehicle_id: &str) -> bool {
        self.vehicles.contains_key(vehicle_id)
    }

    /// Seed a vehicle from persisted state. History starts empty.
    ///
    /// Has no effect when the vehicle is already tracked in memory.
    pub fn restore(&self, record: TrackingRecord) {
        let capacity = self.history_capacity;
        self.vehicles
            .entry(record.vehicle_id.clone())
            .or_insert_with(|| VehicleState { record, history: PositionHistory::new(capacity) });
    }

    /// Every active vehicle, ordered by id.
    #[must_use]
    pub fn active(&self) -> Vec<TrackingRecord> {
        let mut records: Vec<TrackingRecord> = self
            .vehicles
            .iter()
            .filter(|state| state.record.is_active)
            .map(|state| state.record.clone())
            .collect();
        records.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    #[must_use]
    pub const fn history_capacity(&self) -> usize {
        self.history_capacity
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use realtime::Error;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn position(longitude: f64, secs: i64) -> Position {
        Position::new(-36.85, longitude, at(secs)).unwrap()
    }

    #[test]
    fn upsert_creates_then_updates() {
        let store = TrackingStateStore::new(10);

        let created = store.upsert("V1", position(174.70, 0), at(0));
        assert!(created.is_active);
        assert_eq!(created.current_position, Some(position(174.70, 0)));

        let updated = store.upsert("V1", position(174.71, 5), at(5));
        assert_eq!(updated.last_ping_at, Some(at(5)));
        assert_eq!(store.history("V1").map(|h| h.len()), Some(2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn deactivate_keeps_position_and_history() {
        let store = TrackingStateStore::new(10);
        store.upsert("V1", position(174.70, 0), at(0));

        let record = store.deactivate("V1").expect("should deactivate");
        assert!(!record.is_active);
        assert_eq!(record.current_position, Some(position(174.70, 0)));
        assert_eq!(store.history("V1").map(|h| h.len()), Some(1));
    }

    #[test]
    fn deactivate_unknown_vehicle() {
        let store = TrackingStateStore::new(10);
        let err = store.deactivate("ghost").unwrap_err();
        assert_eq!(err, Error::NotFound("vehicle ghost not found".to_string()));
    }

    #[test]
    fn history_is_bounded() {
        let store = TrackingStateStore::new(3);
        for i in 0..6 {
            #[allow(clippy::cast_precision_loss)]
            let longitude = (i as f64).mul_add(0.001, 174.70);
            store.upsert("V1", position(longitude, i), at(i));
        }
        let history = store.history("V1").expect("history");
        assert_eq!(history.len(), 3);
        assert_eq!(history.latest().map(|p| p.timestamp), Some(at(5)));
    }

    #[test]
    fn restore_does_not_overwrite() {
        let store = TrackingStateStore::new(10);
        store.upsert("V1", position(174.70, 0), at(0));

        let mut stale = TrackingRecord::reported("V1", position(170.0, 0), at(0));
        stale.is_active = false;
        store.restore(stale);

        let record = store.get("V1").expect("record");
        assert!(record.is_active);
        assert_eq!(record.current_position, Some(position(174.70, 0)));
    }

    #[test]
    fn restore_starts_with_empty_history() {
        let store = TrackingStateStore::new(10);
        store.restore(TrackingRecord::reported("V9", position(174.70, 0), at(0)));

        assert!(store.contains("V9"));
        assert_eq!(store.history("V9").map(|h| h.is_empty()), Some(true));
    }

    #[test]
    fn active_is_sorted_and_filtered() {
        let store = TrackingStateStore::new(10);
        store.upsert("V3", position(174.70, 0), at(0));
        store.upsert("V1", position(174.70, 0), at(0));
        store.upsert("V2", position(174.70, 0), at(0));
        store.deactivate("V2").expect("should deactivate");

        let ids: Vec<_> = store.active().into_iter().map(|r| r.vehicle_id).collect();
        assert_eq!(ids, vec!["V1".to_string(), "V3".to_string()]);
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = TrackingRecord::reported("V1", position(174.70, 0), at(0));
        let json = serde_json::to_value(&record).expect("should serialize");

        assert_eq!(json["vehicleId"], "V1");
        assert_eq!(json["isActive"], true);
        assert!(json["currentPosition"]["latitude"].is_number());
        assert!(json.get("lastPingAt").is_some());

        let back: TrackingRecord = serde_json::from_value(json).expect("should deserialize");
        assert_eq!(back, record);
    }
}
