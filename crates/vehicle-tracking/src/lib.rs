//! # Vehicle Tracking
//!
//! Location ingestion for vehicles running a fixed route: validates pings,
//! maintains per-vehicle tracking state and rolling history, and publishes
//! live analytics.

mod config;
mod ingest;
mod key_locker;
mod store;

pub mod provider;

pub use self::config::{Config, Keys, Topics};
pub use self::ingest::{IngestService, Ping, VehicleUpdate};
pub use self::key_locker::{KeyLockGuard, KeyLocker};
pub use self::provider::Provider;
pub use self::store::{TrackingRecord, TrackingStateStore};
