use std::env;

use route_analytics::{AnalyticsConfig, DEFAULT_HISTORY_CAPACITY};

#[derive(Debug, Clone)]
pub struct Config {
    pub history_capacity: usize,
    pub analytics: AnalyticsConfig,
    pub keys: Keys,
    pub topics: Topics,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = AnalyticsConfig::default();
        let history_capacity = env_usize("HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY);
        let analytics = AnalyticsConfig {
            stop_exclusion_km: env_f64("STOP_EXCLUSION_KM", defaults.stop_exclusion_km),
            stationary_speed_kmh: env_f64("STATIONARY_SPEED_KMH", defaults.stationary_speed_kmh),
        };

        Self { history_capacity, analytics, keys: Keys::from_env(), topics: Topics::from_env() }
    }

    /// State store key holding the persisted record for `vehicle_id`.
    pub fn vehicle_key(&self, vehicle_id: &str) -> String {
        format!("{}:{}", self.keys.vehicle, vehicle_id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[derive(Debug, Clone)]
pub struct Keys {
    pub vehicle: String,
}

impl Keys {
    fn from_env() -> Self {
        Self {
            vehicle: env::var("STATE_KEY_VEHICLE")
                .unwrap_or_else(|_| "tracking:vehicle".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Topics {
    pub vehicle_update: String,
}

impl Topics {
    fn from_env() -> Self {
        Self {
            vehicle_update: env::var("VEHICLE_UPDATE_TOPIC")
                .unwrap_or_else(|_| "realtime-vehicle-analytics.v1".to_string()),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    parse_usize(env::var(key).ok().as_deref(), default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    parse_threshold(env::var(key).ok().as_deref(), default)
}

fn parse_usize(value: Option<&str>, default: usize) -> usize {
    value.and_then(|value| value.trim().parse::<usize>().ok()).unwrap_or(default)
}

// negative or non-finite thresholds fall back to the default
fn parse_threshold(value: Option<&str>, default: f64) -> f64 {
    value
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(default)
}
