//! # Provider
//!
//! Provider defines the external collaborators the tracking engine relies on.

use std::collections::HashMap;

use anyhow::Result;

/// Message represents a message to be published.
#[derive(Clone, Debug)]
pub struct Message {
    pub payload: Vec<u8>,
    pub headers: HashMap<String, String>,
}

impl Message {
    #[must_use]
    pub fn new(payload: &[u8]) -> Self {
        Self { payload: payload.to_vec(), headers: HashMap::new() }
    }

    /// Attach a header (e.g. the partition key) to the message.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// The `Publisher` trait defines the message publishing behavior used to
/// broadcast updates to observers.
pub trait Publisher: Send + Sync {
    /// Publish a message to the given topic.
    fn send(&self, topic: &str, message: &Message) -> impl Future<Output = Result<()>> + Send;
}

/// The `StateStore` trait defines the behavior storing and retrieving durable
/// tracking state.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    fn set(
        &self, key: &str, value: &[u8], ttl_secs: Option<u64>,
    ) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}
