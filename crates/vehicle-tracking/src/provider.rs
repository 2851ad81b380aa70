//! # Provider
//!
//! Provider defines the external collaborators the ingest service needs.

use realtime::{Publisher, StateStore};

/// Provider entry point implemented by the host application: durable state
/// for tracking records and a publisher for vehicle updates.
pub trait Provider: StateStore + Publisher {}
