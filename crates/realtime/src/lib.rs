//! # Realtime Core
//!
//! Error taxonomy and collaborator interfaces shared by the tracking crates.

mod error;
mod provider;

pub use crate::error::*;
pub use crate::provider::*;
