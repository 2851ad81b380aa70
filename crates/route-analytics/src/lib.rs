//! # Route Analytics
//!
//! Projects raw GPS positions onto a fixed route polyline and derives speed,
//! distance traveled, next stop and ETA from a short rolling history.
//!
//! Everything in this crate is pure and in-memory: a computation is bounded by
//! the history window and the route length.

mod analytics;
mod geo;
mod history;
mod route;

pub use self::analytics::*;
pub use self::geo::*;
pub use self::history::*;
pub use self::route::*;
