//! Device liveness tracking.
//!
//! Records when each advertising device was last heard from, keyed by the
//! address carried in its frames.

mod tracker;

pub use tracker::DeviceHeartbeatTracker;
