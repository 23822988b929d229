//! Video analytics trigger.
//!
//! This module provides the transport used to reach the video events
//! endpoint and the trigger that relays its outcome to the host.

pub mod runner;
pub mod transport;

pub use runner::{AnalyticsTrigger, Notifications};
pub use transport::HttpTransport;
