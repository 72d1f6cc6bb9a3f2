//! HTTP boundary for the music request service.

pub mod api;
pub mod metrics;
pub mod state;
