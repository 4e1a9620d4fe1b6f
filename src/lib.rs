//! OCC gateway library
//!
//! A read-through caching proxy for traffic, incident, and transit disruption
//! feeds. Exposed as a library so the router and cache can be driven from
//! integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod feeds;
pub mod server;
pub mod telemetry;
pub mod upstream;
