//! Shared infrastructure for bitmarket-node services: configuration, logging,
//! metrics, the standard HTTP middleware stack, and token auth.

pub mod auth;
pub mod config;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod rate_limit;
pub mod server;
