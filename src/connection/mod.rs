//! Supervised connection to an external tool server.
//!
//! This module keeps one logical connection to a tool-serving endpoint alive
//! on a best-effort basis: it connects with a bounded lookup timeout, retries
//! with capped exponential backoff, probes liveness on a fixed interval, and
//! reconnects automatically when a probe fails. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
