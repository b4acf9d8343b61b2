//! Tool link: supervised connections to external tool servers.
//!
//! This crate keeps a best-effort connection to a tool-serving endpoint
//! alive for one target at a time. It connects with a bounded timeout,
//! retries with capped exponential backoff, probes liveness periodically,
//! and reconnects automatically when the connection drops.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Connection status, metrics, backoff, and configuration
//! - **Ports**: Tool server, notifier, and preference store contracts
//! - **Adapters**: In-memory, file-backed, and `tracing` implementations
//! - **Services**: The connection supervisor and its session owner
//!
//! # Modules
//!
//! - [`connection`]: Supervised tool-server connections

pub mod connection;
