//! healthsync: a resilient client for the health dashboard service.
//!
//! Requests go through a bounded executor that consults a cached
//! reachability probe before touching the network. The dashboard always
//! renders built-in demo data first and upgrades to live data in the
//! background; activity telemetry is fire-and-forget with a small local
//! buffer for failed deliveries.

pub mod activity;
pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod demo;
pub mod model;
pub mod oplog;
pub mod server;
