//! Schema comparison and migration-script generation core for
//! MySQL-compatible databases, reachable directly or through an SSH tunnel
//! (§1-§2). This crate is the triad of C1-C6 plus the C7 secret store; the
//! HTTP/WebSocket surface, saved-profile/history persistence, and the
//! host-side SSH subprocess helper are external collaborators that embed it.
//!
//! The top-level entry points a caller embeds against are
//! [`Orchestrator::run_comparison`] (C3, produces a [`models::ComparisonResult`])
//! and [`generator::generate_sync_script`] (C4, consumes one and produces a
//! [`models::SyncScript`]).

pub mod compare;
pub mod config;
pub mod connection;
pub mod error;
pub mod generator;
pub mod introspect;
pub mod models;
pub mod orchestrator;
pub mod secrets;
pub mod tunnel;

pub use connection::ConnectionManager;
pub use error::{CoreError, CoreResult};
pub use orchestrator::Orchestrator;
pub use secrets::SecretStore;
pub use tunnel::TunnelManager;
