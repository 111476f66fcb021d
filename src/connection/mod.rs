//! Connection management for clusterdba.
//!
//! Resolves named clusters to live connections.

pub mod registry;

pub use registry::{ClusterSummary, ConnectionRegistry};
