//! clusterdba - an operator console for distributed MySQL-protocol SQL
//! clusters.
//!
//! This library exposes the console, the kill engine and their building
//! blocks for the binary and for integration tests.

pub mod cli;
pub mod commands;
pub mod config;
pub mod connection;
pub mod console;
pub mod db;
pub mod error;
pub mod kill;
pub mod logging;
pub mod secrets;
pub mod session;
pub mod sql;
