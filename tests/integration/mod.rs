//! Integration tests for clusterdba.

pub mod cluster_test;
pub mod console_test;
pub mod kill_test;

use std::sync::Arc;

use clusterdba::connection::ConnectionRegistry;
use clusterdba::console::{Console, ScriptedReader};
use clusterdba::db::MockDatabaseClient;

/// Builds a console over a registry holding `mock` as cluster `prod`.
pub fn console_with(
    mock: Arc<MockDatabaseClient>,
    lines: &[&str],
) -> Console<ScriptedReader> {
    let registry = ConnectionRegistry::new(Default::default());
    registry.register("prod", mock);
    Console::new(registry, ScriptedReader::new(lines.iter().copied()))
        .expect("console should start")
}
