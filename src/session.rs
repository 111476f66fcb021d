//! Shared session context of the console.
//!
//! Holds the active cluster, schema and connection. Login and logout are
//! the only writers; everything else takes a read lock and clones what it
//! needs out.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::db::SqlExecutor;

/// The mutable part of a console session.
#[derive(Clone, Default)]
pub struct SessionState {
    /// Active cluster name; empty when logged out.
    pub cluster: String,
    /// Active schema name; empty until `USE` or a configured default.
    pub schema: String,
    /// Established lazily on first SQL dispatch after login.
    pub connection: Option<Arc<dyn SqlExecutor>>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("cluster", &self.cluster)
            .field("schema", &self.schema)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

/// Session context shared between the loop and command handlers.
#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    /// Creates a logged-out session.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }

    /// Returns the active cluster name, empty when logged out.
    pub fn cluster(&self) -> String {
        self.read().cluster.clone()
    }

    /// Returns the active schema name.
    pub fn schema(&self) -> String {
        self.read().schema.clone()
    }

    /// Returns the active connection handle, if established.
    pub fn connection(&self) -> Option<Arc<dyn SqlExecutor>> {
        self.read().connection.clone()
    }

    /// Switches to `cluster`, dropping the previous schema and connection.
    pub fn login(&self, cluster: impl Into<String>) {
        let mut state = self.write();
        state.cluster = cluster.into();
        state.schema.clear();
        state.connection = None;
    }

    /// Clears the active cluster, schema and connection.
    pub fn logout(&self) {
        *self.write() = SessionState::default();
    }

    /// Records the schema selected with `USE`.
    pub fn set_schema(&self, schema: impl Into<String>) {
        self.write().schema = schema.into();
    }

    /// Stores the connection for the active cluster.
    ///
    /// Ignored if the active cluster changed since `cluster` was read.
    pub fn set_connection(&self, cluster: &str, connection: Arc<dyn SqlExecutor>) {
        let mut state = self.write();
        if state.cluster == cluster {
            state.connection = Some(connection);
        }
    }
}
