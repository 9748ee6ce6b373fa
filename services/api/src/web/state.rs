//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use scrollnet_core::ports::{AuthProvider, PersistenceBackend, TelemetrySink};
use scrollnet_core::session::SessionDeps;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn PersistenceBackend>,
    pub telemetry: Arc<dyn TelemetrySink>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Collaborators for a session hosted on behalf of one connection.
    pub fn session_deps(&self, auth: Arc<dyn AuthProvider>) -> SessionDeps {
        SessionDeps {
            backend: self.backend.clone(),
            auth,
            telemetry: self.telemetry.clone(),
        }
    }
}
