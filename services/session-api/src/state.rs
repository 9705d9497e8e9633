//! Application state

use std::sync::Arc;

use warden_auth_core::SessionService;
use warden_store::MemoryKvStore;

use crate::config::Config;
use crate::directory::HttpUserDirectory;

/// Type alias for the session service with concrete capability types
pub type SessionServiceImpl = SessionService<MemoryKvStore, HttpUserDirectory>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Session lifecycle service
    pub service: Arc<SessionServiceImpl>,
    /// Application configuration (reserved for future handlers)
    #[allow(dead_code)]
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(service: SessionServiceImpl, config: Config) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }
}
