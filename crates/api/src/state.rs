use std::sync::Arc;

use lifesafe_events::Mailer;
use lifesafe_lifecycle::{LifecycleManager, PgClassStore};

use crate::config::ServerConfig;

/// The lifecycle manager as wired in production.
pub type Lifecycle = LifecycleManager<PgClassStore, Mailer>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Sole writer of class requests and confirmed classes.
    pub lifecycle: Arc<Lifecycle>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn pool(&self) -> &lifesafe_db::DbPool {
        self.lifecycle.store().pool()
    }
}
