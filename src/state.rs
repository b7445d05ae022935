use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::Config;
use crate::db::DbPool;
use crate::model::Classifier;

/// Shared state handed to every handler via `State<AppState>`.
///
/// Cheap to clone; everything heavy sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub classifier: Arc<dyn Classifier>,
    /// Open WebSocket connections.
    pub ws_clients: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            classifier,
            ws_clients: Arc::new(AtomicUsize::new(0)),
        }
    }
}
