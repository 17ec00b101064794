//! HTTP API for hosted interview sessions

mod handlers;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::llm::ModelRegistry;
use crate::runtime::ProductionSessions;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<ProductionSessions>,
    pub llm_registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(sessions: ProductionSessions, llm_registry: Arc<ModelRegistry>) -> Self {
        Self {
            sessions: Arc::new(sessions),
            llm_registry,
        }
    }
}
