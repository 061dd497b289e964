use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::mailer::Mailer;

/// Everything a request needs, shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, config: Arc::new(config), mailer }
    }
}
