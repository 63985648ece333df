use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::messaging::{ChatNotifier, SmsProvider};
use crate::services::places::PlacesProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub sms: Box<dyn SmsProvider>,
    pub chat: Box<dyn ChatNotifier>,
    pub places: Box<dyn PlacesProvider>,
}

impl AppState {
    /// Locks the store handle. Never hold the guard across an `.await`.
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("document store lock poisoned")))
    }
}
