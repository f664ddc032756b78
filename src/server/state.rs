//! Shared request state

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::hub::HubClient;
use crate::storage::FileOperations;

/// Read-only state handed to every handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub files: Arc<FileOperations>,
    pub hub: Arc<HubClient>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let files =
            FileOperations::from_config(&config.files).map_err(ServerError::BaseDirectory)?;
        let hub = HubClient::from_config(&config.hub)?;
        Ok(Self {
            files: Arc::new(files),
            hub: Arc::new(hub),
        })
    }
}
