use std::sync::Arc;

use crate::application::ports::storage_port::StoragePort;
use crate::bootstrap::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

#[derive(Clone)]
pub struct AppServices {
    storage_port: Arc<dyn StoragePort>,
}

impl AppServices {
    pub fn new(storage_port: Arc<dyn StoragePort>) -> Self {
        Self { storage_port }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn storage_port(&self) -> Arc<dyn StoragePort> {
        self.services.storage_port.clone()
    }
}
