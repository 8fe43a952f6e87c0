use crate::config::settings::AppConfig;
use crate::modules::auth::repository::AccountRepository;
use crate::workers::dispatcher::JobScheduler;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: Arc<AccountRepository>,
    pub scheduler: Arc<dyn JobScheduler>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        accounts: AccountRepository,
        scheduler: Arc<dyn JobScheduler>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            accounts: Arc::new(accounts),
            scheduler,
        }
    }
}
