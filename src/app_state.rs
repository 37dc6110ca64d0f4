use crate::config::Config;
use crate::error::AppResult;
use crate::service::{MutationService, PageService};
use crate::storage::connect_store;

#[derive(Clone)]
pub struct AppState {
    pub pages: PageService,
    pub mutations: MutationService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let store = connect_store(&config.store).await?;

        let pages = PageService::new(store.clone());
        let mutations = MutationService::new(store, config.pages.max_body_len);

        Ok(Self {
            pages,
            mutations,
            config,
        })
    }
}
