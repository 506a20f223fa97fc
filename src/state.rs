use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{BookingService, CatalogService, SlotService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub catalog: CatalogService,

    pub slots: SlotService,

    pub bookings: BookingService,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let catalog = CatalogService::new(store.clone());
        let slots = SlotService::new(store.clone());
        let bookings = BookingService::new(store.clone());

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            catalog,
            slots,
            bookings,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
