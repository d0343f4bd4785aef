use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use skyvestments_market_data::{
    CatalogSnapshot, CoflnetConfig, EngineConfig, PriceCacheStore, PriceResolutionEngine,
    SharedCatalog,
};
use skyvestments_storage_json::{
    CatalogStore, DataPaths, EntryStore, PersistentPriceCache, CATALOG_TTL,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog_sync::reload_catalog;
use crate::config::{Config, LogFormat};

pub struct AppState {
    pub engine: Arc<PriceResolutionEngine>,
    /// The engine's cache, kept concrete so shutdown can flush it.
    pub prices: Arc<PersistentPriceCache>,
    pub catalog: Arc<SharedCatalog>,
    pub catalog_store: CatalogStore,
    pub entries: EntryStore,
    pub catalog_dir: PathBuf,
}

impl AppState {
    /// Assembles state around an already-built engine. `catalog` must be the
    /// catalog the engine resolves against, so reloads reach it.
    pub fn new(
        engine: Arc<PriceResolutionEngine>,
        prices: Arc<PersistentPriceCache>,
        catalog: Arc<SharedCatalog>,
        paths: &DataPaths,
        catalog_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            prices,
            catalog,
            catalog_store: CatalogStore::new(&paths.items),
            entries: EntryStore::new(&paths.entries),
            catalog_dir: catalog_dir.into(),
        }
    }
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

/// Restores the catalog saved in `items.json` when it is younger than a day.
fn cached_catalog(store: &CatalogStore) -> Option<CatalogSnapshot> {
    let file = store.load_or_default();
    if file.item_map.is_empty() || file.is_stale(CATALOG_TTL, Utc::now()) {
        return None;
    }
    Some(file.into_snapshot())
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    std::fs::create_dir_all(&config.data_dir)?;
    let paths = DataPaths::new(&config.data_dir);

    let catalog_store = CatalogStore::new(&paths.items);
    let restored = cached_catalog(&catalog_store);
    let needs_reload = restored.is_none();
    let catalog = Arc::new(SharedCatalog::new(restored.unwrap_or_default()));

    let prices = PersistentPriceCache::shared(&paths.prices);
    info!("Loaded {} cached prices from {}", prices.len(), paths.prices.display());

    let engine = PriceResolutionEngine::with_coflnet(
        catalog.clone(),
        prices.clone(),
        CoflnetConfig {
            base_url: config.coflnet_url.clone(),
            ..CoflnetConfig::default()
        },
        EngineConfig::default(),
    );

    let state = Arc::new(AppState::new(
        Arc::new(engine),
        prices,
        catalog,
        &paths,
        &config.catalog_dir,
    ));

    if needs_reload {
        let refresh = reload_catalog(&state).await;
        if refresh.cached {
            warn!(
                "Item catalog unavailable from {}; prices resolve only for cached items",
                config.catalog_dir.display()
            );
        }
    } else {
        info!("Restored {} catalog items from cache", state.catalog.snapshot().len());
    }

    Ok(state)
}
