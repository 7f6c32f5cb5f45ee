use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, ShelfError};
use crate::config::Config;
use crate::extractor::{AiExtractor, GeminiClient};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::library::LocalLibrary;
use crate::registry::ProductRegistry;
use crate::resolver::Resolver;
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub resolver: Arc<Resolver<SqliteStore>>,
}

impl AppContext {
    pub fn new(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(config, store)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_store(config, store)
    }

    fn with_store(config: Config, store: Arc<SqliteStore>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(&config.marketplace)?);
        let extractor = AiExtractor::new(Arc::new(GeminiClient::new(&config.gemini)?), &config.gemini);

        let resolver = Arc::new(Resolver::new(
            ProductRegistry::new(store.clone()),
            fetcher,
            extractor,
            Arc::new(LocalLibrary),
            config.marketplace.clone(),
            config.gemini.resolve_api_key(),
        ));

        Ok(Self {
            config,
            store,
            resolver,
        })
    }

    pub fn registry(&self) -> &ProductRegistry<SqliteStore> {
        self.resolver.registry()
    }

    pub fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| ShelfError::Config("Could not find data directory".into()))?;
        let shelf_dir = data_dir.join("assetshelf");
        std::fs::create_dir_all(&shelf_dir)?;
        Ok(shelf_dir.join("assetshelf.db"))
    }
}
