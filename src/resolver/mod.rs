//! Resolution orchestration: folder name to persisted marketplace metadata.
//!
//! Every operation runs to completion on the caller's task. The only
//! suspension points are the marketplace fetch and the model call, each
//! bounded by its own timeout; nothing here retries.

pub mod batch;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::app::{Result, ShelfError};
use crate::config::MarketplaceConfig;
use crate::domain::{
    EntryKind, ExtractionResult, Issue, ListedEntry, Listing, ProductRecord, ProductUpdate, Source,
};
use crate::extractor::AiExtractor;
use crate::fetcher::Fetcher;
use crate::library::DirectoryLister;
use crate::miner::{self, patterns};
use crate::normalizer::QueryNormalizer;
use crate::registry::{normalize_path, ProductRegistry};
use crate::store::Store;

/// How [`Resolver::resolve`] extracts metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Search page mining only; no results is an error.
    #[default]
    Miner,
    /// Search page handed straight to the AI extractor.
    Ai,
    /// Mining first, the AI extractor only when mining finds no product.
    MinerThenAi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    Miner,
    Ai,
}

impl fmt::Display for ResolvedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedBy::Miner => write!(f, "miner"),
            ResolvedBy::Ai => write!(f, "ai"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub path: PathBuf,
    pub resolved_by: ResolvedBy,
    pub result: ExtractionResult,
    /// Stored record after the merge.
    pub record: Option<ProductRecord>,
    pub issues: Vec<Issue>,
}

pub struct Resolver<S: Store> {
    registry: ProductRegistry<S>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    extractor: AiExtractor,
    lister: Arc<dyn DirectoryLister + Send + Sync>,
    normalizer: QueryNormalizer,
    marketplace: MarketplaceConfig,
    api_key: Option<String>,
}

impl<S: Store> Resolver<S> {
    pub fn new(
        registry: ProductRegistry<S>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        extractor: AiExtractor,
        lister: Arc<dyn DirectoryLister + Send + Sync>,
        marketplace: MarketplaceConfig,
        api_key: Option<String>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            extractor,
            lister,
            normalizer: QueryNormalizer::new(),
            marketplace,
            api_key,
        }
    }

    pub fn registry(&self) -> &ProductRegistry<S> {
        &self.registry
    }

    /// `<base_url>/<locale>/search/<query>` with the query percent-encoded.
    pub fn search_url(&self, query: &str) -> Result<Url> {
        let mut url = Url::parse(&self.marketplace.base_url)?;
        url.path_segments_mut()
            .map_err(|_| {
                ShelfError::InvalidInput(format!(
                    "marketplace base URL cannot carry a path: {}",
                    self.marketplace.base_url
                ))
            })?
            .pop_if_empty()
            .push(&self.marketplace.locale)
            .push("search")
            .push(query);
        Ok(url)
    }

    /// Lists `dir`, auto-registering every folder not yet known.
    ///
    /// Registration failures (folders inside an existing product, mostly)
    /// are collected as issues; the entry is still listed.
    pub fn list_directory(&self, dir: &Path) -> Result<Listing> {
        let dir = normalize_path(dir)?;
        let mut listing = Listing::default();

        for entry in self.lister.list(&dir)? {
            let path = dir.join(&entry.name);
            let kind = if entry.is_dir {
                EntryKind::Folder
            } else {
                EntryKind::File
            };

            let known = self.registry.get(&path)?;
            if entry.is_dir && known.is_none() {
                match self.registry.register(&path, &entry.name) {
                    Ok(_) => {}
                    Err(e @ ShelfError::Conflict { .. }) => {
                        debug!("Skipping auto-registration: {}", e);
                        listing
                            .issues
                            .push(Issue::new(path.display().to_string(), e.to_string()));
                    }
                    Err(e) => {
                        warn!("Failed to register {}: {}", path.display(), e);
                        listing
                            .issues
                            .push(Issue::new(path.display().to_string(), e.to_string()));
                    }
                }
            }

            let product = match known {
                Some(product) => Some(product),
                None => self.registry.get(&path)?,
            };
            let source = product
                .as_ref()
                .and_then(|p| p.product_url.as_deref())
                .and_then(Source::detect);

            listing.entries.push(ListedEntry {
                name: entry.name,
                path,
                kind,
                source,
                product,
            });
        }

        Ok(listing)
    }

    /// Normalises `folder_name`, fetches the search page and mines it.
    pub async fn search(&self, folder_name: &str) -> Result<ExtractionResult> {
        let html = self.fetch_search_page(folder_name).await?;
        miner::mine_search_results(&html)
    }

    /// Same search page, handed to the AI extractor.
    pub async fn search_with_ai(&self, folder_name: &str) -> Result<ExtractionResult> {
        let api_key = self.require_api_key()?;
        let html = self.fetch_search_page(folder_name).await?;
        self.extractor.extract(&html, api_key).await
    }

    /// Fetches a product page and mines its image and shop name.
    pub async fn inspect_product_page(&self, product_url: &str) -> Result<ExtractionResult> {
        if !patterns::is_item_url(product_url) {
            return Err(ShelfError::InvalidInput(format!(
                "not a product page URL: {}",
                product_url
            )));
        }

        let html = self.fetch_html(product_url).await?;
        miner::mine_product_page(&html, product_url)
    }

    /// Registers `path`, extracts metadata for its folder name and persists
    /// the merge of the result over the stored record.
    ///
    /// Unknown (empty) extracted fields keep their stored values and tags
    /// are left alone. A result with nothing in it is not written.
    pub async fn resolve(&self, path: &Path, strategy: Strategy) -> Result<Resolution> {
        let path = normalize_path(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ShelfError::InvalidInput(format!("no folder name in {}", path.display()))
            })?;

        self.registry.register(&path, &name)?;

        let (result, resolved_by) = match strategy {
            Strategy::Miner => (self.search(&name).await?, ResolvedBy::Miner),
            Strategy::Ai => (self.search_with_ai(&name).await?, ResolvedBy::Ai),
            Strategy::MinerThenAi => {
                let html = self.fetch_search_page(&name).await?;
                match miner::mine_search_results(&html) {
                    Ok(result) => (result, ResolvedBy::Miner),
                    Err(ShelfError::NotFound(reason)) => {
                        info!("Miner found nothing for {} ({}), asking the model", name, reason);
                        let api_key = self.require_api_key()?;
                        (self.extractor.extract(&html, api_key).await?, ResolvedBy::Ai)
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let mut issues = Vec::new();
        if result.is_empty() {
            warn!("No metadata recovered for {}", path.display());
            issues.push(Issue::new(
                path.display().to_string(),
                "no metadata recovered; record left unchanged",
            ));
        } else {
            let stored = self
                .registry
                .get(&path)?
                .ok_or_else(|| ShelfError::NotFound(format!("no product at {}", path.display())))?;
            let update = ProductUpdate::from_record(&stored).merge_extraction(&result);
            issues = self.registry.update(&path, &update)?;
            info!("Resolved {} via {}", path.display(), resolved_by);
        }

        Ok(Resolution {
            record: self.registry.get(&path)?,
            path,
            resolved_by,
            result,
            issues,
        })
    }

    fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ShelfError::Config("Gemini API key not configured".into()))
    }

    async fn fetch_search_page(&self, folder_name: &str) -> Result<String> {
        let query = self.normalizer.search_query(folder_name);
        let url = self.search_url(&query)?;
        debug!("Searching {} for {:?}", url, query);
        self.fetch_html(url.as_str()).await
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.fetcher.fetch(url).await?.into_html(url)
    }
}
