//! # assetshelf
//!
//! Attaches marketplace metadata (product URL, thumbnail, shop, tags) to
//! downloaded asset folders.
//!
//! ## Architecture
//!
//! ```text
//! folder name → QueryNormalizer → search page → miner ─┬─→ ProductRegistry
//!                                                     └→ AiExtractor ─┘
//! ```
//!
//! - [`normalizer`]: folder name to search phrase
//! - [`miner`]: regex mining of search results and product pages
//! - [`extractor`]: grounded model call plus tiered response recovery
//! - [`registry`]: no-nesting product registry over [`store`]
//! - [`resolver`]: ties the above together, one folder at a time
//!
//! ## Quick Start
//!
//! ```bash
//! # List a library folder, registering its sub-folders
//! assetshelf list ~/Assets
//!
//! # Look up one folder on the marketplace and save the result
//! assetshelf resolve ~/Assets/Karin_v1.2
//!
//! # Let the model try when the search page gives nothing
//! assetshelf config set-api-key <KEY>
//! assetshelf resolve ~/Assets/Karin_v1.2 --ai-fallback
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// fetcher, extractor and resolver.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/assetshelf/config.toml`, supporting:
/// - Default library directory
/// - Marketplace locale, user agent and timeout
/// - Gemini key, model and deadline
pub mod config;

/// Core domain models.
///
/// - [`ProductRecord`](domain::ProductRecord): a registered folder
/// - [`ExtractionResult`](domain::ExtractionResult): transient mined/extracted fields
/// - [`Issue`](domain::Issue): a non-fatal problem collected on the way
pub mod domain;

/// AI-assisted extraction.
///
/// - [`TextGenerator`](extractor::TextGenerator): async trait for the model call
/// - [`GeminiClient`](extractor::GeminiClient): reqwest-based implementation
/// - [`recover`](extractor::recover): three-tier response recovery
pub mod extractor;

/// HTTP page fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait returning status and body
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Directory listing.
pub mod library;

/// HTML pattern mining for the marketplace.
pub mod miner;

/// Folder name to search query.
pub mod normalizer;

/// Product registry enforcing that products never nest.
pub mod registry;

/// Resolution orchestration and batch resolution.
pub mod resolver;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
