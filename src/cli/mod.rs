pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::resolver::batch::DEFAULT_WORKERS;
use crate::resolver::Strategy;

#[derive(Parser)]
#[command(name = "assetshelf")]
#[command(about = "Marketplace metadata for downloaded asset folders", long_about = None)]
pub struct Cli {
    /// Database file (default: <data dir>/assetshelf/assetshelf.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Number of folders resolved concurrently
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, global = true)]
    pub workers: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List a directory, registering new folders as products
    List {
        /// Directory to list (default: library.home_path)
        dir: Option<PathBuf>,
        /// Print every registration issue instead of a count
        #[arg(short, long)]
        verbose: bool,
    },
    /// Register a folder as a product
    Register {
        path: PathBuf,
        /// Display name (default: folder name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the product at a path, or the product containing it
    Show { path: PathBuf },
    /// Show the nearest registered ancestor of a path
    Parent { path: PathBuf },
    /// Edit a product's metadata by hand
    Update {
        path: PathBuf,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        shop: Option<String>,
        /// Replaces the whole tag set; repeat for several tags
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Remove every tag
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
    },
    /// Search the marketplace for a folder name (nothing is saved)
    Search { name: String },
    /// Mine the main image of a product page
    Image { url: String },
    /// Find and save metadata for one or more folders
    Resolve {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Use the AI extractor instead of the search page miner
        #[arg(long, conflicts_with = "ai_fallback")]
        ai: bool,
        /// Ask the AI extractor when the miner finds nothing
        #[arg(long)]
        ai_fallback: bool,
    },
    /// Open a product's marketplace page in the browser
    Open { path: PathBuf },
    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Save the Gemini API key
    SetApiKey { key: String },
    /// Print the configuration file location
    Path,
}

pub fn strategy(ai: bool, ai_fallback: bool) -> Strategy {
    match (ai, ai_fallback) {
        (true, _) => Strategy::Ai,
        (false, true) => Strategy::MinerThenAi,
        (false, false) => Strategy::Miner,
    }
}
