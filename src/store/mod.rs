pub mod sqlite;

use std::path::Path;

use crate::app::Result;
use crate::domain::{Issue, ProductRecord, ProductUpdate};

pub use sqlite::SqliteStore;

/// Exact-path persistence of products and their tags.
///
/// Paths are taken as given; normalisation and the no-nesting rule live in
/// [`ProductRegistry`](crate::registry::ProductRegistry).
pub trait Store {
    fn get_product(&self, path: &Path) -> Result<Option<ProductRecord>>;
    fn get_all_products(&self) -> Result<Vec<ProductRecord>>;

    /// Insert-or-ignore; returns whether a new row was created.
    fn insert_product(&self, path: &Path, name: &str) -> Result<bool>;

    /// Overwrites URL, image and shop, and replaces the tag set.
    ///
    /// Tags that fail to attach are skipped and reported.
    fn update_product(&self, path: &Path, update: &ProductUpdate) -> Result<Vec<Issue>>;

    fn get_all_tags(&self) -> Result<Vec<String>>;
}
