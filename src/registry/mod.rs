//! Directory-hierarchy product registry.
//!
//! Products never nest: a folder can only be registered when none of its
//! ancestors already is. The check-then-insert in [`ProductRegistry::register`]
//! is not transactional, so two concurrent registrations of overlapping paths
//! may both pass the check.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::app::{Result, ShelfError};
use crate::domain::{Issue, ProductRecord, ProductUpdate};
use crate::store::Store;

pub struct ProductRegistry<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for ProductRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> ProductRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Registers `path` as a product named `name`.
    ///
    /// Returns `true` when a new record was created and `false` when the
    /// path was already registered.
    pub fn register(&self, path: &Path, name: &str) -> Result<bool> {
        let path = normalize_path(path)?;

        if let Some(parent) = self.nearest_ancestor(&path)? {
            return Err(ShelfError::Conflict {
                path,
                parent: parent.path,
            });
        }

        let created = self.store.insert_product(&path, name)?;
        if created {
            debug!("Registered product {} at {}", name, path.display());
        }
        Ok(created)
    }

    pub fn update(&self, path: &Path, update: &ProductUpdate) -> Result<Vec<Issue>> {
        self.store.update_product(&normalize_path(path)?, update)
    }

    pub fn get(&self, path: &Path) -> Result<Option<ProductRecord>> {
        self.store.get_product(&normalize_path(path)?)
    }

    /// Closest registered strict ancestor of `path`, if any.
    pub fn nearest_ancestor(&self, path: &Path) -> Result<Option<ProductRecord>> {
        let path = normalize_path(path)?;

        for ancestor in path.ancestors().skip(1) {
            if let Some(product) = self.store.get_product(ancestor)? {
                return Ok(Some(product));
            }
        }

        Ok(None)
    }

    /// The product at `path`, else the one it lives in.
    pub fn owning_product(&self, path: &Path) -> Result<Option<ProductRecord>> {
        match self.get(path)? {
            Some(product) => Ok(Some(product)),
            None => self.nearest_ancestor(path),
        }
    }

    pub fn all(&self) -> Result<Vec<ProductRecord>> {
        self.store.get_all_products()
    }
}

/// Absolute form of `path` with `.` dropped and `..` folded.
///
/// Relative paths are resolved against the working directory. The filesystem
/// is not otherwise consulted, so symlinks are kept as written.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };

    let mut normalized = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = normalized.components().next_back() {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    Ok(normalized)
}
