use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};
use tracing::warn;

use crate::app::{Result, ShelfError};
use crate::domain::{Issue, ProductRecord, ProductUpdate};
use crate::store::Store;

const PRODUCT_COLUMNS: &str = "id, path, name, url, image_url, shop_name, registered_at, updated_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![
            M::up(include_str!("../../migrations/001-initial/up.sql")),
            M::up(include_str!("../../migrations/002-timestamps/up.sql")),
        ]);

        let mut conn = self.lock()?;

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| ShelfError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            ShelfError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    fn path_key(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    fn product_from_row(row: &Row<'_>) -> rusqlite::Result<ProductRecord> {
        Ok(ProductRecord {
            id: row.get(0)?,
            path: PathBuf::from(row.get::<_, String>(1)?),
            name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            product_url: row.get(3)?,
            image_url: row.get(4)?,
            shop_name: row.get(5)?,
            tags: Vec::new(),
            registered_at: row
                .get::<_, Option<String>>(6)?
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            updated_at: row
                .get::<_, Option<String>>(7)?
                .and_then(|s| Self::parse_datetime(&s)),
        })
    }

    fn tags_for(conn: &Connection, product_id: i64) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT t.name FROM tags t
             JOIN product_tags pt ON t.id = pt.tag_id
             WHERE pt.product_id = ?1
             ORDER BY t.name",
        )?;
        let tags = stmt
            .query_map(params![product_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(tags)
    }

    fn link_tag(conn: &Connection, product_id: i64, tag: &str) -> rusqlite::Result<()> {
        conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", params![tag])?;
        let tag_id: i64 =
            conn.query_row("SELECT id FROM tags WHERE name = ?1", params![tag], |row| {
                row.get(0)
            })?;
        conn.execute(
            "INSERT OR IGNORE INTO product_tags (product_id, tag_id) VALUES (?1, ?2)",
            params![product_id, tag_id],
        )?;
        Ok(())
    }
}

fn stored(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl Store for SqliteStore {
    fn get_product(&self, path: &Path) -> Result<Option<ProductRecord>> {
        let conn = self.lock()?;

        let product = conn
            .query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE path = ?1"),
                params![Self::path_key(path)],
                Self::product_from_row,
            )
            .optional()?;

        match product {
            Some(mut product) => {
                product.tags = Self::tags_for(&conn, product.id)?;
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    fn get_all_products(&self) -> Result<Vec<ProductRecord>> {
        let conn = self.lock()?;

        let mut stmt =
            conn.prepare(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY path"))?;
        let mut products = stmt
            .query_map([], Self::product_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for product in &mut products {
            product.tags = Self::tags_for(&conn, product.id)?;
        }

        Ok(products)
    }

    fn insert_product(&self, path: &Path, name: &str) -> Result<bool> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO products (path, name, registered_at) VALUES (?1, ?2, ?3)",
            params![Self::path_key(path), name, Utc::now().to_rfc3339()],
        )?;

        Ok(inserted > 0)
    }

    fn update_product(&self, path: &Path, update: &ProductUpdate) -> Result<Vec<Issue>> {
        let mut conn = self.lock()?;
        let mut tx = conn.transaction()?;

        let product_id: i64 = tx
            .query_row(
                "SELECT id FROM products WHERE path = ?1",
                params![Self::path_key(path)],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| ShelfError::NotFound(format!("no product at {}", path.display())))?;

        tx.execute(
            "UPDATE products SET url = ?1, image_url = ?2, shop_name = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                stored(&update.product_url),
                stored(&update.image_url),
                stored(&update.shop_name),
                Utc::now().to_rfc3339(),
                product_id
            ],
        )?;

        tx.execute(
            "DELETE FROM product_tags WHERE product_id = ?1",
            params![product_id],
        )?;

        let mut issues = Vec::new();
        for tag in update.normalized_tags() {
            // A failed tag rolls back alone when its savepoint drops.
            let savepoint = tx.savepoint()?;
            match Self::link_tag(&savepoint, product_id, &tag) {
                Ok(()) => savepoint.commit()?,
                Err(e) => {
                    warn!("Error adding tag {} to {}: {}", tag, path.display(), e);
                    issues.push(Issue::new(tag, e.to_string()));
                }
            }
        }

        tx.commit()?;
        Ok(issues)
    }

    fn get_all_tags(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT name FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tags: &[&str]) -> ProductUpdate {
        ProductUpdate {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_get_product() {
        let store = SqliteStore::in_memory().unwrap();
        let path = Path::new("/assets/Shader_Pack");
        assert!(store.insert_product(path, "Shader_Pack").unwrap());

        let product = store.get_product(path).unwrap().unwrap();
        assert_eq!(product.path, PathBuf::from("/assets/Shader_Pack"));
        assert_eq!(product.name, "Shader_Pack");
        assert_eq!(product.product_url, None);
        assert!(product.tags.is_empty());
        assert!(product.updated_at.is_none());
    }

    #[test]
    fn test_insert_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        let path = Path::new("/assets/Karin");
        assert!(store.insert_product(path, "Karin").unwrap());
        assert!(!store.insert_product(path, "Other name").unwrap());

        let product = store.get_product(path).unwrap().unwrap();
        assert_eq!(product.name, "Karin");
        assert_eq!(store.get_all_products().unwrap().len(), 1);
    }

    #[test]
    fn test_get_product_nonexistent() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_product(Path::new("/nowhere")).unwrap().is_none());
    }

    #[test]
    fn test_update_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let path = Path::new("/assets/Karin");
        store.insert_product(path, "Karin").unwrap();

        let update = ProductUpdate {
            product_url: Some("https://kawaii-shop.booth.pm/items/5012345".into()),
            image_url: Some("https://booth.pximg.net/4a3f/i/5012345/main.jpg".into()),
            shop_name: Some("kawaii-shop".into()),
            tags: Vec::new(),
        };
        let issues = store.update_product(path, &update).unwrap();
        assert!(issues.is_empty());

        let product = store.get_product(path).unwrap().unwrap();
        assert_eq!(product.product_url, update.product_url);
        assert_eq!(product.image_url, update.image_url);
        assert_eq!(product.shop_name, update.shop_name);
        assert!(product.tags.is_empty());
        assert!(product.updated_at.is_some());
    }

    #[test]
    fn test_update_replaces_tag_set() {
        let store = SqliteStore::in_memory().unwrap();
        let path = Path::new("/assets/Karin");
        store.insert_product(path, "Karin").unwrap();

        store.update_product(path, &tagged(&["x", "y"])).unwrap();
        assert_eq!(store.get_product(path).unwrap().unwrap().tags, vec!["x", "y"]);

        store.update_product(path, &tagged(&["y", "z"])).unwrap();
        assert_eq!(store.get_product(path).unwrap().unwrap().tags, vec!["y", "z"]);
    }

    #[test]
    fn test_update_dedups_and_skips_blank_tags() {
        let store = SqliteStore::in_memory().unwrap();
        let path = Path::new("/assets/Karin");
        store.insert_product(path, "Karin").unwrap();

        store
            .update_product(path, &tagged(&["hair", "", "hair", " hair "]))
            .unwrap();
        assert_eq!(store.get_product(path).unwrap().unwrap().tags, vec!["hair"]);
    }

    #[test]
    fn test_failing_tag_is_skipped_and_reported() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_bad_tag BEFORE INSERT ON tags
                 WHEN NEW.name = 'bad'
                 BEGIN SELECT RAISE(ABORT, 'tag rejected'); END;",
            )
            .unwrap();
        let path = Path::new("/assets/Karin");
        store.insert_product(path, "Karin").unwrap();

        let update = ProductUpdate {
            product_url: Some("https://kawaii-shop.booth.pm/items/5012345".into()),
            tags: vec!["avatar".into(), "bad".into(), "outfit".into()],
            ..Default::default()
        };
        let issues = store.update_product(path, &update).unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].subject, "bad");
        let product = store.get_product(path).unwrap().unwrap();
        assert_eq!(product.tags, vec!["avatar", "outfit"]);
        assert_eq!(product.product_url, update.product_url);
        assert_eq!(store.get_all_tags().unwrap(), vec!["avatar", "outfit"]);
    }

    #[test]
    fn test_tags_are_shared_across_products() {
        let store = SqliteStore::in_memory().unwrap();
        let a = Path::new("/assets/A");
        let b = Path::new("/assets/B");
        store.insert_product(a, "A").unwrap();
        store.insert_product(b, "B").unwrap();

        store.update_product(a, &tagged(&["outfit", "quest"])).unwrap();
        store.update_product(b, &tagged(&["outfit"])).unwrap();

        assert_eq!(store.get_all_tags().unwrap(), vec!["outfit", "quest"]);
        assert_eq!(store.get_product(b).unwrap().unwrap().tags, vec!["outfit"]);
    }

    #[test]
    fn test_empty_strings_are_stored_as_unknown() {
        let store = SqliteStore::in_memory().unwrap();
        let path = Path::new("/assets/Karin");
        store.insert_product(path, "Karin").unwrap();

        let update = ProductUpdate {
            product_url: Some(String::new()),
            ..Default::default()
        };
        store.update_product(path, &update).unwrap();
        assert_eq!(store.get_product(path).unwrap().unwrap().product_url, None);
    }

    #[test]
    fn test_update_unknown_product_is_not_found() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store
            .update_product(Path::new("/missing"), &ProductUpdate::default())
            .unwrap_err();
        assert!(matches!(err, ShelfError::NotFound(_)));
    }

    #[test]
    fn test_file_backed_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("assetshelf.db");
        let path = Path::new("/assets/Karin");

        {
            let store = SqliteStore::new(&db_path).unwrap();
            store.insert_product(path, "Karin").unwrap();
            store.update_product(path, &tagged(&["hair"])).unwrap();
        }

        let store = SqliteStore::new(&db_path).unwrap();
        let product = store.get_product(path).unwrap().unwrap();
        assert_eq!(product.tags, vec!["hair"]);
    }
}
