use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ExtractionResult;

/// A directory registered as one purchased/downloaded asset package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub path: PathBuf,
    pub name: String,
    pub product_url: Option<String>,
    pub image_url: Option<String>,
    pub shop_name: Option<String>,
    /// Sorted by name; the association itself is unordered.
    pub tags: Vec<String>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProductRecord {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.path.to_str().unwrap_or("(unnamed)")
        } else {
            &self.name
        }
    }

    pub fn has_metadata(&self) -> bool {
        self.product_url.is_some() || self.image_url.is_some() || self.shop_name.is_some()
    }
}

/// Full replacement of a product's marketplace metadata and tag set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub product_url: Option<String>,
    pub image_url: Option<String>,
    pub shop_name: Option<String>,
    pub tags: Vec<String>,
}

impl ProductUpdate {
    /// Starts from the stored record so untouched fields survive the overwrite.
    pub fn from_record(record: &ProductRecord) -> Self {
        Self {
            product_url: record.product_url.clone(),
            image_url: record.image_url.clone(),
            shop_name: record.shop_name.clone(),
            tags: record.tags.clone(),
        }
    }

    /// Overlays the known (non-empty) fields of an extraction.
    pub fn merge_extraction(mut self, result: &ExtractionResult) -> Self {
        if let Some(url) = non_empty(&result.product_url) {
            self.product_url = Some(url);
        }
        if let Some(image) = non_empty(&result.image_url) {
            self.image_url = Some(image);
        }
        if let Some(shop) = non_empty(&result.shop_name) {
            self.shop_name = Some(shop);
        }
        self
    }

    /// Trimmed, non-empty tag names with duplicates removed, first occurrence wins.
    pub fn normalized_tags(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.to_string()))
            .map(String::from)
            .collect()
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ProductRecord {
        ProductRecord {
            id: 1,
            path: PathBuf::from("/assets/Shader_Pack"),
            name: "Shader_Pack".into(),
            product_url: Some("https://shop.booth.pm/items/1".into()),
            image_url: Some("https://booth.pximg.net/a.png".into()),
            shop_name: None,
            tags: vec!["shader".into()],
            registered_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_merge_keeps_stored_fields_for_unknown_values() {
        let result = ExtractionResult {
            product_url: String::new(),
            image_url: "https://booth.pximg.net/b.png".into(),
            shop_name: "shop".into(),
        };
        let update = ProductUpdate::from_record(&record()).merge_extraction(&result);

        assert_eq!(update.product_url.as_deref(), Some("https://shop.booth.pm/items/1"));
        assert_eq!(update.image_url.as_deref(), Some("https://booth.pximg.net/b.png"));
        assert_eq!(update.shop_name.as_deref(), Some("shop"));
        assert_eq!(update.tags, vec!["shader".to_string()]);
    }

    #[test]
    fn test_normalized_tags_dedup_and_skip_blank() {
        let update = ProductUpdate {
            tags: vec!["y".into(), " z ".into(), "".into(), "y".into(), "  ".into()],
            ..Default::default()
        };
        assert_eq!(update.normalized_tags(), vec!["y".to_string(), "z".to_string()]);
    }

    #[test]
    fn test_display_name_falls_back_to_path() {
        let mut r = record();
        assert_eq!(r.display_name(), "Shader_Pack");
        r.name.clear();
        assert_eq!(r.display_name(), "/assets/Shader_Pack");
        assert!(r.has_metadata());
    }
}
