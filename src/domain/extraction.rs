use serde::{Deserialize, Serialize};

/// Normalised output of the HTML miner or the AI extractor.
///
/// Every field is an empty string when unknown; callers never have to tell
/// `null` apart from "missing".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub product_url: String,
    pub image_url: String,
    pub shop_name: String,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.product_url.is_empty() && self.image_url.is_empty() && self.shop_name.is_empty()
    }

    pub fn has_product_url(&self) -> bool {
        !self.product_url.is_empty()
    }
}
