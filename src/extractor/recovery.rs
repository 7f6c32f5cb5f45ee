//! Turns untrusted model output into an [`ExtractionResult`].
//!
//! Tiers run in order until one produces a structured object:
//!
//! 1. direct parse, after stripping a surrounding code fence
//! 2. parse of the outermost `{ ... }` span inside surrounding prose
//! 3. independent regex heuristics over the raw text
//!
//! None of them fails; the worst case is an empty result.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::domain::ExtractionResult;
use crate::miner::patterns::{shop_from_url, CDN_IMAGE_RE, ITEM_URL_RE};

/// Runs of Japanese script, used as a last-resort shop name.
static NATIVE_SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Han}\p{Hiragana}\p{Katakana}ー々]{2,}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryTier {
    Direct,
    Embedded,
    Heuristic,
}

impl fmt::Display for RecoveryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryTier::Direct => write!(f, "direct"),
            RecoveryTier::Embedded => write!(f, "embedded"),
            RecoveryTier::Heuristic => write!(f, "heuristic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    pub result: ExtractionResult,
    pub tier: RecoveryTier,
}

/// Accepted spellings per field, canonical key first; older schemas are aliases.
const PRODUCT_URL_KEYS: &[&str] = &["productUrl", "product_url", "productURL", "url"];
const IMAGE_URL_KEYS: &[&str] = &["imageUrl", "image_url", "imageURL", "image"];
const SHOP_NAME_KEYS: &[&str] = &["shopName", "shop_name", "shop", "author"];

/// First key holding a string wins; non-string values count as unknown.
fn field(object: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

pub fn recover(text: &str) -> Recovered {
    let unfenced = strip_code_fence(text);

    let (mut result, tier) = if let Some(result) = parse_object(unfenced) {
        (result, RecoveryTier::Direct)
    } else if let Some(result) = outer_object(unfenced).and_then(parse_object) {
        (result, RecoveryTier::Embedded)
    } else {
        (heuristic(text), RecoveryTier::Heuristic)
    };

    if result.shop_name.is_empty() && result.has_product_url() {
        result.shop_name = shop_from_url(&result.product_url);
    }

    Recovered { result, tier }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drops the info string (`json`) along with the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn parse_object(candidate: &str) -> Option<ExtractionResult> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    let object = value.as_object()?;
    Some(ExtractionResult {
        product_url: field(object, PRODUCT_URL_KEYS),
        image_url: field(object, IMAGE_URL_KEYS),
        shop_name: field(object, SHOP_NAME_KEYS),
    })
}

fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn heuristic(text: &str) -> ExtractionResult {
    let find = |re: &Regex| re.find(text).map(|m| m.as_str().to_string()).unwrap_or_default();
    ExtractionResult {
        product_url: find(&ITEM_URL_RE),
        image_url: find(&CDN_IMAGE_RE),
        shop_name: find(&NATIVE_SCRIPT_RE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_recovers_exact_fields() {
        let text = "```json\n{\"productUrl\": \"https://kawaii-shop.booth.pm/items/5012345\", \
                    \"imageUrl\": \"https://booth.pximg.net/4a3f/i/5012345/main.jpg\", \
                    \"shopName\": \"かわいいショップ\"}\n```";
        let recovered = recover(text);
        assert_eq!(recovered.tier, RecoveryTier::Direct);
        assert_eq!(
            recovered.result,
            ExtractionResult {
                product_url: "https://kawaii-shop.booth.pm/items/5012345".into(),
                image_url: "https://booth.pximg.net/4a3f/i/5012345/main.jpg".into(),
                shop_name: "かわいいショップ".into(),
            }
        );
    }

    #[test]
    fn test_plain_json_with_snake_case_keys() {
        let text = r#"{"product_url": "https://booth.pm/ja/items/7", "image_url": null}"#;
        let recovered = recover(text);
        assert_eq!(recovered.tier, RecoveryTier::Direct);
        assert_eq!(recovered.result.product_url, "https://booth.pm/ja/items/7");
        assert!(recovered.result.image_url.is_empty());
        // bare domain: nothing to backfill from
        assert!(recovered.result.shop_name.is_empty());
    }

    #[test]
    fn test_canonical_key_wins_over_alias_in_same_object() {
        let text = r#"{"productUrl": "https://booth.pm/ja/items/1",
            "imageUrl": "https://booth.pximg.net/a/main.jpg",
            "shopName": "Kawaii Shop",
            "image": "https://example.com/x.jpg",
            "shop": 42}"#;
        let recovered = recover(text);
        assert_eq!(recovered.tier, RecoveryTier::Direct);
        assert_eq!(recovered.result.image_url, "https://booth.pximg.net/a/main.jpg");
        assert_eq!(recovered.result.shop_name, "Kawaii Shop");
    }

    #[test]
    fn test_non_string_values_are_unknown() {
        let text = r#"{"productUrl": 5012345, "imageUrl": null, "image": "https://booth.pximg.net/b.png"}"#;
        let recovered = recover(text);
        assert_eq!(recovered.tier, RecoveryTier::Direct);
        assert!(recovered.result.product_url.is_empty());
        assert_eq!(recovered.result.image_url, "https://booth.pximg.net/b.png");
    }

    #[test]
    fn test_prose_around_object_uses_embedded_tier() {
        let text = "Here is what I found:\n\
                    {\"productUrl\": \"https://atelier.booth.pm/items/42\", \"imageUrl\": \"\", \"shopName\": \"\"}\n\
                    Let me know if you need anything else.";
        let recovered = recover(text);
        assert_eq!(recovered.tier, RecoveryTier::Embedded);
        assert_eq!(recovered.result.product_url, "https://atelier.booth.pm/items/42");
        assert_eq!(recovered.result.shop_name, "atelier");
    }

    #[test]
    fn test_unstructured_text_falls_back_to_regex() {
        let text = "I found the item at https://kawaii-shop.booth.pm/items/5012345 and its image \
                    https://booth.pximg.net/4a3f/i/5012345/main.png.";
        let recovered = recover(text);
        assert_eq!(recovered.tier, RecoveryTier::Heuristic);
        assert_eq!(
            recovered.result.product_url,
            "https://kawaii-shop.booth.pm/items/5012345"
        );
        assert_eq!(
            recovered.result.image_url,
            "https://booth.pximg.net/4a3f/i/5012345/main.png"
        );
        assert_eq!(recovered.result.shop_name, "kawaii-shop");
    }

    #[test]
    fn test_heuristic_native_script_shop_name() {
        let text = "Shop: かわいいショップ (https://booth.pm/ja/items/3)";
        let recovered = recover(text);
        assert_eq!(recovered.tier, RecoveryTier::Heuristic);
        assert_eq!(recovered.result.shop_name, "かわいいショップ");
        assert_eq!(recovered.result.product_url, "https://booth.pm/ja/items/3");
    }

    #[test]
    fn test_broken_json_degrades_to_empty_result() {
        let recovered = recover("{\"productUrl\": \"https://");
        assert_eq!(recovered.tier, RecoveryTier::Heuristic);
        assert!(recovered.result.is_empty());

        let recovered = recover("");
        assert!(recovered.result.is_empty());
    }

    #[test]
    fn test_non_object_json_is_not_accepted() {
        let recovered = recover("[\"https://a.booth.pm/items/1\"]");
        assert_eq!(recovered.tier, RecoveryTier::Heuristic);
        assert_eq!(recovered.result.product_url, "https://a.booth.pm/items/1");
    }
}
