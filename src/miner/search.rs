use tracing::debug;

use crate::app::{Result, ShelfError};
use crate::domain::ExtractionResult;
use crate::miner::patterns::{shop_from_url, strip_thumbnail_size, CDN_IMAGE_RE, SHOP_ITEM_URL_RE};

/// Mines the first product of a marketplace search results page.
///
/// A page without any item link carries no usable signal and yields
/// [`ShelfError::NotFound`]; a missing thumbnail only leaves `image_url` empty.
pub fn mine_search_results(html: &str) -> Result<ExtractionResult> {
    let product_url = SHOP_ITEM_URL_RE
        .find(html)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ShelfError::NotFound("no products found in search results".into()))?;

    let shop_name = shop_from_url(&product_url);

    let image_url = CDN_IMAGE_RE
        .find(html)
        .map(|m| strip_thumbnail_size(m.as_str()))
        .unwrap_or_default();

    debug!(
        "Search page mined: url={} image={} shop={}",
        product_url,
        !image_url.is_empty(),
        shop_name
    );

    Ok(ExtractionResult {
        product_url,
        image_url,
        shop_name,
    })
}
