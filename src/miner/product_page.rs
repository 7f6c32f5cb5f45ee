use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;
use tracing::debug;

use crate::app::{Result, ShelfError};
use crate::domain::ExtractionResult;
use crate::miner::patterns::{is_item_url, shop_from_url};

const DETAIL_IMAGE_CLASS: &str = "market-item-detail-item-image";

static DETAIL_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"class="[^"]*{DETAIL_IMAGE_CLASS}[^"]*"[^>]*>[\s\S]*?<img[^>]+?(?:data-src|src)="([^"]+)""#
    ))
    .unwrap()
});

/// Looser variant: any quoting, image within 500 characters of the marker.
static DETAIL_IMAGE_NEARBY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"{DETAIL_IMAGE_CLASS}[\s\S]{{0,500}}?<img[^>]+?(?:data-src|src)=["']([^"']+)["']"#
    ))
    .unwrap()
});

static OG_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+property="og:image"\s+content="([^"]+)""#).unwrap()
});

static AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta\s+name="author"\s+content="([^"]+)""#).unwrap());

/// Mines the main image and shop name of a product page.
///
/// Fails only when `product_url` is not an item page; any page content,
/// however sparse, yields a (possibly empty) result.
pub fn mine_product_page(html: &str, product_url: &str) -> Result<ExtractionResult> {
    if !is_item_url(product_url) {
        return Err(ShelfError::InvalidInput(format!(
            "not a marketplace product URL: {}",
            product_url
        )));
    }

    let image_url = [&*DETAIL_IMAGE_RE, &*DETAIL_IMAGE_NEARBY_RE, &*OG_IMAGE_RE]
        .iter()
        .find_map(|re| first_capture(re, html))
        .unwrap_or_default();

    let shop_name = first_capture(&AUTHOR_RE, html)
        .filter(|author| !author.is_empty())
        .unwrap_or_else(|| shop_from_url(product_url));

    debug!(
        "Product page mined: url={} image={} shop={}",
        product_url,
        !image_url.is_empty(),
        shop_name
    );

    Ok(ExtractionResult {
        product_url: product_url.to_string(),
        image_url,
        shop_name,
    })
}

fn first_capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode_html_entities(m.as_str().trim()).to_string())
}
