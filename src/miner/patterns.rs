//! Marketplace URL shapes shared by the miner and the AI recovery chain.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Item page on a shop subdomain, as linked from search results.
pub static SHOP_ITEM_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://[a-zA-Z0-9_-]+\.booth\.pm/items/\d+").unwrap());

/// Any item page shape, with or without a shop subdomain or locale prefix.
pub static ITEM_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:[a-zA-Z0-9_-]+\.)?booth\.pm/(?:[a-z]{2}(?:-[a-zA-Z]+)?/)?items/\d+")
        .unwrap()
});

pub static CDN_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://booth\.pximg\.net/[a-zA-Z0-9/._-]+\.(?:jpg|jpeg|png|webp)").unwrap()
});

/// Thumbnail size directory, e.g. `/c/300x300_a2d9ba4c/`.
static THUMBNAIL_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/c/\d+x\d+_[a-z0-9]+/").unwrap());

pub const MARKETPLACE_HOST: &str = "booth.pm";
pub const ITEM_PATH_MARKER: &str = "/items/";

/// Shop name from a `<shop>.booth.pm` host; empty for the bare domain.
pub fn shop_from_url(product_url: &str) -> String {
    Url::parse(product_url)
        .ok()
        .and_then(|u| u.host_str().map(shop_from_host))
        .unwrap_or_default()
}

fn shop_from_host(host: &str) -> String {
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() >= 3 {
        parts[0].to_string()
    } else {
        String::new()
    }
}

/// Canonical (unscaled) asset path of a CDN thumbnail URL.
pub fn strip_thumbnail_size(image_url: &str) -> String {
    THUMBNAIL_SEGMENT_RE.replace_all(image_url, "/").into_owned()
}

/// True if `url` points at an item page on the marketplace.
pub fn is_item_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let on_marketplace = parsed.host_str().is_some_and(|host| {
        host == MARKETPLACE_HOST || host.ends_with(&format!(".{MARKETPLACE_HOST}"))
    });
    on_marketplace && parsed.path().contains(ITEM_PATH_MARKER)
}
