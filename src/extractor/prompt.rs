/// Keys the model is asked to return; the recovery parser also accepts
/// snake_case spellings.
pub const RESPONSE_KEYS: [&str; 3] = ["productUrl", "imageUrl", "shopName"];

/// Builds the single instruction sent to the model, with the page embedded.
pub fn build_prompt(html: &str) -> String {
    format!(
        r#"You are a data extraction backend for the Booth marketplace (booth.pm).
Identify the product described by the HTML or text below and return its metadata.

Steps:
1. Read the input and look for the product item page and its main image.
2. If the item URL or image URL is missing or incomplete, use Google Search to
   find the official Booth item page. Product titles, folder names and shop
   names in the input make good search terms.
3. Prefer canonical item URLs: https://booth.pm/ja/items/<ID> or
   https://<shop>.booth.pm/items/<ID>.

Output rules:
- Respond with a single raw JSON object. No Markdown fences, no explanations.
- Use exactly these keys: "{url_key}", "{image_key}", "{shop_key}".
- Every key must be present. Use an empty string "" for unknown values.

Fields:
- {url_key}: canonical URL of the item page.
- {image_key}: URL of the main product image (usually on booth.pximg.net).
- {shop_key}: display name of the shop or author; infer it from the shop
  subdomain if nothing better is available.

Input:
{html}"#,
        url_key = RESPONSE_KEYS[0],
        image_key = RESPONSE_KEYS[1],
        shop_key = RESPONSE_KEYS[2],
    )
}

/// Cuts `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
