//! Pattern-based extraction of product data from marketplace HTML.
//!
//! Both entry points are pure functions of the page text; fetching is the
//! caller's job.

pub mod patterns;
mod product_page;
mod search;

pub use product_page::mine_product_page;
pub use search::mine_search_results;
