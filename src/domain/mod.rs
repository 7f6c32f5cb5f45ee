pub mod extraction;
pub mod listing;
pub mod product;

pub use extraction::ExtractionResult;
pub use listing::{EntryKind, Issue, ListedEntry, Listing, Source};
pub use product::{ProductRecord, ProductUpdate};
