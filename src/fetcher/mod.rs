pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::{Result, ShelfError};

/// Raw response of a page fetch; the status is checked by the caller.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    /// Body of a 200 response, or an error carrying the observed status.
    pub fn into_html(self, url: &str) -> Result<String> {
        if self.status != 200 {
            return Err(ShelfError::UnexpectedStatus {
                url: url.to_string(),
                status: self.status,
            });
        }
        Ok(self.body)
    }
}

#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}
