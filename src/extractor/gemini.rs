use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::app::{Result, ShelfError};
use crate::config::GeminiConfig;
use crate::extractor::{GenerationRequest, TextGenerator};

/// Longest slice of an error body kept in [`ShelfError::Upstream`].
const ERROR_BODY_LIMIT: usize = 500;

/// `generateContent` client for the Gemini REST API.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ShelfError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn request_body(request: &GenerationRequest<'_>) -> serde_json::Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }]
            }],
            "generationConfig": {
                "temperature": request.temperature
            }
        });
        if request.search_grounding {
            body["tools"] = json!([{ "google_search": {} }]);
        }
        body
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, request.model);
        debug!(
            "Sending generateContent request (model {}, grounding {})",
            request.model, request.search_grounding
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", request.api_key)
            .json(&Self::request_body(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(ShelfError::Upstream {
                status: status.as_u16(),
                body: snippet,
            });
        }

        response_text(&body)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
///
/// Grounded answers are often split across several parts.
pub fn response_text(body: &str) -> Result<String> {
    let envelope: GenerateContentResponse = serde_json::from_str(body)?;

    let text: String = envelope
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ShelfError::EmptyResponse);
    }
    Ok(text)
}
