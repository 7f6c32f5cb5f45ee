//! AI-assisted extraction for pages the miner cannot handle.
//!
//! The model's answer is untrusted text; [`recovery`] turns whatever comes
//! back into an [`ExtractionResult`] without failing.

pub mod gemini;
pub mod prompt;
pub mod recovery;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::app::{Result, ShelfError};
use crate::config::GeminiConfig;
use crate::domain::ExtractionResult;

pub use gemini::GeminiClient;
pub use recovery::{recover, Recovered, RecoveryTier};

/// One text-generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub api_key: &'a str,
    pub model: &'a str,
    pub prompt: &'a str,
    pub search_grounding: bool,
    pub temperature: f32,
}

/// Opaque text-generation service.
#[async_trait]
pub trait TextGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String>;
}

pub struct AiExtractor {
    generator: Arc<dyn TextGenerator + Send + Sync>,
    model: String,
    temperature: f32,
    deadline: Duration,
    max_input_chars: usize,
}

impl AiExtractor {
    pub fn new(generator: Arc<dyn TextGenerator + Send + Sync>, config: &GeminiConfig) -> Self {
        Self {
            generator,
            model: config.model.clone(),
            temperature: config.temperature,
            deadline: config.timeout(),
            max_input_chars: config.max_input_chars,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Extracts product data from `html` with a grounded model call.
    ///
    /// Transport and service failures are returned as errors and never
    /// retried. A malformed answer is not an error: it degrades to a partial
    /// or empty result.
    pub async fn extract(&self, html: &str, api_key: &str) -> Result<ExtractionResult> {
        if api_key.trim().is_empty() {
            return Err(ShelfError::Config("Gemini API key not configured".into()));
        }

        let input = prompt::truncate_chars(html, self.max_input_chars);
        if input.len() < html.len() {
            warn!(
                "Input truncated from {} to {} bytes before extraction",
                html.len(),
                input.len()
            );
        }
        let prompt = prompt::build_prompt(input);

        let request = GenerationRequest {
            api_key,
            model: &self.model,
            prompt: &prompt,
            search_grounding: true,
            temperature: self.temperature,
        };

        let work = async {
            let text = self.generator.generate(&request).await?;
            Ok::<_, ShelfError>(recover(&text))
        };

        let recovered = timeout(self.deadline, work)
            .await
            .map_err(|_| ShelfError::Timeout {
                what: "AI extraction",
                after: self.deadline,
            })??;

        info!(
            "AI extraction recovered via {} tier (url found: {})",
            recovered.tier,
            recovered.result.has_product_url()
        );

        Ok(recovered.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CannedGenerator {
        reply: Option<String>,
        seen: Mutex<Vec<(String, bool, String)>>,
    }

    impl CannedGenerator {
        fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
            self.seen.lock().unwrap().push((
                request.api_key.to_string(),
                request.search_grounding,
                request.prompt.to_string(),
            ));
            self.reply.clone().ok_or(ShelfError::Upstream {
                status: 500,
                body: "boom".into(),
            })
        }
    }

    struct StalledGenerator;

    #[async_trait]
    impl TextGenerator for StalledGenerator {
        async fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_extract_sends_grounded_prompt_and_recovers() {
        let generator = Arc::new(CannedGenerator::replying(
            "```json\n{\"productUrl\": \"https://shop.booth.pm/items/9\", \"imageUrl\": \"\", \"shopName\": \"\"}\n```",
        ));
        let extractor = AiExtractor::new(generator.clone(), &GeminiConfig::default());

        let result = extractor.extract("<div>Karin</div>", "key-1").await.unwrap();
        assert_eq!(result.product_url, "https://shop.booth.pm/items/9");
        assert_eq!(result.shop_name, "shop");

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "key-1");
        assert!(seen[0].1);
        assert!(seen[0].2.contains("<div>Karin</div>"));
    }

    #[tokio::test]
    async fn test_garbage_answer_is_empty_result_not_error() {
        let generator = Arc::new(CannedGenerator::replying("I could not find anything."));
        let extractor = AiExtractor::new(generator, &GeminiConfig::default());
        let result = extractor.extract("<html></html>", "key").await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_service_error_is_surfaced() {
        let generator = Arc::new(CannedGenerator {
            reply: None,
            seen: Mutex::new(Vec::new()),
        });
        let extractor = AiExtractor::new(generator, &GeminiConfig::default());
        let err = extractor.extract("<html></html>", "key").await.unwrap_err();
        assert!(matches!(err, ShelfError::Upstream { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let generator = Arc::new(CannedGenerator::replying("{}"));
        let extractor = AiExtractor::new(generator.clone(), &GeminiConfig::default());
        let err = extractor.extract("<html></html>", "  ").await.unwrap_err();
        assert!(matches!(err, ShelfError::Config(_)));
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_covers_model_call() {
        let extractor = AiExtractor::new(Arc::new(StalledGenerator), &GeminiConfig::default())
            .with_deadline(Duration::from_secs(5));
        let err = extractor.extract("<html></html>", "key").await.unwrap_err();
        assert!(matches!(err, ShelfError::Timeout { what: "AI extraction", .. }));
    }

    #[tokio::test]
    async fn test_long_input_is_truncated() {
        let generator = Arc::new(CannedGenerator::replying("{}"));
        let config = GeminiConfig {
            max_input_chars: 10,
            ..Default::default()
        };
        let extractor = AiExtractor::new(generator.clone(), &config);
        extractor
            .extract(&"x".repeat(50), "key")
            .await
            .unwrap();

        let seen = generator.seen.lock().unwrap();
        assert!(seen[0].2.ends_with(&"x".repeat(10)));
        assert!(!seen[0].2.contains(&"x".repeat(11)));
    }
}
