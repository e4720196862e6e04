//! Comment enrichment: language detection, translation, and sentiment.
//!
//! The [`Enricher`] chains a [`LanguageService`] and a [`SentimentAnalyzer`].
//! Text not already in the canonical language is translated before scoring.

mod libretranslate;
mod vader;

pub use libretranslate::LibreTranslateClient;
pub use vader::VaderAnalyzer;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::models::Sentiment;

/// Errors from the enrichment services.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Translation service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Language detection returned no candidates")]
    NoLanguageDetected,

    #[error("Sentiment analysis failed: {0}")]
    Sentiment(String),
}

/// Detects and translates natural language text.
#[async_trait]
pub trait LanguageService: Send + Sync {
    /// Best guess at the language code of `text`.
    async fn detect(&self, text: &str) -> Result<String, EnrichmentError>;

    /// Translate `text` from `source` to `target`.
    async fn translate(&self, text: &str, source: &str, target: &str)
        -> Result<String, EnrichmentError>;
}

/// Scores the sentiment of (canonical language) text.
pub trait SentimentAnalyzer: Send + Sync {
    fn score(&self, text: &str) -> Result<Sentiment, EnrichmentError>;
}

/// What enrichment produced for one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub language: String,
    pub translated: bool,
    pub sentiment: Sentiment,
}

/// Language-normalizing sentiment pipeline.
#[derive(Clone)]
pub struct Enricher {
    language: Arc<dyn LanguageService>,
    sentiment: Arc<dyn SentimentAnalyzer>,
    canonical_language: String,
}

impl Enricher {
    pub fn new(
        language: Arc<dyn LanguageService>,
        sentiment: Arc<dyn SentimentAnalyzer>,
        canonical_language: impl Into<String>,
    ) -> Self {
        Self {
            language,
            sentiment,
            canonical_language: canonical_language.into(),
        }
    }

    /// Detect, translate if needed, then score `text`.
    pub async fn enrich(&self, text: &str) -> Result<Enrichment, EnrichmentError> {
        let language = self.language.detect(text).await?;

        let translated = language != self.canonical_language;
        let scored_text = if translated {
            debug!("Translating from {} to {}", language, self.canonical_language);
            self.language
                .translate(text, &language, &self.canonical_language)
                .await?
        } else {
            text.to_string()
        };

        let sentiment = self.sentiment.score(&scored_text)?;

        Ok(Enrichment {
            language,
            translated,
            sentiment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Detects a fixed language and records translate calls.
    struct FixedLanguage {
        language: &'static str,
        translations: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl LanguageService for FixedLanguage {
        async fn detect(&self, _text: &str) -> Result<String, EnrichmentError> {
            Ok(self.language.to_string())
        }

        async fn translate(
            &self,
            text: &str,
            source: &str,
            target: &str,
        ) -> Result<String, EnrichmentError> {
            self.translations.lock().unwrap().push((
                text.to_string(),
                source.to_string(),
                target.to_string(),
            ));
            Ok("this is great".to_string())
        }
    }

    fn enricher(language: &'static str) -> (Enricher, Arc<FixedLanguage>) {
        let service = Arc::new(FixedLanguage {
            language,
            translations: Mutex::new(Vec::new()),
        });
        (
            Enricher::new(service.clone(), Arc::new(VaderAnalyzer), "en"),
            service,
        )
    }

    #[tokio::test]
    async fn test_canonical_text_is_not_translated() {
        let (enricher, service) = enricher("en");
        let result = enricher.enrich("this is great").await.unwrap();

        assert!(!result.translated);
        assert!(result.sentiment.compound > 0.0);
        assert!(service.translations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_text_is_translated_before_scoring() {
        let (enricher, service) = enricher("es");
        let result = enricher.enrich("esto es genial").await.unwrap();

        assert!(result.translated);
        assert_eq!(result.language, "es");
        assert!(result.sentiment.compound > 0.0);
        assert_eq!(
            service.translations.lock().unwrap().as_slice(),
            &[(
                "esto es genial".to_string(),
                "es".to_string(),
                "en".to_string()
            )]
        );
    }
}
