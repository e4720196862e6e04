//! VADER lexicon-based sentiment scoring.

use vader_sentiment::SentimentIntensityAnalyzer;

use super::{EnrichmentError, SentimentAnalyzer};
use crate::models::Sentiment;

/// Sentiment analyzer using the VADER lexicon.
#[derive(Debug, Clone, Copy, Default)]
pub struct VaderAnalyzer;

impl SentimentAnalyzer for VaderAnalyzer {
    fn score(&self, text: &str) -> Result<Sentiment, EnrichmentError> {
        let analyzer = SentimentIntensityAnalyzer::new();
        let scores = analyzer.polarity_scores(text);

        let get = |key: &str| {
            scores
                .get(key)
                .copied()
                .ok_or_else(|| EnrichmentError::Sentiment(format!("missing '{}' score", key)))
        };

        Ok(Sentiment {
            compound: get("compound")?,
            pos: get("pos")?,
            neu: get("neu")?,
            neg: get("neg")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity() {
        let positive = VaderAnalyzer.score("I love this, it is wonderful!").unwrap();
        assert!(positive.compound > 0.5);
        assert!(positive.pos > positive.neg);

        let negative = VaderAnalyzer.score("This is terrible and I hate it.").unwrap();
        assert!(negative.compound < -0.5);
        assert!(negative.neg > negative.pos);
    }
}
