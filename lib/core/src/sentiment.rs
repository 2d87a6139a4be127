//! Review sentiment scoring with VADER
//!
//! Compound polarity comes from the VADER lexicon and rules (boosters,
//! negation, capitalization, contrastive "but", punctuation emphasis) as
//! implemented by the `vader_sentiment` crate. Scores lie in [-1, 1].
//!
//! Product reviews arrive comma-joined, so [`SentimentAnalyzer::review_score`]
//! scores each piece separately and averages.

use once_cell::sync::Lazy;
use vader_sentiment::SentimentIntensityAnalyzer;

static VADER: Lazy<SentimentIntensityAnalyzer<'static>> = Lazy::new(SentimentIntensityAnalyzer::new);

/// Handle to the shared VADER analyzer
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// VADER compound polarity of one piece of text (0.0 for blank text)
    pub fn polarity(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        VADER
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }

    /// Average compound score of a comma-joined review string
    ///
    /// Missing or blank text is neutral (0.0). Without a comma the whole
    /// text is a single review.
    pub fn review_score(&self, reviews: Option<&str>) -> f64 {
        let text = match reviews {
            Some(text) if !text.trim().is_empty() => text,
            _ => return 0.0,
        };

        let scores: Vec<f64> = text.split(',').map(|review| self.polarity(review)).collect();
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}
