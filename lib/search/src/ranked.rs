//! Ranked text search and category recommendations
//!
//! Per-entry title tokens and review sentiment are computed once when the
//! engine is built; a query then costs one pass over the catalog.

use crate::config::EngineConfig;
use crate::lexical::{category_contains, is_exact_title, overlap, WholeWordMatcher};
use crate::{Result, SearchError};
use ahash::AHashSet;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shopmatch_core::{token_set, Catalog, CatalogEntry, SentimentAnalyzer};
use std::sync::Arc;
use tracing::debug;

/// A product as returned by text search or recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedProduct {
    /// Position in the catalog
    pub index: usize,
    pub title: String,
    pub url: String,
    pub price: String,
    pub top_review: Option<String>,
    pub rating: Option<f64>,
    pub category: String,
    pub image_url: String,
    /// Lexical overlap with the query; 0 for recommendations
    pub match_score: usize,
    pub sentiment_score: f64,
}

impl RankedProduct {
    fn from_entry(index: usize, entry: &CatalogEntry, match_score: usize, sentiment_score: f64) -> Self {
        Self {
            index,
            title: entry.title.clone(),
            url: entry.url.clone(),
            price: entry.price.clone(),
            top_review: entry.top_review.clone(),
            rating: entry.rating,
            category: entry.category.clone(),
            image_url: entry.display_image_url().to_string(),
            match_score,
            sentiment_score,
        }
    }
}

/// Results of a text search: ranked hits plus recommendations drawn from
/// the top hit's category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSearchResults {
    pub results: Vec<RankedProduct>,
    pub recommendations: Vec<RankedProduct>,
}

#[derive(Debug, Clone)]
struct EntryFeatures {
    title_tokens: AHashSet<String>,
    title_lower: String,
    sentiment: f64,
}

/// Text search over a fixed catalog
pub struct RankedSearchEngine {
    catalog: Arc<Catalog>,
    features: Vec<EntryFeatures>,
    max_results: usize,
    max_recommendations: usize,
}

impl RankedSearchEngine {
    pub fn new(catalog: Arc<Catalog>, analyzer: &SentimentAnalyzer, config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let features: Vec<EntryFeatures> = catalog
            .entries()
            .par_iter()
            .map(|entry| EntryFeatures {
                title_tokens: token_set(&entry.title),
                title_lower: entry.title.to_lowercase(),
                sentiment: analyzer.review_score(entry.top_review.as_deref()),
            })
            .collect();

        Ok(Self {
            catalog,
            features,
            max_results: config.max_results,
            max_recommendations: config.max_recommendations,
        })
    }

    #[inline]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Precomputed review sentiment of the entry at `index`
    #[inline]
    pub fn sentiment(&self, index: usize) -> Option<f64> {
        self.features.get(index).map(|f| f.sentiment)
    }

    /// Search the catalog by free text
    ///
    /// 1. The first entry (in catalog order) whose title equals the query
    ///    case-insensitively is returned alone.
    /// 2. Otherwise every entry sharing a token with the query, or containing
    ///    the query as a whole word, is a candidate; candidates are ordered by
    ///    match score then sentiment, both descending, catalog order on ties.
    /// 3. Recommendations come from the top hit's category.
    ///
    /// Returns `SearchError::EmptyResult` when nothing matches.
    pub fn search(&self, query: &str) -> Result<TextSearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidInput("Query is required".to_string()));
        }

        let query_tokens = token_set(query);

        if let Some(index) = self.exact_match(query) {
            let entry = &self.catalog.entries()[index];
            let features = &self.features[index];
            debug!("Exact title match for {:?} at entry {}", query, index);
            let top = RankedProduct::from_entry(
                index,
                entry,
                overlap(&query_tokens, &features.title_tokens),
                features.sentiment,
            );
            return Ok(TextSearchResults {
                recommendations: self.recommend(&entry.category),
                results: vec![top],
            });
        }

        let whole_word = WholeWordMatcher::new(query);
        let mut hits: Vec<(usize, usize, f64)> = self
            .features
            .iter()
            .enumerate()
            .filter_map(|(index, features)| {
                let score = overlap(&query_tokens, &features.title_tokens);
                let contains = whole_word
                    .as_ref()
                    .is_some_and(|m| m.is_match(&features.title_lower));
                (score > 0 || contains).then_some((index, score, features.sentiment))
            })
            .collect();

        debug!("Text query {:?} matched {} candidates", query, hits.len());
        if hits.is_empty() {
            return Err(SearchError::EmptyResult("No products found".to_string()));
        }

        // Stable: equal keys keep catalog order
        hits.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| OrderedFloat(b.2).cmp(&OrderedFloat(a.2)))
        });
        hits.truncate(self.max_results);

        let results: Vec<RankedProduct> = hits
            .into_iter()
            .map(|(index, score, sentiment)| {
                RankedProduct::from_entry(index, &self.catalog.entries()[index], score, sentiment)
            })
            .collect();

        let Some(top) = results.first() else {
            return Err(SearchError::EmptyResult("No products found".to_string()));
        };
        let recommendations = self.recommend(&top.category);
        Ok(TextSearchResults { results, recommendations })
    }

    /// Entries whose category list contains `category` (case-insensitive
    /// substring), best sentiment first
    ///
    /// A blank category recommends nothing.
    pub fn recommend(&self, category: &str) -> Vec<RankedProduct> {
        let needle = category.trim();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut picks: Vec<(usize, f64)> = self
            .catalog
            .iter()
            .filter(|(_, entry)| category_contains(&entry.category, needle))
            .map(|(index, _)| (index, self.features[index].sentiment))
            .collect();

        picks.sort_by(|a, b| OrderedFloat(b.1).cmp(&OrderedFloat(a.1)));
        picks.truncate(self.max_recommendations);

        picks
            .into_iter()
            .map(|(index, sentiment)| {
                RankedProduct::from_entry(index, &self.catalog.entries()[index], 0, sentiment)
            })
            .collect()
    }

    fn exact_match(&self, query: &str) -> Option<usize> {
        self.catalog
            .iter()
            .find(|(_, entry)| is_exact_title(query, &entry.title))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(entries: Vec<CatalogEntry>) -> RankedSearchEngine {
        let catalog = Arc::new(entries.into_iter().collect::<Catalog>());
        RankedSearchEngine::new(catalog, &SentimentAnalyzer::new(), &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let engine = engine(vec![
            CatalogEntry::new("Red Shoe", "Shoes"),
            CatalogEntry::new("red shoe", "Shoes"),
            CatalogEntry::new("Red Shoe Deluxe", "Shoes"),
        ]);
        let found = engine.search("red shoe").unwrap();
        assert_eq!(found.results.len(), 1);
        assert_eq!(found.results[0].index, 0);
        assert_eq!(found.results[0].title, "Red Shoe");
        assert_eq!(found.results[0].match_score, 2);
    }

    #[test]
    fn test_exact_match_still_recommends() {
        let engine = engine(vec![
            CatalogEntry::new("Red Shoe", "Shoes"),
            CatalogEntry::new("Trail Runner", "Running Shoes").with_review("excellent"),
            CatalogEntry::new("Wool Hat", "Hats"),
        ]);
        let found = engine.search("RED SHOE").unwrap();
        let titles: Vec<&str> = found.recommendations.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Trail Runner", "Red Shoe"]);
        assert!(found.recommendations.iter().all(|p| p.match_score == 0));
    }

    #[test]
    fn test_ranking_by_score_then_sentiment() {
        let engine = engine(vec![
            CatalogEntry::new("Blue Shoe", "Shoes").with_review("terrible"),
            CatalogEntry::new("Blue Running Shoe", "Shoes").with_review("okay"),
            CatalogEntry::new("Green Shoe", "Shoes").with_review("great"),
            CatalogEntry::new("Wool Hat", "Hats").with_review("great"),
        ]);
        let found = engine.search("running shoe").unwrap();
        let titles: Vec<&str> = found.results.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Blue Running Shoe", "Green Shoe", "Blue Shoe"]);
        assert_eq!(found.results[0].match_score, 2);
        assert_eq!(found.results[1].match_score, 1);
    }

    #[test]
    fn test_equal_keys_keep_catalog_order() {
        let engine = engine(vec![
            CatalogEntry::new("Shoe A", "Shoes"),
            CatalogEntry::new("Shoe B", "Shoes"),
            CatalogEntry::new("Shoe C", "Shoes"),
        ]);
        let found = engine.search("shoe").unwrap();
        let indices: Vec<usize> = found.results.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_whole_word_candidate_without_token_overlap() {
        let engine = engine(vec![
            CatalogEntry::new("All About the Hat", "Books"),
            CatalogEntry::new("Theme Park Map", "Maps"),
        ]);
        // "the" is a stop word: no lexical overlap, but a whole-word hit
        let found = engine.search("the").unwrap();
        assert_eq!(found.results.len(), 1);
        assert_eq!(found.results[0].title, "All About the Hat");
        assert_eq!(found.results[0].match_score, 0);
    }

    #[test]
    fn test_results_capped() {
        let engine = engine((0..8).map(|i| CatalogEntry::new(format!("Lamp {}", i), "Home")).collect());
        let found = engine.search("lamp").unwrap();
        assert_eq!(found.results.len(), 5);
        assert_eq!(found.recommendations.len(), 5);
    }

    #[test]
    fn test_no_match_is_empty_result() {
        let engine = engine(vec![CatalogEntry::new("Red Shoe", "Shoes")]);
        let err = engine.search("laptop").unwrap_err();
        assert!(err.is_empty_result());
    }

    #[test]
    fn test_blank_query_rejected() {
        let engine = engine(vec![CatalogEntry::new("Red Shoe", "Shoes")]);
        assert!(engine.search("").unwrap_err().is_invalid_input());
        assert!(engine.search("   ").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_empty_catalog() {
        let engine = engine(Vec::new());
        assert!(engine.search("shoe").unwrap_err().is_empty_result());
    }

    #[test]
    fn test_recommend_by_sentiment_only() {
        let engine = engine(vec![
            CatalogEntry::new("Sad Boot", "Shoes").with_review("awful"),
            CatalogEntry::new("Glad Boot", "Clothing, Shoes & Jewelry").with_review("love it"),
            CatalogEntry::new("Plain Boot", "shoes"),
            CatalogEntry::new("Cap", "Hats").with_review("love it"),
        ]);
        let picks = engine.recommend("Shoes");
        let titles: Vec<&str> = picks.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Glad Boot", "Plain Boot", "Sad Boot"]);
        assert!(picks[0].sentiment_score > 0.0);
        assert_eq!(picks[1].sentiment_score, 0.0);
    }

    #[test]
    fn test_recommend_agrees_with_category_contains() {
        let entries = vec![
            CatalogEntry::new("Trail Runner", "Sports & Outdoors, Running Shoes"),
            CatalogEntry::new("Sandal", "SHOES"),
            CatalogEntry::new("Shoehorn", "Home, Shoe Care"),
            CatalogEntry::new("Cap", "Hats"),
        ];
        let engine = engine(entries.clone());
        for category in ["  Shoes ", "shoe", "Running Shoes", "hats"] {
            let picked: AHashSet<usize> = engine.recommend(category).iter().map(|p| p.index).collect();
            let expected: AHashSet<usize> = entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| category_contains(&entry.category, category.trim()))
                .map(|(index, _)| index)
                .collect();
            assert_eq!(picked, expected, "category {:?}", category);
        }
        assert_eq!(engine.recommend("  Shoes ").len(), 2);
    }

    #[test]
    fn test_zero_limits_rejected() {
        let catalog = Arc::new(vec![CatalogEntry::new("Lamp", "Home")].into_iter().collect::<Catalog>());
        let analyzer = SentimentAnalyzer::new();
        for config in [
            EngineConfig { max_results: 0, ..Default::default() },
            EngineConfig { max_recommendations: 0, ..Default::default() },
        ] {
            let result = RankedSearchEngine::new(catalog.clone(), &analyzer, &config);
            assert!(matches!(result, Err(SearchError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_blank_category_recommends_nothing() {
        let engine = engine(vec![CatalogEntry::new("Mystery Box", ""), CatalogEntry::new("Lamp", "Home")]);
        assert!(engine.recommend("").is_empty());
        let found = engine.search("mystery box").unwrap();
        assert!(found.recommendations.is_empty());
    }

    #[test]
    fn test_missing_image_uses_placeholder() {
        let engine = engine(vec![CatalogEntry::new("Lamp", "Home")]);
        let found = engine.search("lamp").unwrap();
        assert_eq!(found.results[0].image_url, shopmatch_core::PLACEHOLDER_IMAGE);
    }
}
