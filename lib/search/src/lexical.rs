//! Lexical matching predicates for text search
//!
//! All comparisons are case-insensitive. Scores are raw counts, not values
//! normalized to [0, 1].

use ahash::AHashSet;
use regex::Regex;
use shopmatch_core::token_set;

/// Number of distinct non-stop-word tokens shared by `query` and `title`
pub fn lexical_score(query: &str, title: &str) -> usize {
    overlap(&token_set(query), &token_set(title))
}

/// Set intersection size over pre-tokenized sets
#[inline]
pub fn overlap(a: &AHashSet<String>, b: &AHashSet<String>) -> usize {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|token| large.contains(*token)).count()
}

/// Full-string case-insensitive equality
#[inline]
pub fn is_exact_title(query: &str, title: &str) -> bool {
    query.to_lowercase() == title.to_lowercase()
}

/// Whole-word containment of a phrase inside a lowercased title
///
/// The phrase is matched literally between word boundaries, so `"shoe"`
/// matches `"red shoe box"` but not `"shoelace"`.
#[derive(Debug, Clone)]
pub struct WholeWordMatcher {
    pattern: Regex,
}

impl WholeWordMatcher {
    /// Returns `None` if the phrase cannot be compiled (e.g. exceeds the
    /// regex size limit); such a phrase simply never matches.
    pub fn new(phrase: &str) -> Option<Self> {
        let pattern = format!(r"\b{}\b", regex::escape(&phrase.to_lowercase()));
        Regex::new(&pattern).ok().map(|pattern| Self { pattern })
    }

    /// `haystack` must already be lowercased
    #[inline]
    pub fn is_match(&self, haystack: &str) -> bool {
        self.pattern.is_match(haystack)
    }
}

/// Case-insensitive substring containment of a category
///
/// Categories are free text, often several joined by commas, so
/// `"Shoes"` is contained in `"Clothing, Shoes & Jewelry"`.
#[inline]
pub fn category_contains(category_list: &str, category: &str) -> bool {
    category_list.to_lowercase().contains(&category.to_lowercase())
}
