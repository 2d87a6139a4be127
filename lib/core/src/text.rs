// Text normalization shared by lexical scoring and sentiment analysis
use ahash::AHashSet;
use once_cell::sync::Lazy;

/// English stop words (NLTK list, apostrophe forms omitted since the
/// tokenizer splits on apostrophes)
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your",
    "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she", "her",
    "hers", "herself", "it", "its", "itself", "they", "them", "their", "theirs",
    "themselves", "what", "which", "who", "whom", "this", "that", "these", "those",
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if",
    "or", "because", "as", "until", "while", "of", "at", "by", "for", "with",
    "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where",
    "why", "how", "all", "any", "both", "each", "few", "more", "most", "other",
    "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too",
    "very", "s", "t", "can", "will", "just", "don", "should", "now", "d", "ll", "m",
    "o", "re", "ve", "y", "ain", "aren", "couldn", "didn", "doesn", "hadn", "hasn",
    "haven", "isn", "ma", "mightn", "mustn", "needn", "shan", "shouldn", "wasn",
    "weren", "won", "wouldn",
];

static STOP_WORD_SET: Lazy<AHashSet<&'static str>> =
    Lazy::new(|| STOP_WORDS.iter().copied().collect());

#[inline]
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORD_SET.contains(token)
}

/// Tokenize text for lexical matching
///
/// Lowercases, splits on every non-alphanumeric character and drops stop
/// words. Pure and deterministic.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty() && !is_stop_word(s))
        .map(str::to_string)
        .collect()
}

/// Tokens of `text` with duplicates collapsed
pub fn token_set(text: &str) -> AHashSet<String> {
    tokenize(text).into_iter().collect()
}
