//! # shopmatch
//!
//! Product matching core for a shopping assistant.
//!
//! shopmatch finds catalog products from a photo, a typed query or a spoken
//! one, and recommends related products by category and review sentiment.
//!
//! ## Quick Start
//!
//! ### From the Command Line
//!
//! ```bash
//! shopmatch --catalog products.csv search "running shoe"
//! shopmatch --catalog products.csv --images ./images image-search photo.jpg
//! shopmatch --orders orders.csv order-status 1001
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use shopmatch::prelude::*;
//! use std::sync::Arc;
//!
//! let catalog = Catalog::from_csv_path("products.csv").unwrap();
//! let provider = Arc::new(DirectoryImageProvider::new("images"));
//! let assistant = Assistant::new(catalog, provider, &EngineConfig::default()).unwrap();
//!
//! match assistant.search_by_text("running shoe") {
//!     Ok(found) => println!("{} results", found.results.len()),
//!     Err(e) if e.is_empty_result() => println!("No products found"),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `shopmatch-core` - Catalog, orders, FAQ replies, tokenizer, sentiment
//! - `shopmatch-vision` - ORB descriptors, LSH index, ratio-test matcher
//! - `shopmatch-search` - Image search, ranked text search, recommendations
//!
//! ## Features
//!
//! - **Image Search**: ORB descriptors matched with Lowe's ratio test, cached per catalog entry
//! - **Text Search**: Exact-title short-circuit, token overlap and whole-word matching, sentiment tie-break
//! - **Recommendations**: Category containment ranked by review sentiment
//! - **Voice Search**: Pluggable speech-to-text backend feeding text search

// Re-export core types
pub use shopmatch_core::{
    Catalog, CatalogEntry, IntentReplies, OrderBook, OrderRecord, SentimentAnalyzer,
    PLACEHOLDER_IMAGE,
};

// Re-export vision
pub use shopmatch_vision::{DescriptorSet, OrbConfig, OrbExtractor, SimilarityMatcher};

// Re-export search
pub use shopmatch_search::{
    Assistant, DirectoryImageProvider, EngineConfig, ImageProvider, ImageSearchEngine,
    InMemoryImageProvider, MatchResult, RankedProduct, RankedSearchEngine, Result, SearchError,
    TextSearchResults, Transcriber, TranscriptionError,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Assistant, Catalog, CatalogEntry, DirectoryImageProvider, EngineConfig, ImageProvider,
        InMemoryImageProvider, IntentReplies, MatchResult, OrderBook, RankedProduct, Result,
        SearchError, TextSearchResults,
    };
}

/// Lower-level text primitives
pub mod text {
    pub use shopmatch_core::{is_stop_word, token_set, tokenize};
    pub use shopmatch_search::{category_contains, is_exact_title, lexical_score};
}
