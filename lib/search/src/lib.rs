//! # shopmatch Search
//!
//! Search engines over a fixed product catalog.
//!
//! - [`ImageSearchEngine`] - Query by example image, thresholded on match count
//! - [`RankedSearchEngine`] - Query by text, ranked by lexical overlap then sentiment
//! - [`Assistant`] - Text, image and voice search plus order and FAQ lookup
//!
//! Searches that find nothing return [`SearchError::EmptyResult`]; callers
//! should treat it as "no results" rather than a failure.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use shopmatch_core::{Catalog, CatalogEntry};
//! use shopmatch_search::{Assistant, EngineConfig, InMemoryImageProvider};
//!
//! let catalog: Catalog = vec![
//!     CatalogEntry::new("Red Running Shoe", "Shoes").with_review("Great grip,comfortable"),
//!     CatalogEntry::new("Blue Shoe", "Shoes").with_review("Fell apart"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let assistant = Assistant::new(catalog, Arc::new(InMemoryImageProvider::new()), &EngineConfig::default()).unwrap();
//! let found = assistant.search_by_text("running shoe").unwrap();
//! assert_eq!(found.results[0].title, "Red Running Shoe");
//! assert_eq!(found.recommendations.len(), 2);
//! ```

pub mod assistant;
pub mod config;
pub mod error;
pub mod image_search;
pub mod lexical;
pub mod ranked;
pub mod voice;

pub use assistant::Assistant;
pub use config::EngineConfig;
pub use error::{Result, SearchError};
pub use image_search::{
    select_matches, DescriptorCache, DirectoryImageProvider, ImageProvider, ImageSearchEngine,
    InMemoryImageProvider, MatchResult,
};
pub use lexical::{category_contains, is_exact_title, lexical_score, WholeWordMatcher};
pub use ranked::{RankedProduct, RankedSearchEngine, TextSearchResults};
pub use voice::{transcribe_query, Transcriber, TranscriptionError};

#[cfg(test)]
pub(crate) mod testing {
    use image::{GrayImage, Luma};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    /// Random 8x8 blocks: plenty of corners, no repeated structure
    pub(crate) fn textured_image(width: u32, height: u32, seed: u64) -> GrayImage {
        let mut rng = StdRng::seed_from_u64(seed);
        let blocks: Vec<u8> = (0..width.div_ceil(8) * height.div_ceil(8))
            .map(|_| rng.random())
            .collect();
        let stride = width.div_ceil(8);
        GrayImage::from_fn(width, height, |x, y| Luma([blocks[((y / 8) * stride + x / 8) as usize]]))
    }
}
