//! # shopmatch Core
//!
//! Core data model for the shopmatch product assistant.
//!
//! This crate provides the read-only data sources and text primitives:
//!
//! - [`Catalog`] - Ordered, immutable product catalog loaded from CSV
//! - [`CatalogEntry`] - A product with explicitly optional fields
//! - [`OrderBook`] - Order status lookup by order number
//! - [`IntentReplies`] - Canned FAQ replies
//! - [`tokenize`] - Stop-word filtered tokenizer for lexical matching
//! - [`SentimentAnalyzer`] - VADER compound sentiment scores
//!
//! ## Example
//!
//! ```rust
//! use shopmatch_core::{Catalog, CatalogEntry, SentimentAnalyzer, tokenize};
//!
//! let catalog: Catalog = vec![
//!     CatalogEntry::new("Red Running Shoe", "Shoes").with_review("Great grip,comfortable"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let analyzer = SentimentAnalyzer::new();
//! let entry = catalog.get(0).unwrap();
//! let score = analyzer.review_score(entry.top_review.as_deref());
//! assert!(score > 0.0);
//! assert_eq!(tokenize("the red shoe"), vec!["red", "shoe"]);
//! ```

pub mod catalog;
pub mod error;
pub mod faq;
pub mod orders;
pub mod sentiment;
pub mod text;

pub use catalog::{Catalog, CatalogEntry, PLACEHOLDER_IMAGE};
pub use error::{Error, Result};
pub use faq::IntentReplies;
pub use orders::{OrderBook, OrderRecord, ORDER_NO_COLUMN};
pub use sentiment::SentimentAnalyzer;
pub use text::{is_stop_word, token_set, tokenize};
