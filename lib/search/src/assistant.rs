//! The shopping assistant: every query surface behind one handle

use crate::config::EngineConfig;
use crate::image_search::{ImageProvider, ImageSearchEngine, MatchResult};
use crate::ranked::{RankedProduct, RankedSearchEngine, TextSearchResults};
use crate::voice::{transcribe_query, Transcriber};
use crate::Result;
use image::GrayImage;
use shopmatch_core::{Catalog, IntentReplies, OrderBook, OrderRecord, SentimentAnalyzer};
use std::sync::Arc;
use tracing::info;

/// Text, image and voice search plus order and FAQ lookup over one catalog
pub struct Assistant {
    catalog: Arc<Catalog>,
    text: RankedSearchEngine,
    images: ImageSearchEngine,
    orders: OrderBook,
    faq: IntentReplies,
}

impl Assistant {
    pub fn new(catalog: Catalog, provider: Arc<dyn ImageProvider>, config: &EngineConfig) -> Result<Self> {
        Self::with_analyzer(catalog, provider, config, &SentimentAnalyzer::new())
    }

    pub fn with_analyzer(
        catalog: Catalog,
        provider: Arc<dyn ImageProvider>,
        config: &EngineConfig,
        analyzer: &SentimentAnalyzer,
    ) -> Result<Self> {
        let catalog = Arc::new(catalog);
        let images = ImageSearchEngine::new(catalog.clone(), provider, config)?;
        let text = RankedSearchEngine::new(catalog.clone(), analyzer, config)?;
        info!("Assistant ready with {} catalog entries", catalog.len());
        Ok(Self {
            catalog,
            text,
            images,
            orders: OrderBook::default(),
            faq: IntentReplies::default(),
        })
    }

    #[inline]
    #[must_use]
    pub fn with_orders(mut self, orders: OrderBook) -> Self {
        self.orders = orders;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_faq(mut self, faq: IntentReplies) -> Self {
        self.faq = faq;
        self
    }

    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    pub fn text_engine(&self) -> &RankedSearchEngine {
        &self.text
    }

    #[inline]
    pub fn image_engine(&self) -> &ImageSearchEngine {
        &self.images
    }

    pub fn search_by_text(&self, query: &str) -> Result<TextSearchResults> {
        self.text.search(query)
    }

    pub fn search_by_image(&self, image: &GrayImage) -> Result<Vec<MatchResult>> {
        self.images.search(image)
    }

    pub fn search_by_image_bytes(&self, bytes: &[u8]) -> Result<Vec<MatchResult>> {
        self.images.search_bytes(bytes)
    }

    /// Transcribe `audio` and run the transcript as a text query
    pub fn search_by_voice(&self, transcriber: &dyn Transcriber, audio: &[u8]) -> Result<TextSearchResults> {
        let query = transcribe_query(transcriber, audio)?;
        info!("Voice query transcribed as {:?}", query);
        self.text.search(&query)
    }

    pub fn recommend(&self, category: &str) -> Vec<RankedProduct> {
        self.text.recommend(category)
    }

    /// `Ok(None)` when no order has that number
    pub fn order_status(&self, order_no: &str) -> Result<Option<&OrderRecord>> {
        Ok(self.orders.find(order_no)?)
    }

    /// Canned reply for a known question, `Ok(None)` otherwise
    pub fn faq_reply(&self, question: &str) -> Result<Option<&str>> {
        Ok(self.faq.reply(question)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_search::InMemoryImageProvider;
    use crate::voice::TranscriptionError;
    use shopmatch_core::CatalogEntry;

    struct Echo;

    impl Transcriber for Echo {
        fn transcribe(&self, audio: &[u8]) -> std::result::Result<String, TranscriptionError> {
            String::from_utf8(audio.to_vec()).map_err(|e| TranscriptionError::Service(e.to_string()))
        }
    }

    fn assistant() -> Assistant {
        let catalog: Catalog = vec![
            CatalogEntry::new("Red Shoe", "Shoes").with_review("great"),
            CatalogEntry::new("Wool Hat", "Hats"),
        ]
        .into_iter()
        .collect();
        let orders = OrderBook::from_csv_reader("order_no,status\n1001,Shipped\n".as_bytes()).unwrap();
        let faq = IntentReplies::from_json_str(r#"{"Hello": "Hi! How can I help?"}"#).unwrap();
        Assistant::new(catalog, Arc::new(InMemoryImageProvider::new()), &EngineConfig::default())
            .unwrap()
            .with_orders(orders)
            .with_faq(faq)
    }

    #[test]
    fn test_text_and_voice_agree() {
        let assistant = assistant();
        let typed = assistant.search_by_text("red shoe").unwrap();
        let spoken = assistant.search_by_voice(&Echo, b"red shoe").unwrap();
        assert_eq!(typed, spoken);
    }

    #[test]
    fn test_order_status() {
        let assistant = assistant();
        let order = assistant.order_status("1001").unwrap().unwrap();
        assert_eq!(order.get("status"), Some("Shipped"));
        assert!(assistant.order_status("9999").unwrap().is_none());
        assert!(assistant.order_status(" ").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_faq() {
        let assistant = assistant();
        assert_eq!(assistant.faq_reply("hello").unwrap(), Some("Hi! How can I help?"));
        assert_eq!(assistant.faq_reply("refund?").unwrap(), None);
        assert!(assistant.faq_reply("").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_image_search_without_images() {
        let assistant = assistant();
        let query = GrayImage::from_pixel(32, 32, image::Luma([10]));
        assert!(assistant.search_by_image(&query).unwrap_err().is_empty_result());
    }
}
