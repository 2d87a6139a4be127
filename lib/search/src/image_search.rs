//! Search the catalog by example image
//!
//! Catalog images are fetched through an [`ImageProvider`], reduced to
//! descriptor sets once, and kept in a [`DescriptorCache`] for the life of
//! the engine. Each query scores every entry with a resolvable image and
//! keeps those strictly above the acceptance threshold.

use crate::config::EngineConfig;
use crate::{Result, SearchError};
use ahash::AHashMap;
use image::GrayImage;
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shopmatch_core::{Catalog, CatalogEntry};
use shopmatch_vision::{decode_gray, open_gray, MatchTarget, OrbExtractor, SimilarityMatcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Source of stored catalog images
pub trait ImageProvider: Send + Sync {
    /// `Ok(None)` when the entry has no stored image; `Err` when one exists
    /// but cannot be read or decoded.
    fn load(&self, index: usize, entry: &CatalogEntry) -> shopmatch_vision::Result<Option<GrayImage>>;
}

/// Images stored as files named by [`CatalogEntry::image_file_name`]
#[derive(Debug, Clone)]
pub struct DirectoryImageProvider {
    root: PathBuf,
}

impl DirectoryImageProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, entry: &CatalogEntry) -> PathBuf {
        self.root.join(entry.image_file_name())
    }
}

impl ImageProvider for DirectoryImageProvider {
    fn load(&self, _index: usize, entry: &CatalogEntry) -> shopmatch_vision::Result<Option<GrayImage>> {
        let path = self.path_for(entry);
        if !path.is_file() {
            return Ok(None);
        }
        open_gray(&path).map(Some)
    }
}

/// Images held in memory, keyed by catalog position
#[derive(Debug, Clone, Default)]
pub struct InMemoryImageProvider {
    images: AHashMap<usize, Arc<GrayImage>>,
}

impl InMemoryImageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_image(mut self, index: usize, image: GrayImage) -> Self {
        self.images.insert(index, Arc::new(image));
        self
    }

    pub fn insert(&mut self, index: usize, image: GrayImage) {
        self.images.insert(index, Arc::new(image));
    }
}

impl ImageProvider for InMemoryImageProvider {
    fn load(&self, index: usize, _entry: &CatalogEntry) -> shopmatch_vision::Result<Option<GrayImage>> {
        Ok(self.images.get(&index).map(|image| image.as_ref().clone()))
    }
}

type Slot = Arc<OnceLock<Option<Arc<MatchTarget>>>>;

/// Per-entry descriptor cache, filled lazily and at most once per entry
///
/// Concurrent queries asking for the same entry block on a single
/// extraction instead of repeating it. A `None` slot records that the entry
/// has no usable image.
#[derive(Default)]
pub struct DescriptorCache {
    slots: RwLock<AHashMap<usize, Slot>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<F>(&self, index: usize, compute: F) -> Option<Arc<MatchTarget>>
    where
        F: FnOnce() -> Option<MatchTarget>,
    {
        let slot = self.slot(index);
        slot.get_or_init(|| compute().map(Arc::new)).clone()
    }

    /// Cached value, without computing; `Some(None)` means "known to have no image"
    pub fn get(&self, index: usize) -> Option<Option<Arc<MatchTarget>>> {
        let slots = self.slots.read();
        slots.get(&index).and_then(|slot| slot.get().cloned())
    }

    /// Number of entries resolved so far, with or without an image
    pub fn len(&self) -> usize {
        self.slots.read().values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, index: usize) -> Slot {
        if let Some(slot) = self.slots.read().get(&index) {
            return slot.clone();
        }
        self.slots.write().entry(index).or_default().clone()
    }
}

/// A catalog entry accepted by image search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Position in the catalog
    pub index: usize,
    pub title: String,
    pub url: String,
    pub price: String,
    pub top_review: Option<String>,
    pub image_url: String,
    /// Number of good descriptor matches against the query
    pub similarity_score: u32,
}

impl MatchResult {
    fn from_entry(index: usize, entry: &CatalogEntry, similarity_score: u32) -> Self {
        Self {
            index,
            title: entry.title.clone(),
            url: entry.url.clone(),
            price: entry.price.clone(),
            top_review: entry.top_review.clone(),
            image_url: entry.display_image_url().to_string(),
            similarity_score,
        }
    }
}

/// Keep scores strictly above `threshold`, best first, lower index first on
/// ties, at most `limit` of them
pub fn select_matches(mut scored: Vec<(usize, u32)>, threshold: u32, limit: usize) -> Vec<(usize, u32)> {
    scored.retain(|&(_, score)| score > threshold);
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(limit);
    scored
}

/// Image similarity search over a fixed catalog
pub struct ImageSearchEngine {
    catalog: Arc<Catalog>,
    provider: Arc<dyn ImageProvider>,
    extractor: OrbExtractor,
    matcher: SimilarityMatcher,
    cache: DescriptorCache,
    acceptance_threshold: u32,
    max_results: usize,
}

impl ImageSearchEngine {
    pub fn new(catalog: Arc<Catalog>, provider: Arc<dyn ImageProvider>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            provider,
            extractor: OrbExtractor::new(config.extractor.clone())?,
            matcher: SimilarityMatcher::new(config.matcher.clone())?,
            cache: DescriptorCache::new(),
            acceptance_threshold: config.acceptance_threshold,
            max_results: config.max_results,
        })
    }

    #[inline]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[inline]
    pub fn cache(&self) -> &DescriptorCache {
        &self.cache
    }

    /// Extract and cache descriptors for every catalog image up front
    ///
    /// Returns the number of entries with a usable image.
    pub fn warm_cache(&self) -> usize {
        let ready = (0..self.catalog.len())
            .into_par_iter()
            .filter(|&index| self.target(index).is_some())
            .count();
        info!("Descriptor cache warmed: {} of {} entries have images", ready, self.catalog.len());
        ready
    }

    /// Decode encoded image bytes and search with them
    pub fn search_bytes(&self, bytes: &[u8]) -> Result<Vec<MatchResult>> {
        if bytes.is_empty() {
            return Err(SearchError::InvalidInput("No image provided".to_string()));
        }
        let image = decode_gray(bytes)?;
        self.search(&image)
    }

    /// Rank catalog entries by visual similarity to `query`
    ///
    /// Entries without an image, or whose image cannot be decoded, are
    /// skipped. Returns `SearchError::EmptyResult` when no entry scores above
    /// the acceptance threshold.
    pub fn search(&self, query: &GrayImage) -> Result<Vec<MatchResult>> {
        if query.width() == 0 || query.height() == 0 {
            return Err(SearchError::InvalidInput("No image provided".to_string()));
        }
        if self.catalog.is_empty() {
            return Err(SearchError::EmptyResult("No matching products found".to_string()));
        }

        let query = self.extractor.extract(query);
        debug!("Query image yielded {} descriptors", query.len());

        let scored: Vec<(usize, u32)> = (0..self.catalog.len())
            .into_par_iter()
            .filter_map(|index| {
                let target = self.target(index)?;
                Some((index, self.matcher.similarity(&query, &target)))
            })
            .collect();

        let selected = select_matches(scored, self.acceptance_threshold, self.max_results);
        if selected.is_empty() {
            return Err(SearchError::EmptyResult("No matching products found".to_string()));
        }

        Ok(selected
            .into_iter()
            .map(|(index, score)| MatchResult::from_entry(index, &self.catalog.entries()[index], score))
            .collect())
    }

    fn target(&self, index: usize) -> Option<Arc<MatchTarget>> {
        let entry = self.catalog.get(index)?;
        self.cache.get_or_compute(index, || match self.provider.load(index, entry) {
            Ok(Some(image)) => {
                let descriptors = self.extractor.extract(&image);
                match self.matcher.prepare(descriptors) {
                    Ok(target) => Some(target),
                    Err(e) => {
                        warn!("Cannot index descriptors for {:?}: {}", entry.title, e);
                        None
                    }
                }
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Skipping image for {:?}: {}", entry.title, e);
                None
            }
        })
    }
}
