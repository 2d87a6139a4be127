//! Descriptor set similarity via 2-NN matching and Lowe's ratio test
//!
//! For each query descriptor the two nearest candidate descriptors are found
//! by Hamming distance (LSH when the candidate set is large, brute force
//! otherwise). The match is kept only if the nearest is clearly closer than
//! the runner-up: `d1 < ratio * d2`. The similarity score is the number of
//! kept matches; it is an open-ended count, not a value in [0, 1].

use crate::descriptor::{Descriptor, DescriptorSet};
use crate::lsh::{LshIndex, LshParams, Neighbor, NeighborHeap, VisitedSet};
use crate::{Result, VisionError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Lowe ratio; a match is accepted iff `d1 < ratio * d2`
    pub ratio: f32,
    pub lsh: LshParams,
    /// Candidate sets smaller than this are matched by brute force
    pub min_candidates_for_index: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            ratio: 0.7,
            lsh: LshParams::default(),
            min_candidates_for_index: 64,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.ratio > 0.0 && self.ratio <= 1.0) {
            return Err(VisionError::InvalidConfig(format!(
                "ratio must be in (0, 1], got {}",
                self.ratio
            )));
        }
        self.lsh.validate()
    }
}

/// An accepted correspondence between a query and a candidate descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: u32,
}

/// Candidate descriptor set prepared for repeated matching
///
/// Holds the LSH index alongside the descriptors so a cached catalog image is
/// indexed once, not once per query.
#[derive(Debug, Clone)]
pub struct MatchTarget {
    descriptors: DescriptorSet,
    index: Option<LshIndex>,
}

impl MatchTarget {
    pub fn new(descriptors: DescriptorSet, config: &MatcherConfig) -> Result<Self> {
        let index = if descriptors.len() >= config.min_candidates_for_index.max(2) {
            Some(LshIndex::build(descriptors.descriptors(), &config.lsh)?)
        } else {
            None
        };
        Ok(Self { descriptors, index })
    }

    #[inline]
    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Counts ratio-test matches between descriptor sets
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatcher {
    config: MatcherConfig,
}

impl SimilarityMatcher {
    pub fn new(config: MatcherConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Prepare a candidate set using this matcher's index settings
    pub fn prepare(&self, descriptors: DescriptorSet) -> Result<MatchTarget> {
        MatchTarget::new(descriptors, &self.config)
    }

    /// Two nearest neighbors for every query descriptor, closest first
    ///
    /// Falls back to an exact scan for a query whose LSH probes surface fewer
    /// than two candidates.
    pub fn knn_match(&self, query: &DescriptorSet, target: &MatchTarget) -> Vec<Vec<Neighbor>> {
        let train = target.descriptors.descriptors();
        if query.is_empty() || train.is_empty() {
            return Vec::new();
        }

        let mut visited = VisitedSet::new(train.len());
        query
            .descriptors()
            .iter()
            .map(|descriptor| {
                let approximate = target
                    .index
                    .as_ref()
                    .map(|index| index.knn_with(descriptor, train, 2, &mut visited));
                match approximate {
                    Some(neighbors) if neighbors.len() >= 2 => neighbors,
                    _ => brute_force_knn(descriptor, train, 2),
                }
            })
            .collect()
    }

    /// Matches that pass the ratio test, in query order
    pub fn good_matches(&self, query: &DescriptorSet, target: &MatchTarget) -> Vec<Match> {
        self.knn_match(query, target)
            .into_iter()
            .enumerate()
            .filter_map(|(query_idx, neighbors)| match neighbors.as_slice() {
                [best, second, ..] if passes_ratio(best.distance, second.distance, self.config.ratio) => {
                    Some(Match {
                        query_idx,
                        train_idx: best.idx,
                        distance: best.distance,
                    })
                }
                // A lone neighbor cannot be disambiguated
                _ => None,
            })
            .collect()
    }

    /// Similarity score: number of good matches (0 if either set is empty)
    pub fn similarity(&self, query: &DescriptorSet, target: &MatchTarget) -> u32 {
        self.good_matches(query, target).len() as u32
    }

    /// Similarity between two raw sets; indexes `candidate` on the fly
    pub fn similarity_sets(&self, query: &DescriptorSet, candidate: &DescriptorSet) -> Result<u32> {
        if query.is_empty() || candidate.is_empty() {
            return Ok(0);
        }
        let target = self.prepare(candidate.clone())?;
        Ok(self.similarity(query, &target))
    }
}

#[inline]
fn passes_ratio(best: u32, second: u32, ratio: f32) -> bool {
    (best as f32) < ratio * second as f32
}

fn brute_force_knn(query: &Descriptor, train: &[Descriptor], k: usize) -> Vec<Neighbor> {
    let mut heap = NeighborHeap::new(k);
    for (idx, candidate) in train.iter().enumerate() {
        heap.push(Neighbor {
            idx,
            distance: query.hamming(candidate),
        });
    }
    heap.into_sorted()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orb::OrbExtractor;
    use crate::testing::textured_image;

    fn descriptor_with_bits(n: usize) -> Descriptor {
        let mut d = Descriptor::default();
        for bit in 0..n {
            d.set_bit(bit);
        }
        d
    }

    #[test]
    fn test_ratio_boundary() {
        assert!(passes_ratio(6, 10, 0.7));
        assert!(!passes_ratio(7, 10, 0.7));
        assert!(!passes_ratio(0, 0, 0.7));
        assert!(passes_ratio(0, 1, 0.7));
    }

    #[test]
    fn test_empty_sets_score_zero() {
        let matcher = SimilarityMatcher::default();
        let a = DescriptorSet::from_descriptors(vec![descriptor_with_bits(3), descriptor_with_bits(90)]);
        let empty = DescriptorSet::empty();
        assert_eq!(matcher.similarity_sets(&a, &empty).unwrap(), 0);
        assert_eq!(matcher.similarity_sets(&empty, &a).unwrap(), 0);
    }

    #[test]
    fn test_ambiguous_match_rejected() {
        let matcher = SimilarityMatcher::default();
        let query = DescriptorSet::from_descriptors(vec![descriptor_with_bits(10)]);
        // Two candidates at distance 10 and 12 -> 10 < 0.7 * 12 fails
        let candidate = DescriptorSet::from_descriptors(vec![
            descriptor_with_bits(0),
            descriptor_with_bits(22),
        ]);
        assert_eq!(matcher.similarity_sets(&query, &candidate).unwrap(), 0);
    }

    #[test]
    fn test_distinct_match_accepted() {
        let matcher = SimilarityMatcher::default();
        let query = DescriptorSet::from_descriptors(vec![descriptor_with_bits(10)]);
        let candidate = DescriptorSet::from_descriptors(vec![
            descriptor_with_bits(11),
            descriptor_with_bits(200),
        ]);
        let target = matcher.prepare(candidate).unwrap();
        let matches = matcher.good_matches(&query, &target);
        assert_eq!(matches, vec![Match { query_idx: 0, train_idx: 0, distance: 1 }]);
    }

    #[test]
    fn test_single_candidate_never_matches() {
        let matcher = SimilarityMatcher::default();
        let set = DescriptorSet::from_descriptors(vec![descriptor_with_bits(5)]);
        assert_eq!(matcher.similarity_sets(&set, &set).unwrap(), 0);
    }

    #[test]
    fn test_identical_images_exceed_threshold() {
        let extractor = OrbExtractor::default();
        let matcher = SimilarityMatcher::default();
        let image = textured_image(256, 256, 21);
        let set = extractor.extract(&image);
        let target = matcher.prepare(set.clone()).unwrap();
        assert!(target.is_indexed());
        assert!(matcher.similarity(&set, &target) > 50);
    }

    #[test]
    fn test_self_similarity_dominates() {
        let extractor = OrbExtractor::default();
        let matcher = SimilarityMatcher::default();
        let a = extractor.extract(&textured_image(256, 256, 5));
        let b = extractor.extract(&textured_image(256, 256, 6));
        let self_score = matcher.similarity_sets(&a, &a).unwrap();
        let cross_score = matcher.similarity_sets(&a, &b).unwrap();
        assert!(self_score > cross_score, "self {} vs cross {}", self_score, cross_score);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MatcherConfig = serde_json::from_str(r#"{"ratio": 0.8, "lsh": {"key_size": 16}}"#).unwrap();
        assert_eq!(config.ratio, 0.8);
        assert_eq!(config.lsh.key_size, 16);
        assert_eq!(config.lsh.table_number, 6);
        assert_eq!(config.min_candidates_for_index, 64);
    }

    #[test]
    fn test_invalid_ratio() {
        let config = MatcherConfig { ratio: 1.5, ..MatcherConfig::default() };
        assert!(SimilarityMatcher::new(config).is_err());
    }
}
