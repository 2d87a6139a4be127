use crate::descriptor::{Descriptor, DESCRIPTOR_BITS};
use crate::{Result, VisionError};
use ahash::AHashMap;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Multi-probe LSH parameters for binary descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LshParams {
    /// Number of hash tables
    pub table_number: usize,
    /// Bits sampled from the descriptor per table key
    pub key_size: usize,
    /// Also probe buckets whose key differs in up to this many bits
    pub multi_probe_level: usize,
    /// Seed for bit selection, fixed so results are reproducible
    pub seed: u64,
}

impl Default for LshParams {
    fn default() -> Self {
        Self {
            table_number: 6,
            key_size: 12,
            multi_probe_level: 1,
            seed: 42,
        }
    }
}

impl LshParams {
    pub fn validate(&self) -> Result<()> {
        if self.table_number == 0 {
            return Err(VisionError::InvalidConfig("table_number must be positive".to_string()));
        }
        if self.key_size == 0 || self.key_size > 32 {
            return Err(VisionError::InvalidConfig(format!(
                "key_size must be in 1..=32, got {}",
                self.key_size
            )));
        }
        if self.multi_probe_level > 2 {
            return Err(VisionError::InvalidConfig(format!(
                "multi_probe_level must be at most 2, got {}",
                self.multi_probe_level
            )));
        }
        Ok(())
    }
}

/// Fast bit vector for visited tracking, cleared in O(1) between queries
#[derive(Clone)]
pub(crate) struct VisitedSet {
    bits: Vec<u64>,
    generation: u64,
    generations: Vec<u64>,
}

impl VisitedSet {
    #[inline]
    pub(crate) fn new(capacity: usize) -> Self {
        let num_words = (capacity + 63) / 64;
        Self {
            bits: vec![0; num_words],
            generation: 1,
            generations: vec![0; num_words],
        }
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.generation += 1;
        // Only reset if we've wrapped around
        if self.generation == 0 {
            self.generation = 1;
            self.bits.fill(0);
            self.generations.fill(0);
        }
    }

    /// Mark `idx`; returns true if it was not yet visited
    #[inline]
    pub(crate) fn insert(&mut self, idx: usize) -> bool {
        let word_idx = idx / 64;
        let mask = 1u64 << (idx % 64);

        if word_idx >= self.bits.len() {
            self.bits.resize(word_idx + 1, 0);
            self.generations.resize(word_idx + 1, 0);
        }

        if self.generations[word_idx] != self.generation {
            self.bits[word_idx] = 0;
            self.generations[word_idx] = self.generation;
        }

        let was_set = (self.bits[word_idx] & mask) != 0;
        self.bits[word_idx] |= mask;
        !was_set
    }
}

/// A neighbor of a query descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub idx: usize,
    pub distance: u32,
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: furthest first, later index first among equals
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.idx.cmp(&other.idx))
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Keeps the `k` closest neighbors seen so far
pub(crate) struct NeighborHeap {
    k: usize,
    heap: BinaryHeap<Neighbor>,
}

impl NeighborHeap {
    pub(crate) fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, candidate: Neighbor) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(worst) = self.heap.peek() {
            if candidate < *worst {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }

    /// Neighbors sorted closest first
    pub(crate) fn into_sorted(self) -> Vec<Neighbor> {
        self.heap.into_sorted_vec()
    }
}

#[derive(Debug, Clone)]
struct LshTable {
    bits: Vec<u16>,
    buckets: AHashMap<u32, Vec<u32>>,
}

impl LshTable {
    #[inline]
    fn key(&self, descriptor: &Descriptor) -> u32 {
        self.bits
            .iter()
            .enumerate()
            .fold(0u32, |key, (i, &bit)| {
                if descriptor.bit(bit as usize) {
                    key | (1u32 << i)
                } else {
                    key
                }
            })
    }
}

/// Multi-probe locality-sensitive hashing index over binary descriptors
///
/// Each table hashes a descriptor by a fixed random subset of its bits, so
/// descriptors at a small Hamming distance tend to share a bucket. Probing
/// neighboring keys trades a few more distance computations for recall.
#[derive(Debug, Clone)]
pub struct LshIndex {
    tables: Vec<LshTable>,
    probe_masks: SmallVec<[u32; 16]>,
    len: usize,
}

impl LshIndex {
    pub fn build(descriptors: &[Descriptor], params: &LshParams) -> Result<Self> {
        params.validate()?;
        let mut rng = StdRng::seed_from_u64(params.seed);

        let tables = (0..params.table_number)
            .map(|_| {
                let bits: Vec<u16> =
                    rand::seq::index::sample(&mut rng, DESCRIPTOR_BITS, params.key_size)
                        .into_iter()
                        .map(|b| b as u16)
                        .collect();
                let mut table = LshTable {
                    bits,
                    buckets: AHashMap::new(),
                };
                for (idx, descriptor) in descriptors.iter().enumerate() {
                    let key = table.key(descriptor);
                    table.buckets.entry(key).or_default().push(idx as u32);
                }
                table
            })
            .collect();

        Ok(Self {
            tables,
            probe_masks: probe_masks(params.key_size, params.multi_probe_level),
            len: descriptors.len(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Approximate `k` nearest neighbors of `query` among `data`
    ///
    /// `data` must be the slice the index was built from. May return fewer
    /// than `k` neighbors when the probed buckets are sparse.
    pub fn knn(&self, query: &Descriptor, data: &[Descriptor], k: usize) -> Vec<Neighbor> {
        let mut visited = VisitedSet::new(self.len);
        self.knn_with(query, data, k, &mut visited)
    }

    pub(crate) fn knn_with(
        &self,
        query: &Descriptor,
        data: &[Descriptor],
        k: usize,
        visited: &mut VisitedSet,
    ) -> Vec<Neighbor> {
        visited.clear();
        let mut heap = NeighborHeap::new(k);

        for table in &self.tables {
            let key = table.key(query);
            for mask in &self.probe_masks {
                let Some(bucket) = table.buckets.get(&(key ^ mask)) else {
                    continue;
                };
                for &idx in bucket {
                    let idx = idx as usize;
                    if !visited.insert(idx) {
                        continue;
                    }
                    if let Some(candidate) = data.get(idx) {
                        heap.push(Neighbor {
                            idx,
                            distance: query.hamming(candidate),
                        });
                    }
                }
            }
        }

        heap.into_sorted()
    }
}

/// XOR masks for the exact key plus every key within `level` flipped bits
fn probe_masks(key_size: usize, level: usize) -> SmallVec<[u32; 16]> {
    let mut masks: SmallVec<[u32; 16]> = SmallVec::new();
    masks.push(0);
    let mut frontier: Vec<(u32, usize)> = vec![(0, 0)];
    for _ in 0..level {
        let mut next = Vec::new();
        for (mask, start) in frontier {
            for bit in start..key_size {
                let flipped = mask | (1u32 << bit);
                masks.push(flipped);
                next.push((flipped, bit + 1));
            }
        }
        frontier = next;
    }
    masks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_descriptors(n: usize, seed: u64) -> Vec<Descriptor> {
        use rand::Rng;
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| Descriptor::from_words([rng.random(), rng.random(), rng.random(), rng.random()]))
            .collect()
    }

    #[test]
    fn test_probe_masks() {
        assert_eq!(probe_masks(12, 0).len(), 1);
        assert_eq!(probe_masks(12, 1).len(), 1 + 12);
        assert_eq!(probe_masks(12, 2).len(), 1 + 12 + 66);
    }

    #[test]
    fn test_exact_member_is_found() {
        let data = random_descriptors(300, 1);
        let index = LshIndex::build(&data, &LshParams::default()).unwrap();
        for (i, d) in data.iter().enumerate().step_by(17) {
            let neighbors = index.knn(d, &data, 2);
            assert_eq!(neighbors[0], Neighbor { idx: i, distance: 0 });
        }
    }

    #[test]
    fn test_near_duplicate_is_found() {
        let data = random_descriptors(200, 2);
        let index = LshIndex::build(&data, &LshParams::default()).unwrap();
        let mut query = data[50];
        query.set_bit(3); // at most one flipped bit
        let neighbors = index.knn(&query, &data, 1);
        assert_eq!(neighbors[0].idx, 50);
        assert!(neighbors[0].distance <= 1);
    }

    #[test]
    fn test_neighbors_sorted() {
        let data = random_descriptors(500, 3);
        let params = LshParams { multi_probe_level: 2, ..LshParams::default() };
        let index = LshIndex::build(&data, &params).unwrap();
        let neighbors = index.knn(&data[0], &data, 5);
        for pair in neighbors.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_invalid_params() {
        let params = LshParams { key_size: 0, ..LshParams::default() };
        assert!(LshIndex::build(&[], &params).is_err());
        let params = LshParams { table_number: 0, ..LshParams::default() };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_visited_set() {
        let mut vs = VisitedSet::new(100);
        assert!(vs.insert(5));
        assert!(!vs.insert(5));
        vs.clear();
        assert!(vs.insert(5));
        // grows on demand
        assert!(vs.insert(1000));
    }

    #[test]
    fn test_neighbor_heap_keeps_closest() {
        let mut heap = NeighborHeap::new(2);
        for (idx, distance) in [(0, 9), (1, 3), (2, 7), (3, 3), (4, 1)] {
            heap.push(Neighbor { idx, distance });
        }
        let sorted = heap.into_sorted();
        assert_eq!(sorted, vec![Neighbor { idx: 4, distance: 1 }, Neighbor { idx: 1, distance: 3 }]);
    }
}
