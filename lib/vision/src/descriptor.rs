//! Binary keypoint descriptors
//!
//! A descriptor is a 256-bit rotated-BRIEF string packed into four words so
//! the Hamming distance is four XOR + popcount operations.

use serde::{Deserialize, Serialize};

/// Number of bits in a descriptor
pub const DESCRIPTOR_BITS: usize = 256;
/// Number of bytes in a descriptor
pub const DESCRIPTOR_BYTES: usize = DESCRIPTOR_BITS / 8;

const WORDS: usize = DESCRIPTOR_BITS / 64;

/// A 256-bit binary descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Descriptor([u64; WORDS]);

impl Descriptor {
    #[inline]
    #[must_use]
    pub fn from_words(words: [u64; WORDS]) -> Self {
        Self(words)
    }

    /// Build from 32 bytes, little-endian within each word
    #[must_use]
    pub fn from_bytes(bytes: &[u8; DESCRIPTOR_BYTES]) -> Self {
        let mut words = [0u64; WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            *word = u64::from_le_bytes(buf);
        }
        Self(words)
    }

    #[inline]
    pub fn words(&self) -> &[u64; WORDS] {
        &self.0
    }

    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        (self.0[index / 64] >> (index % 64)) & 1 == 1
    }

    #[inline]
    pub fn set_bit(&mut self, index: usize) {
        self.0[index / 64] |= 1u64 << (index % 64);
    }

    /// Hamming distance (number of differing bits)
    #[inline(always)]
    pub fn hamming(&self, other: &Descriptor) -> u32 {
        (self.0[0] ^ other.0[0]).count_ones()
            + (self.0[1] ^ other.0[1]).count_ones()
            + (self.0[2] ^ other.0[2]).count_ones()
            + (self.0[3] ^ other.0[3]).count_ones()
    }
}

/// Location, scale and orientation of a detected keypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Column in level-0 image coordinates
    pub x: f32,
    /// Row in level-0 image coordinates
    pub y: f32,
    /// Pyramid level the keypoint was found on
    pub octave: u8,
    /// Orientation in radians
    pub angle: f32,
    /// Corner response used for ranking
    pub response: f32,
}

/// Descriptors extracted from one image, in extraction order
///
/// May be empty: an image with no detectable structure is a valid input and
/// simply matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSet {
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl DescriptorSet {
    /// Create a set from parallel keypoint/descriptor lists
    ///
    /// Extra elements of the longer list are dropped.
    pub fn new(mut keypoints: Vec<Keypoint>, mut descriptors: Vec<Descriptor>) -> Self {
        let len = keypoints.len().min(descriptors.len());
        keypoints.truncate(len);
        descriptors.truncate(len);
        Self { keypoints, descriptors }
    }

    /// Create a set of descriptors without keypoint geometry
    pub fn from_descriptors(descriptors: Vec<Descriptor>) -> Self {
        let keypoints = vec![
            Keypoint { x: 0.0, y: 0.0, octave: 0, angle: 0.0, response: 0.0 };
            descriptors.len()
        ];
        Self { keypoints, descriptors }
    }

    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    #[inline]
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    #[inline]
    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Descriptor> {
        self.descriptors.get(index)
    }
}
