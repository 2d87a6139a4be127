//! # shopmatch Vision
//!
//! Local-feature image similarity for product matching.
//!
//! - [`OrbExtractor`] - Oriented FAST + rotated BRIEF binary descriptors
//! - [`DescriptorSet`] - Descriptors of one image (possibly empty)
//! - [`LshIndex`] - Multi-probe LSH approximate nearest neighbor index
//! - [`SimilarityMatcher`] - 2-NN matching with Lowe's ratio test
//!
//! ## Example
//!
//! ```rust
//! use image::{GrayImage, Luma};
//! use shopmatch_vision::{OrbExtractor, SimilarityMatcher};
//!
//! let image = GrayImage::from_fn(128, 128, |x, y| Luma([((x / 8 * 37 + y / 8 * 91) % 256) as u8]));
//! let extractor = OrbExtractor::default();
//! let matcher = SimilarityMatcher::default();
//!
//! let query = extractor.extract(&image);
//! let target = matcher.prepare(extractor.extract(&image)).unwrap();
//! let score = matcher.similarity(&query, &target);
//! println!("{} good matches", score);
//! ```

pub mod descriptor;
pub mod error;
pub mod fast;
pub mod lsh;
pub mod matcher;
pub mod orb;
mod pattern;

pub use descriptor::{Descriptor, DescriptorSet, Keypoint, DESCRIPTOR_BITS, DESCRIPTOR_BYTES};
pub use error::{Result, VisionError};
pub use lsh::{LshIndex, LshParams, Neighbor};
pub use matcher::{Match, MatchTarget, MatcherConfig, SimilarityMatcher};
pub use orb::{decode_gray, open_gray, OrbConfig, OrbExtractor, MAX_LEVELS};
