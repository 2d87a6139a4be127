//! ORB-class descriptor extraction
//!
//! Oriented FAST keypoints on a scale pyramid, ranked by Harris response,
//! described with a rotation-steered BRIEF test pattern (256 binary
//! intensity comparisons on a smoothed patch). Rotation invariance comes from
//! the intensity-centroid orientation, scale invariance from the pyramid.

use crate::descriptor::{Descriptor, DescriptorSet, Keypoint, DESCRIPTOR_BITS};
use crate::fast::{detect_fast9, harris_response};
use crate::pattern::{self, TestPair};
use crate::{Result, VisionError};
use image::imageops::{self, FilterType};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Radius of the circular patch used for orientation
const HALF_PATCH: i32 = 15;
/// Sigma of the Gaussian applied before the binary tests
const SMOOTHING_SIGMA: f32 = 2.0;
/// Smallest border that keeps rotated test points and Harris windows in bounds
const MIN_BORDER: u32 = 19;
/// Pyramid depth cap; keypoint octaves are stored as `u8`
pub const MAX_LEVELS: usize = 32;

/// Extractor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbConfig {
    /// Maximum number of keypoints retained across all levels
    pub n_features: usize,
    /// Downscale ratio between pyramid levels
    pub scale_factor: f32,
    /// Maximum number of pyramid levels
    pub n_levels: usize,
    /// Pixels at the image border where no keypoint is detected
    pub edge_threshold: u32,
    /// FAST intensity threshold
    pub fast_threshold: u8,
    /// Downscale inputs whose longest side exceeds this (0 disables)
    pub max_dimension: u32,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            n_features: 500,
            scale_factor: 1.2,
            n_levels: 8,
            edge_threshold: 31,
            fast_threshold: 20,
            max_dimension: 0,
        }
    }
}

impl OrbConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_features == 0 {
            return Err(VisionError::InvalidConfig("n_features must be positive".to_string()));
        }
        if !(self.scale_factor > 1.0) {
            return Err(VisionError::InvalidConfig(format!(
                "scale_factor must be greater than 1, got {}",
                self.scale_factor
            )));
        }
        if self.n_levels == 0 || self.n_levels > MAX_LEVELS {
            return Err(VisionError::InvalidConfig(format!(
                "n_levels must be between 1 and {}, got {}",
                MAX_LEVELS, self.n_levels
            )));
        }
        Ok(())
    }

    fn border(&self) -> u32 {
        self.edge_threshold.max(MIN_BORDER)
    }

    /// Feature budget per level, decaying geometrically with scale
    fn features_per_level(&self, levels: usize) -> Vec<usize> {
        let factor = 1.0 / self.scale_factor as f64;
        let total = self.n_features as f64;
        let mut desired = total * (1.0 - factor) / (1.0 - factor.powi(levels as i32));

        let mut budget = Vec::with_capacity(levels);
        let mut assigned = 0usize;
        for _ in 0..levels.saturating_sub(1) {
            let n = desired.round() as usize;
            budget.push(n);
            assigned += n;
            desired *= factor;
        }
        budget.push(self.n_features.saturating_sub(assigned));
        budget
    }
}

/// Decode encoded image bytes (any format the `image` crate reads) to grayscale
pub fn decode_gray(bytes: &[u8]) -> Result<GrayImage> {
    Ok(image::load_from_memory(bytes)?.to_luma8())
}

/// Read and decode an image file to grayscale
pub fn open_gray<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    let bytes = std::fs::read(path)?;
    decode_gray(&bytes)
}

/// ORB-class keypoint detector and descriptor extractor
#[derive(Debug, Clone)]
pub struct OrbExtractor {
    config: OrbConfig,
    pattern: Arc<Vec<TestPair>>,
}

impl Default for OrbExtractor {
    fn default() -> Self {
        Self {
            config: OrbConfig::default(),
            pattern: pattern::shared(),
        }
    }
}

impl OrbExtractor {
    pub fn new(config: OrbConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pattern: pattern::shared(),
        })
    }

    #[inline]
    pub fn config(&self) -> &OrbConfig {
        &self.config
    }

    /// Decode and extract in one step
    pub fn extract_from_bytes(&self, bytes: &[u8]) -> Result<DescriptorSet> {
        let image = decode_gray(bytes)?;
        Ok(self.extract(&image))
    }

    /// Extract descriptors from a grayscale image
    ///
    /// Returns an empty set for images too small or too flat to yield
    /// keypoints.
    pub fn extract(&self, image: &GrayImage) -> DescriptorSet {
        if image.width() == 0 || image.height() == 0 {
            return DescriptorSet::empty();
        }

        let base = self.fit_to_max_dimension(image);
        let base_ref = base.as_ref().unwrap_or(image);
        let input_scale = image.width() as f32 / base_ref.width() as f32;

        let pyramid = self.build_pyramid(base_ref);
        let budgets = self.config.features_per_level(pyramid.len());
        let border = self.config.border();

        let mut keypoints = Vec::new();
        let mut descriptors = Vec::new();

        for (octave, ((level, scale), budget)) in pyramid.iter().zip(budgets).enumerate() {
            let level_image: &GrayImage = match level {
                Some(resized) => resized,
                None => base_ref,
            };

            let mut corners: Vec<_> = detect_fast9(level_image, self.config.fast_threshold, border)
                .into_iter()
                .map(|c| (c, harris_response(level_image, c.x, c.y)))
                .collect();
            if corners.is_empty() {
                continue;
            }
            // Stable: equal responses keep scan order
            corners.sort_by(|a, b| b.1.total_cmp(&a.1));
            corners.truncate(budget);

            let smoothed = imageops::blur(level_image, SMOOTHING_SIGMA);

            for (corner, response) in corners {
                let angle = intensity_centroid_angle(level_image, corner.x, corner.y);
                let descriptor = self.describe(&smoothed, corner.x, corner.y, angle);
                let to_input = scale * input_scale;
                keypoints.push(Keypoint {
                    x: corner.x as f32 * to_input,
                    y: corner.y as f32 * to_input,
                    octave: octave as u8,
                    angle,
                    response,
                });
                descriptors.push(descriptor);
            }
        }

        DescriptorSet::new(keypoints, descriptors)
    }

    fn fit_to_max_dimension(&self, image: &GrayImage) -> Option<GrayImage> {
        let max_dim = self.config.max_dimension;
        let (w, h) = image.dimensions();
        if max_dim == 0 || w.max(h) <= max_dim {
            return None;
        }
        let ratio = max_dim as f64 / w.max(h) as f64;
        let nw = ((w as f64 * ratio).round() as u32).max(1);
        let nh = ((h as f64 * ratio).round() as u32).max(1);
        Some(imageops::resize(image, nw, nh, FilterType::Triangle))
    }

    /// Pyramid levels as (resized image or `None` for the base, scale to base)
    fn build_pyramid(&self, base: &GrayImage) -> Vec<(Option<GrayImage>, f32)> {
        let min_side = 2 * self.config.border() + 1;
        let (w, h) = base.dimensions();
        let mut levels = vec![(None, 1.0f32)];

        for level in 1..self.config.n_levels {
            let scale = self.config.scale_factor.powi(level as i32);
            let nw = (w as f32 / scale).round() as u32;
            let nh = (h as f32 / scale).round() as u32;
            if nw < min_side || nh < min_side {
                break;
            }
            levels.push((Some(imageops::resize(base, nw, nh, FilterType::Triangle)), scale));
        }
        levels
    }

    fn describe(&self, smoothed: &GrayImage, x: u32, y: u32, angle: f32) -> Descriptor {
        let (sin, cos) = angle.sin_cos();
        let (cx, cy) = (x as i32, y as i32);
        let sample = |(px, py): (i8, i8)| -> u8 {
            let (px, py) = (px as f32, py as f32);
            let rx = (px * cos - py * sin).round() as i32;
            let ry = (px * sin + py * cos).round() as i32;
            smoothed.get_pixel((cx + rx) as u32, (cy + ry) as u32)[0]
        };

        let mut descriptor = Descriptor::default();
        for (bit, pair) in self.pattern.iter().enumerate().take(DESCRIPTOR_BITS) {
            if sample(pair.0) < sample(pair.1) {
                descriptor.set_bit(bit);
            }
        }
        descriptor
    }
}

/// Orientation from the intensity centroid of a circular patch
fn intensity_centroid_angle(image: &GrayImage, x: u32, y: u32) -> f32 {
    let (cx, cy) = (x as i32, y as i32);
    let (mut m10, mut m01) = (0i64, 0i64);
    for dy in -HALF_PATCH..=HALF_PATCH {
        let span = ((HALF_PATCH * HALF_PATCH - dy * dy) as f32).sqrt() as i32;
        for dx in -span..=span {
            let value = image.get_pixel((cx + dx) as u32, (cy + dy) as u32)[0] as i64;
            m10 += dx as i64 * value;
            m01 += dy as i64 * value;
        }
    }
    (m01 as f32).atan2(m10 as f32)
}
