// Fixed BRIEF sampling pattern
use crate::descriptor::DESCRIPTOR_BITS;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::{Arc, OnceLock};

/// Pair of patch offsets compared by one descriptor bit
pub type TestPair = ((i8, i8), (i8, i8));

/// Seed for the test pattern; changing it invalidates every stored descriptor
const PATTERN_SEED: u64 = 0x0b1e_5eed;
/// Offsets are clipped to this radius so rotated points stay inside the border
const MAX_OFFSET: f32 = 13.0;
/// Standard deviation of the isotropic Gaussian sampling (patch size / 5)
const SIGMA: f32 = 31.0 / 5.0;

static PATTERN: OnceLock<Arc<Vec<TestPair>>> = OnceLock::new();

/// Approximate N(0, SIGMA^2) by summing four uniforms (Irwin-Hall)
fn gaussian_offset(rng: &mut StdRng) -> i8 {
    let sum: f32 = (0..4).map(|_| rng.random_range(-1.0f32..1.0)).sum();
    // Var of the sum is 4/3
    let value = sum / (4.0f32 / 3.0).sqrt() * SIGMA;
    value.round().clamp(-MAX_OFFSET, MAX_OFFSET) as i8
}

fn generate() -> Vec<TestPair> {
    let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
    let mut pairs = Vec::with_capacity(DESCRIPTOR_BITS);
    while pairs.len() < DESCRIPTOR_BITS {
        let a = (gaussian_offset(&mut rng), gaussian_offset(&mut rng));
        let b = (gaussian_offset(&mut rng), gaussian_offset(&mut rng));
        // A test comparing a point with itself carries no information
        if a != b {
            pairs.push((a, b));
        }
    }
    pairs
}

/// Process-wide pattern, generated on first use
pub fn shared() -> Arc<Vec<TestPair>> {
    PATTERN.get_or_init(|| Arc::new(generate())).clone()
}
