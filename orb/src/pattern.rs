use once_cell::sync::Lazy;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64;

/// Number of intensity comparisons, one bit each.
pub(crate) const DESCRIPTOR_BITS: usize = 256;
/// The patch diameter the sampling pattern is drawn for.
pub(crate) const REFERENCE_PATCH_SIZE: f32 = 31.0;
/// Samples are kept within this radius, so the pattern still fits the
/// reference patch after any rotation.
const PATTERN_RADIUS: f32 = 13.0;
const PATTERN_SEED: u64 = 0x4f52_425f_3235_36;

/// The point pairs `[p.x, p.y, q.x, q.y]` compared for every descriptor bit,
/// in pixel offsets from the keypoint.
///
/// The pairs follow the isotropic Gaussian sampling of BRIEF with
/// `sigma^2 = S^2 / 25`. They come from a seeded generator so that every
/// process compares the same pixels and descriptors stay comparable.
pub(crate) static SAMPLING_PATTERN: Lazy<[[f32; 4]; DESCRIPTOR_BITS]> = Lazy::new(|| {
    let mut rng = Pcg64::seed_from_u64(PATTERN_SEED);
    let normal = Normal::new(0.0f32, REFERENCE_PATCH_SIZE / 5.0)
        .expect("the pattern deviation is finite and positive");
    let mut sample = move || {
        let x = normal.sample(&mut rng);
        let y = normal.sample(&mut rng);
        let norm = x.hypot(y);
        let shrink = if norm > PATTERN_RADIUS {
            PATTERN_RADIUS / norm
        } else {
            1.0
        };
        [(x * shrink).round(), (y * shrink).round()]
    };
    let mut pattern = [[0f32; 4]; DESCRIPTOR_BITS];
    for pair in pattern.iter_mut() {
        let [px, py] = sample();
        // A pixel compared with itself carries no information.
        let [qx, qy] = loop {
            let q = sample();
            if q != [px, py] {
                break q;
            }
        };
        *pair = [px, py, qx, qy];
    }
    pattern
});
