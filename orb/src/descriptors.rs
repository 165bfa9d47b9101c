use crate::image::gaussian_blur;
use crate::pattern::{REFERENCE_PATCH_SIZE, SAMPLING_PATTERN};
use crate::{ExtractionError, GrayFloatImage, KeyPoint, Orb, Pyramid};
use bitarray::BitArray;
use log::*;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// The binary descriptor of one keypoint: 256 intensity comparisons.
pub type Descriptor = BitArray<32>;

/// Smoothing applied before sampling, so single-pixel noise does not flip bits.
const SMOOTHING_SIGMA: f32 = 2.0;
const SMOOTHING_KERNEL_SIZE: usize = 7;

impl Orb {
    /// Extract rotated BRIEF descriptors for the keypoints.
    ///
    /// Keypoints whose rotated sampling pattern does not fit in their pyramid
    /// level are dropped, so the returned keypoints are the subset (in the
    /// same order) that actually has a descriptor.
    ///
    /// # Arguments
    /// * `pyramid` - the pyramid the keypoints were detected in.
    /// * `keypoints` - the keypoints detected.
    /// # Return value
    /// The kept keypoints and their descriptors, index-aligned.
    pub fn extract_descriptors(
        &self,
        pyramid: &Pyramid,
        keypoints: &[KeyPoint],
    ) -> Result<(Vec<KeyPoint>, Vec<Descriptor>), ExtractionError> {
        for (index, keypoint) in keypoints.iter().enumerate() {
            if keypoint.octave >= pyramid.len() {
                return Err(ExtractionError::MissingLevel {
                    index,
                    octave: keypoint.octave,
                    levels: pyramid.len(),
                });
            }
            if !(keypoint.point.0.is_finite()
                && keypoint.point.1.is_finite()
                && keypoint.angle.is_finite())
            {
                return Err(ExtractionError::NonFiniteKeyPoint { index });
            }
        }
        // Only the levels that have keypoints are worth smoothing.
        let smoothed: Vec<Option<GrayFloatImage>> = pyramid
            .levels
            .iter()
            .enumerate()
            .map(|(octave, level)| {
                keypoints
                    .iter()
                    .any(|keypoint| keypoint.octave == octave)
                    .then(|| gaussian_blur(&level.image, SMOOTHING_SIGMA, SMOOTHING_KERNEL_SIZE))
            })
            .collect();
        let describe = |keypoint: &KeyPoint| {
            let level = &pyramid.levels[keypoint.octave];
            let image = smoothed[keypoint.octave].as_ref()?;
            Some((
                *keypoint,
                self.rotated_brief(keypoint, level.scale, image).ok()?,
            ))
        };
        #[cfg(not(feature = "rayon"))]
        let (kept, descriptors): (Vec<KeyPoint>, Vec<Descriptor>) =
            keypoints.iter().filter_map(describe).unzip();
        #[cfg(feature = "rayon")]
        let (kept, descriptors): (Vec<KeyPoint>, Vec<Descriptor>) =
            keypoints.par_iter().filter_map(describe).unzip();
        debug!(
            "{}/{} keypoints have a full sampling pattern inside the image.",
            kept.len(),
            keypoints.len()
        );
        Ok((kept, descriptors))
    }

    /// Compute the descriptor of a keypoint with the pattern rotated by the keypoint angle.
    ///
    /// # Arguments
    /// * `keypoint` - the keypoint, in level-0 coordinates.
    /// * `scale` - the scale of the keypoint's pyramid level.
    /// * `image` - the smoothed level image.
    fn rotated_brief(
        &self,
        keypoint: &KeyPoint,
        scale: f32,
        image: &GrayFloatImage,
    ) -> Result<Descriptor, ExtractionError> {
        let mut output = Descriptor::zeros();
        let xf = keypoint.point.0 / scale;
        let yf = keypoint.point.1 / scale;
        let pattern_scale = self.patch_size as f32 / REFERENCE_PATCH_SIZE;
        let co = f32::cos(keypoint.angle) * pattern_scale;
        let si = f32::sin(keypoint.angle) * pattern_scale;
        let sample = |x: f32, y: f32| {
            let sx = f32::round(xf + x * co - y * si) as isize;
            let sy = f32::round(yf + x * si + y * co) as isize;
            image
                .checked_get(sx, sy)
                .ok_or(ExtractionError::SampleOutOfBounds {
                    x: sx,
                    y: sy,
                    width: image.width(),
                    height: image.height(),
                })
        };
        let bytes = output.bytes_mut();
        for (bit, &[px, py, qx, qy]) in SAMPLING_PATTERN.iter().enumerate() {
            if sample(px, py)? < sample(qx, qy)? {
                bytes[bit >> 3] |= 1 << (bit & 7);
            }
        }
        Ok(output)
    }
}
