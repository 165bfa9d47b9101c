use crate::{Error, GrayFloatImage, Orb};
use log::*;

/// One level of the scale pyramid.
#[derive(Debug, Clone)]
pub struct PyramidLevel {
    /// The ratio between the level-0 size and the size of this level.
    pub scale: f32,
    /// The resampled intensity image.
    pub image: GrayFloatImage,
}

/// The image pyramid the detector and the descriptor extractor share.
///
/// Level `l` is the input resampled by `1 / scale_factor^l`. Levels that are
/// too small to hold a keypoint outside of the border are not built.
#[derive(Debug, Clone, Default)]
pub struct Pyramid {
    pub levels: Vec<PyramidLevel>,
}

impl Pyramid {
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Orb {
    /// Build the scale pyramid for an intensity image.
    ///
    /// # Arguments
    /// * `image` - The level-0 image.
    /// # Return value
    /// The pyramid, possibly with fewer than `num_levels` levels for small images.
    pub fn build_pyramid(&self, image: &GrayFloatImage) -> Result<Pyramid, Error> {
        self.validate()?;
        let border = self.border();
        let mut levels = Vec::with_capacity(self.num_levels);
        for level in 0..self.num_levels {
            let scale = self.scale_factor.powi(level as i32);
            let width = (image.width() as f32 / scale).round() as usize;
            let height = (image.height() as f32 / scale).round() as usize;
            // Nothing fits between the borders anymore, and every later level is smaller.
            if width <= 2 * border || height <= 2 * border {
                break;
            }
            let image = if level == 0 {
                image.clone()
            } else {
                image.resized(width, height)
            };
            trace!("Pyramid level {} is {}x{} (scale {}).", level, width, height, scale);
            levels.push(PyramidLevel { scale, image });
        }
        debug!(
            "Built {} of {} pyramid levels for a {}x{} image.",
            levels.len(),
            self.num_levels,
            image.width(),
            image.height()
        );
        Ok(Pyramid { levels })
    }

    /// Split `num_features` over `num_levels` levels in a geometric series with
    /// ratio `1 / scale_factor`, so coarse levels get fewer keypoints.
    ///
    /// Each share is rounded up, so every level can contribute at least one
    /// keypoint and the shares add up to at least `num_features`. No share
    /// exceeds `num_features`.
    pub fn features_per_level(&self, num_levels: usize) -> Vec<usize> {
        if num_levels == 0 {
            return vec![];
        }
        let factor = 1.0 / f64::from(self.scale_factor);
        let total_weight: f64 = (0..num_levels).map(|level| factor.powi(level as i32)).sum();
        let mut desired = self.num_features as f64 / total_weight;
        (0..num_levels)
            .map(|_| {
                let quota = (desired.ceil().max(1.0) as usize).min(self.num_features);
                desired *= factor;
                quota
            })
            .collect()
    }
}
