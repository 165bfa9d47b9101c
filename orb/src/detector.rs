use crate::fast::{fast_corners, strongest_corner_near, Corner};
use crate::harris::harris_responses;
use crate::orientation::intensity_centroid_angle;
use crate::{Error, GrayFloatImage, KeyPoint, Orb, Pyramid, PyramidLevel, ScoreType};
use float_ord::FloatOrd;
use log::*;

impl Orb {
    /// Detect keypoints on every level of the pyramid.
    ///
    /// Each level gets a share of `num_features`; the union is ranked by
    /// response and cut to `num_features`. Keypoints with equal response keep
    /// their level-then-raster order.
    ///
    /// Keypoints of coarse levels are moved onto the strongest level-0 FAST
    /// corner within two level pixels, so their position does not carry the
    /// quantization of the coarse grid.
    ///
    /// # Arguments
    /// * `pyramid` - The pyramid built by [`Orb::build_pyramid`].
    /// # Return value
    /// At most `num_features` keypoints, strongest first.
    pub fn detect_keypoints(&self, pyramid: &Pyramid) -> Result<Vec<KeyPoint>, Error> {
        self.validate()?;
        let base = match pyramid.levels.first() {
            Some(level) => &level.image,
            None => return Ok(vec![]),
        };
        let quotas = self.features_per_level(pyramid.len());
        let mut keypoints: Vec<KeyPoint> = pyramid
            .levels
            .iter()
            .zip(quotas)
            .enumerate()
            .flat_map(|(octave, (level, quota))| self.detect_level(octave, level, quota, base))
            .collect();
        trace!("{} candidates over {} levels.", keypoints.len(), pyramid.len());
        keypoints.sort_by_key(|keypoint| std::cmp::Reverse(FloatOrd(keypoint.response)));
        keypoints.truncate(self.num_features);
        debug!("Detected {} keypoints.", keypoints.len());
        Ok(keypoints)
    }

    fn detect_level(
        &self,
        octave: usize,
        level: &PyramidLevel,
        quota: usize,
        base: &GrayFloatImage,
    ) -> Vec<KeyPoint> {
        let mut corners = fast_corners(&level.image, self.fast_threshold, self.border());
        match self.score_type {
            ScoreType::Harris => {
                // Harris ranks better than the FAST score, but is only worth
                // computing for the strongest FAST corners.
                retain_best(&mut corners, quota.saturating_mul(2));
                let responses = harris_responses(&level.image, &corners);
                for (corner, response) in corners.iter_mut().zip(responses) {
                    corner.score = response;
                }
                retain_best(&mut corners, quota);
            }
            ScoreType::Fast => retain_best(&mut corners, quota),
        }
        trace!("Level {} keeps {} corners (quota {}).", octave, corners.len(), quota);
        corners
            .into_iter()
            .map(|Corner { x, y, score }| KeyPoint {
                point: self.level_zero_point(base, level, x, y),
                response: score,
                size: self.patch_size as f32 * level.scale,
                octave,
                angle: intensity_centroid_angle(&level.image, x, y, self.patch_size / 2),
            })
            .collect()
    }

    fn level_zero_point(
        &self,
        base: &GrayFloatImage,
        level: &PyramidLevel,
        x: usize,
        y: usize,
    ) -> (f32, f32) {
        let mapped = (x as f32 * level.scale, y as f32 * level.scale);
        if level.scale <= 1.0 {
            return mapped;
        }
        let radius = (2.0 * level.scale).ceil() as usize;
        match strongest_corner_near(base, mapped, radius, self.fast_threshold, self.border()) {
            Some((bx, by)) => (bx as f32, by as f32),
            None => mapped,
        }
    }
}

/// Keep the `n` highest scoring corners. The sort is stable, so ties keep raster order.
fn retain_best(corners: &mut Vec<Corner>, n: usize) {
    if corners.len() > n {
        corners.sort_by_key(|corner| std::cmp::Reverse(FloatOrd(corner.score)));
        corners.truncate(n);
    }
}
