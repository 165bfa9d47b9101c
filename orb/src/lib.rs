//! Oriented FAST and rotated BRIEF (ORB) feature extraction.
//!
//! Keypoints are FAST corners found over a scale pyramid, ranked by their
//! Harris response and oriented by the intensity centroid of their patch.
//! Each keypoint is described by 256 binary intensity comparisons of a
//! sampling pattern rotated by the keypoint orientation.

mod descriptors;
mod detector;
mod error;
mod fast;
mod harris;
pub mod image;
mod orientation;
mod pattern;
mod pyramid;

pub use crate::descriptors::Descriptor;
pub use crate::error::{DetectionError, Error, ExtractionError};
pub use crate::image::GrayFloatImage;
pub use crate::pyramid::{Pyramid, PyramidLevel};

use ::image::DynamicImage;
use cv_core::nalgebra::Point2;
use cv_core::ImagePoint;
use log::*;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point of interest in an image.
/// This pretty much follows from OpenCV conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyPoint {
    /// The horizontal and vertical coordinates in level-0 pixels.
    /// +x faces right and +y faces toward the bottom of the image,
    /// starting from the top left corner.
    pub point: (f32, f32),
    /// The magnitude of response from the detector.
    pub response: f32,

    /// The diameter of the described patch, in level-0 pixel units.
    pub size: f32,

    /// The pyramid level in which the keypoint was detected.
    pub octave: usize,

    /// The orientation angle in radians, within `[0, 2π)`.
    pub angle: f32,
}

impl ImagePoint for KeyPoint {
    fn image_point(&self) -> Point2<f64> {
        Point2::new(self.point.0 as f64, self.point.1 as f64)
    }
}

/// How corners are ranked within a pyramid level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScoreType {
    /// Rank by the Harris corner response.
    Harris,
    /// Rank by the FAST score.
    Fast,
}

impl Default for ScoreType {
    fn default() -> Self {
        Self::Harris
    }
}

/// Contains the configuration parameters of ORB.
///
/// The parameter most users change is `num_features`, which caps the
/// number of keypoints. [`Orb::new`] sets it and leaves everything else
/// at its default.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Orb {
    /// Maximum number of keypoints to keep
    pub num_features: usize,

    /// Size ratio between two consecutive pyramid levels
    pub scale_factor: f32,

    /// Maximum number of pyramid levels
    pub num_levels: usize,

    /// Width of the image border where no keypoints are detected
    pub edge_threshold: usize,

    /// FAST intensity difference threshold, in `[0, 1]` intensity units
    pub fast_threshold: f32,

    /// Ranking of corners within a level
    pub score_type: ScoreType,

    /// Diameter of the patch used for orientation and description
    pub patch_size: usize,
}

impl Orb {
    /// This convenience constructor is provided for the very common case
    /// that only the number of features needs to be modified.
    pub fn new(num_features: usize) -> Self {
        Self {
            num_features,
            ..Default::default()
        }
    }

    /// Check that the configuration can drive the detector.
    pub fn validate(&self) -> Result<(), DetectionError> {
        if self.num_features == 0 {
            return Err(DetectionError::ZeroFeatures);
        }
        if self.num_levels == 0 {
            return Err(DetectionError::ZeroLevels);
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 1.0) {
            return Err(DetectionError::InvalidScaleFactor {
                scale_factor: self.scale_factor,
            });
        }
        if !(self.fast_threshold.is_finite() && self.fast_threshold >= 0.0) {
            return Err(DetectionError::InvalidFastThreshold {
                threshold: self.fast_threshold,
            });
        }
        if self.patch_size < 7 || self.patch_size % 2 == 0 {
            return Err(DetectionError::InvalidPatchSize {
                patch_size: self.patch_size,
            });
        }
        Ok(())
    }

    /// The distance from the level edges within which no corner is detected.
    ///
    /// It never drops below 4, which keeps the FAST circle, the suppression
    /// window and the Harris block inside the level.
    pub fn border(&self) -> usize {
        self.edge_threshold.max(4)
    }
}

impl Default for Orb {
    fn default() -> Orb {
        Orb {
            num_features: 500,
            scale_factor: 1.2,
            num_levels: 8,
            edge_threshold: 31,
            fast_threshold: 20.0 / 255.0,
            score_type: ScoreType::Harris,
            patch_size: 31,
        }
    }
}

impl Orb {
    /// Extract features from a color image.
    ///
    /// This performs all operations end-to-end: grayscale conversion,
    /// pyramid construction, detection and description. Each step is also
    /// exposed on its own.
    ///
    /// # Arguments
    /// * `image` - The input image. It must have three color channels.
    ///
    /// Returns the keypoints that got a descriptor and their descriptors,
    /// index-aligned.
    ///
    /// # Example
    /// ```
    /// let orb = orb::Orb::default();
    /// let image = image::DynamicImage::new_rgb8(64, 64);
    /// let (keypoints, descriptors) = orb.extract(&image).unwrap();
    /// assert!(keypoints.is_empty() && descriptors.is_empty());
    /// ```
    pub fn extract(&self, image: &DynamicImage) -> Result<(Vec<KeyPoint>, Vec<Descriptor>), Error> {
        let float_image = GrayFloatImage::from_color(image)?;
        self.extract_from_gray_float_image(&float_image)
    }

    /// Extract features from an image already converted to intensities.
    pub fn extract_from_gray_float_image(
        &self,
        float_image: &GrayFloatImage,
    ) -> Result<(Vec<KeyPoint>, Vec<Descriptor>), Error> {
        trace!("Building pyramid.");
        let pyramid = self.build_pyramid(float_image)?;
        trace!("Detecting keypoints.");
        let keypoints = self.detect_keypoints(&pyramid)?;
        trace!("Extracting descriptors.");
        let (keypoints, descriptors) = self.extract_descriptors(&pyramid, &keypoints)?;
        trace!("Computing descriptors finished.");
        info!("Extracted {} features", keypoints.len());
        Ok((keypoints, descriptors))
    }

    /// Extract features from an image on disk.
    ///
    /// # Arguments
    /// * `path` - The input image path for which to extract features.
    pub fn extract_path(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<(Vec<KeyPoint>, Vec<Descriptor>), Error> {
        self.extract(&::image::open(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let orb = Orb::default();
        assert_eq!(orb.validate(), Ok(()));
        assert_eq!(orb.border(), 31);
        assert_eq!(Orb::new(12).num_features, 12);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let invalid = [
            (
                Orb { num_levels: 0, ..Orb::default() },
                DetectionError::ZeroLevels,
            ),
            (
                Orb { patch_size: 30, ..Orb::default() },
                DetectionError::InvalidPatchSize { patch_size: 30 },
            ),
            (
                Orb { fast_threshold: -0.1, ..Orb::default() },
                DetectionError::InvalidFastThreshold { threshold: -0.1 },
            ),
        ];
        for (orb, error) in invalid {
            assert_eq!(orb.validate(), Err(error));
        }
    }

    #[test]
    fn border_has_a_floor() {
        let orb = Orb {
            edge_threshold: 0,
            ..Orb::default()
        };
        assert_eq!(orb.border(), 4);
    }
}
