use image::{ColorType, ImageError};
use thiserror::Error;

/// Everything that can go wrong while turning an image into keypoints and descriptors.
#[derive(Debug, Error)]
pub enum Error {
    /// The input image does not have the three color channels the grayscale conversion expects.
    #[error("unsupported image layout {color_type:?}, expected a 3-channel RGB image")]
    InvalidImageFormat { color_type: ColorType },
    /// The detector could not run on the given image or configuration.
    #[error("keypoint detection failed: {0}")]
    DetectionFailure(#[from] DetectionError),
    /// The descriptor extractor could not run on the given keypoints.
    #[error("descriptor extraction failed: {0}")]
    ExtractionFailure(#[from] ExtractionError),
    /// The image could not be read from disk.
    #[error("failed to load image: {0}")]
    ImageLoad(#[from] ImageError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    #[error("the maximum number of features must be positive")]
    ZeroFeatures,
    #[error("the pyramid needs at least one level")]
    ZeroLevels,
    #[error("scale factor {scale_factor} must be finite and greater than 1")]
    InvalidScaleFactor { scale_factor: f32 },
    #[error("FAST threshold {threshold} must be finite and non-negative")]
    InvalidFastThreshold { threshold: f32 },
    #[error("patch size {patch_size} must be odd and at least 7")]
    InvalidPatchSize { patch_size: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("keypoint {index} refers to pyramid level {octave}, but only {levels} levels exist")]
    MissingLevel {
        index: usize,
        octave: usize,
        levels: usize,
    },
    #[error("keypoint {index} has a non-finite position or angle")]
    NonFiniteKeyPoint { index: usize },
    /// A pattern sample fell outside the level image. Keypoints hitting this are
    /// dropped rather than failing the extraction.
    #[error("sample ({x}, {y}) is outside of the {width}x{height} image")]
    SampleOutOfBounds {
        x: isize,
        y: isize,
        width: usize,
        height: usize,
    },
}
