use crate::NodeSettings;
use image::{DynamicImage, GenericImageView};
use log::*;
use orb::{Descriptor, KeyPoint, Orb};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// One descriptor per row, 32 bytes each.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Default)]
pub struct DescriptorMatrix {
    rows: Vec<Descriptor>,
}

impl DescriptorMatrix {
    /// The number of bytes in each row.
    pub const ROW_BYTES: usize = 32;

    pub fn new(rows: Vec<Descriptor>) -> Self {
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The packed bits of one descriptor, or `None` past the last row.
    pub fn row(&self, index: usize) -> Option<&[u8]> {
        self.rows.get(index).map(|row| &row.bytes()[..])
    }

    pub fn rows(&self) -> &[Descriptor] {
        &self.rows
    }
}

impl std::fmt::Debug for DescriptorMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorMatrix")
            .field("rows", &self.rows.len())
            .finish()
    }
}

/// The keypoints of one image and their descriptors.
///
/// Row `i` of `descriptors` describes `keypoints[i]`.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Features {
    pub keypoints: Vec<KeyPoint>,
    pub descriptors: DescriptorMatrix,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Extract the features of a color image with the node settings.
///
/// Keypoints whose sampling pattern does not fit in the image have no
/// descriptor and are not part of the result.
pub fn transform(image: &DynamicImage, settings: &NodeSettings) -> Result<Features, orb::Error> {
    transform_with(image, &settings.orb())
}

/// Extract the features of a color image with a full detector configuration.
pub fn transform_with(image: &DynamicImage, orb: &Orb) -> Result<Features, orb::Error> {
    let (keypoints, descriptors) = orb.extract(image)?;
    debug!(
        "Transformed a {}x{} image into {} features.",
        image.width(),
        image.height(),
        keypoints.len()
    );
    Ok(Features {
        keypoints,
        descriptors: DescriptorMatrix::new(descriptors),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn matrix_rows_are_packed_bytes() {
        let mut descriptor = Descriptor::zeros();
        descriptor.bytes_mut()[0] = 0b101;
        let matrix = DescriptorMatrix::new(vec![Descriptor::zeros(), descriptor]);
        assert_eq!(matrix.row_count(), 2);
        assert_eq!(matrix.row(1).map(|row| row.len()), Some(DescriptorMatrix::ROW_BYTES));
        assert_eq!(matrix.row(1).map(|row| row[0]), Some(0b101));
        assert!(matrix.row(2).is_none());
    }

    #[test]
    fn flat_image_transforms_to_nothing() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 80, Rgb([10, 200, 30])));
        let features = transform(&image, &NodeSettings::default()).unwrap();
        assert!(features.is_empty());
        assert!(features.descriptors.is_empty());
    }
}
