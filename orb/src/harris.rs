use crate::fast::Corner;
use crate::image::{separable_filter, GrayFloatImage};
use ndarray::{azip, s, Array2};

/// Side length of the window the structure tensor is summed over.
pub(crate) const HARRIS_BLOCK_SIZE: usize = 7;
/// The Harris sensitivity parameter.
const HARRIS_K: f32 = 0.04;

/// Compute the Harris corner response at every corner.
///
/// Gradients come from 3x3 Sobel filters and the structure tensor is summed
/// over a `HARRIS_BLOCK_SIZE` box around each corner, so corners must be at
/// least `HARRIS_BLOCK_SIZE / 2 + 1` pixels away from the image edges.
#[allow(non_snake_case, clippy::suspicious_operation_groupings)]
pub(crate) fn harris_responses(image: &GrayFloatImage, corners: &[Corner]) -> Vec<f32> {
    if corners.is_empty() {
        return vec![];
    }
    let Lx = GrayFloatImage(separable_filter(&image.0, &[-1., 0., 1.], &[1., 2., 1.]));
    let Ly = GrayFloatImage(separable_filter(&image.0, &[1., 2., 1.], &[-1., 0., 1.]));
    let dim = (image.height(), image.width());
    let mut Lxx = Array2::<f32>::zeros(dim);
    let mut Lyy = Array2::<f32>::zeros(dim);
    let mut Lxy = Array2::<f32>::zeros(dim);
    azip!((
        xx in &mut Lxx,
        yy in &mut Lyy,
        xy in &mut Lxy,
        &x in Lx.ref_array2(),
        &y in Ly.ref_array2(),
    ) {
        *xx = x * x;
        *yy = y * y;
        *xy = x * y;
    });
    // Sobel gains 4 per derivative and the block sums add HARRIS_BLOCK_SIZE^2 terms.
    let scale = (4.0 * HARRIS_BLOCK_SIZE as f32).recip();
    let scale_quad = scale.powi(4);
    let r = HARRIS_BLOCK_SIZE / 2;
    corners
        .iter()
        .map(|&Corner { x, y, .. }| {
            let window = s![y - r..=y + r, x - r..=x + r];
            let a = Lxx.slice(window).sum();
            let b = Lyy.slice(window).sum();
            let c = Lxy.slice(window).sum();
            (a * b - c * c - HARRIS_K * (a + b) * (a + b)) * scale_quad
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    #[test]
    fn corners_beat_edges_and_flat_regions() {
        let image = GrayFloatImage(ImageBuffer::from_fn(40, 40, |x, y| {
            Luma([if x >= 20 && y >= 20 { 1.0 } else { 0.0 }])
        }));
        let at = |x, y| Corner { x, y, score: 0.0 };
        let responses = harris_responses(&image, &[at(20, 20), at(20, 30), at(8, 8)]);
        assert!(responses[0] > 0.0);
        // A straight edge has a negative response.
        assert!(responses[1] < 0.0);
        assert_eq!(responses[2], 0.0);
    }
}
