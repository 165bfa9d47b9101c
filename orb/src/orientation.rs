use crate::GrayFloatImage;
use std::f32::consts::TAU;

/// Compute the orientation of a patch from its intensity centroid.
///
/// The moments are taken over the disk of the given radius centered on the
/// keypoint. Pixels of the disk outside the image do not contribute.
///
/// # Return value
/// The angle from the keypoint to the centroid, in radians within `[0, 2π)`.
pub(crate) fn intensity_centroid_angle(
    image: &GrayFloatImage,
    x: usize,
    y: usize,
    radius: usize,
) -> f32 {
    let radius = radius as isize;
    let mut m01 = 0f32;
    let mut m10 = 0f32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            if let Some(intensity) = image.checked_get(x as isize + dx, y as isize + dy) {
                m10 += dx as f32 * intensity;
                m01 += dy as f32 * intensity;
            }
        }
    }
    wrap_angle(m01.atan2(m10))
}

/// Wrap an angle in radians into `[0, 2π)`.
pub(crate) fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};
    use std::f32::consts::{FRAC_PI_2, PI};

    fn half_plane(bright: impl Fn(u32, u32) -> bool) -> GrayFloatImage {
        GrayFloatImage(ImageBuffer::from_fn(41, 41, |x, y| {
            Luma([if bright(x, y) { 1.0 } else { 0.0 }])
        }))
    }

    #[test]
    fn points_towards_bright_side() {
        let right = half_plane(|x, _| x > 20);
        assert!(intensity_centroid_angle(&right, 20, 20, 15).abs() < 1e-4);
        let below = half_plane(|_, y| y > 20);
        assert!((intensity_centroid_angle(&below, 20, 20, 15) - FRAC_PI_2).abs() < 1e-4);
        let left = half_plane(|x, _| x < 20);
        assert!((intensity_centroid_angle(&left, 20, 20, 15) - PI).abs() < 1e-4);
    }

    #[test]
    fn angles_are_wrapped() {
        assert!((wrap_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-6);
        assert_eq!(wrap_angle(TAU), 0.0);
        assert!(wrap_angle(-1e-9) < TAU);
    }
}
