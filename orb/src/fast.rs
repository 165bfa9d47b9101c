use crate::GrayFloatImage;
use log::*;

/// The 16 pixel Bresenham circle of radius 3, clockwise from 12 o'clock.
const CIRCLE: [(isize, isize); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Number of contiguous circle pixels that must all be brighter or all darker (FAST-9).
const ARC_LENGTH: usize = 9;

/// A FAST corner in level pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Corner {
    pub x: usize,
    pub y: usize,
    pub score: f32,
}

/// Detect FAST-9 corners with 3x3 non-maximum suppression.
///
/// Only pixels at least `border` pixels away from every edge are tested. The
/// border must be at least 4 so the circle and the suppression window stay
/// inside the image. Corners are returned in raster order.
pub(crate) fn fast_corners(image: &GrayFloatImage, threshold: f32, border: usize) -> Vec<Corner> {
    debug_assert!(border >= 4);
    let width = image.width();
    let height = image.height();
    if width <= 2 * border || height <= 2 * border {
        return vec![];
    }
    let mut scores = vec![0f32; width * height];
    for y in border..height - border {
        for x in border..width - border {
            scores[y * width + x] = corner_score(image, x, y, threshold);
        }
    }
    let mut corners = vec![];
    for y in border..height - border {
        for x in border..width - border {
            let score = scores[y * width + x];
            if score <= 0.0 {
                continue;
            }
            let is_maximum = (y - 1..=y + 1)
                .flat_map(|ny| (x - 1..=x + 1).map(move |nx| (nx, ny)))
                .filter(|&(nx, ny)| (nx, ny) != (x, y))
                .all(|(nx, ny)| score > scores[ny * width + nx]);
            if is_maximum {
                corners.push(Corner { x, y, score });
            }
        }
    }
    trace!(
        "{} FAST corners survived non-maximum suppression in a {}x{} image.",
        corners.len(),
        width,
        height
    );
    corners
}

/// Find the strongest FAST corner within `radius` pixels (Chebyshev) of
/// `(x, y)`, at least `border` pixels away from every edge.
///
/// Ties keep raster order. Returns `None` when no pixel of the window is a corner.
pub(crate) fn strongest_corner_near(
    image: &GrayFloatImage,
    (x, y): (f32, f32),
    radius: usize,
    threshold: f32,
    border: usize,
) -> Option<(usize, usize)> {
    debug_assert!(border >= 3);
    let width = image.width();
    let height = image.height();
    if width <= 2 * border || height <= 2 * border {
        return None;
    }
    let window = |center: f32, len: usize| {
        let center = center.round().max(0.0) as usize;
        center.saturating_sub(radius).max(border)..=(center + radius).min(len - border - 1)
    };
    let mut best: Option<(f32, usize, usize)> = None;
    for ny in window(y, height) {
        for nx in window(x, width) {
            let score = corner_score(image, nx, ny, threshold);
            if score > 0.0 && best.map_or(true, |(best_score, _, _)| score > best_score) {
                best = Some((score, nx, ny));
            }
        }
    }
    best.map(|(_, nx, ny)| (nx, ny))
}

/// The FAST score of a pixel, or 0 if it is not a corner.
///
/// The score is the sum of how far every circle pixel exceeds the threshold,
/// so stronger contrast and longer arcs rank higher.
fn corner_score(image: &GrayFloatImage, x: usize, y: usize, threshold: f32) -> f32 {
    let center = image.get(x, y);
    let ring = CIRCLE.map(|(dx, dy)| image.get((x as isize + dx) as usize, (y as isize + dy) as usize));
    let brighter = ring.map(|p| p > center + threshold);
    let darker = ring.map(|p| p < center - threshold);
    if !has_arc(&brighter) && !has_arc(&darker) {
        return 0.0;
    }
    ring.iter()
        .map(|&p| (p - center).abs() - threshold)
        .filter(|&excess| excess > 0.0)
        .sum()
}

/// Check for `ARC_LENGTH` contiguous set flags, wrapping around the circle.
fn has_arc(flags: &[bool; 16]) -> bool {
    let mut run = 0;
    for i in 0..flags.len() + ARC_LENGTH - 1 {
        if flags[i % flags.len()] {
            run += 1;
            if run >= ARC_LENGTH {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn quadrant(size: u32, corner: u32) -> GrayFloatImage {
        GrayFloatImage(ImageBuffer::from_fn(size, size, |x, y| {
            Luma([if x >= corner && y >= corner { 1.0 } else { 0.0 }])
        }))
    }

    #[test]
    fn arc_wraps_around() {
        let mut flags = [false; 16];
        for i in (12..16).chain(0..5) {
            flags[i] = true;
        }
        assert!(has_arc(&flags));
        flags[2] = false;
        assert!(!has_arc(&flags));
    }

    #[test]
    fn flat_image_has_no_corners() {
        let image = GrayFloatImage(ImageBuffer::from_pixel(40, 40, Luma([0.5])));
        assert!(fast_corners(&image, 20.0 / 255.0, 4).is_empty());
    }

    #[test]
    fn single_corner_survives_suppression() {
        let corners = fast_corners(&quadrant(40, 20), 20.0 / 255.0, 4);
        assert_eq!(corners.len(), 1);
        assert_eq!((corners[0].x, corners[0].y), (20, 20));
    }

    #[test]
    fn nearby_corner_is_found() {
        let image = quadrant(40, 20);
        let threshold = 20.0 / 255.0;
        assert_eq!(strongest_corner_near(&image, (22.4, 17.6), 3, threshold, 4), Some((20, 20)));
        assert_eq!(strongest_corner_near(&image, (24.0, 24.0), 2, threshold, 4), None);
        // The window is clipped to the border.
        assert_eq!(strongest_corner_near(&image, (20.0, 20.0), 5, threshold, 21), None);
    }

    #[test]
    fn border_is_respected() {
        // The corner sits 6 pixels from the edge.
        let image = quadrant(40, 34);
        assert_eq!(fast_corners(&image, 20.0 / 255.0, 4).len(), 1);
        assert!(fast_corners(&image, 20.0 / 255.0, 8).is_empty());
    }
}
