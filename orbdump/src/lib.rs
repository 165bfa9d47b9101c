use image::{DynamicImage, Rgba};
use imageproc::drawing;
use orb_node::{Features, KeyPoint};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// The output file for `input` named `<stem><suffix>` inside `dir`.
pub fn output_path(dir: &Path, input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    dir.join(format!("{stem}{suffix}"))
}

/// Write one line per keypoint to `keypoints` and the matching descriptor
/// bits, most significant bit of each byte first, to `descriptors`.
pub fn write_features(
    features: &Features,
    mut keypoints: impl Write,
    mut descriptors: impl Write,
) -> io::Result<()> {
    for (kp, descriptor) in features
        .keypoints
        .iter()
        .zip(features.descriptors.rows())
    {
        writeln!(
            keypoints,
            "{}, {}, {}, {}, {}, {}",
            kp.point.0, kp.point.1, kp.angle, kp.size, kp.octave, kp.response
        )?;
        writeln!(
            descriptors,
            "{}",
            descriptor.bytes().map(|x| format!("{x:08b}")).join("_")
        )?;
    }
    keypoints.flush()?;
    descriptors.flush()
}

/// Draw a cross on every keypoint.
pub fn render_keypoints(image: &DynamicImage, keypoints: &[KeyPoint]) -> DynamicImage {
    let mut image = drawing::Blend(image.to_rgba8());
    for KeyPoint { point: (x, y), .. } in keypoints {
        drawing::draw_cross_mut(&mut image, Rgba([0, 255, 255, 128]), *x as i32, *y as i32);
    }
    DynamicImage::ImageRgba8(image.0)
}
