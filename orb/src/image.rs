use crate::Error;
use derive_more::{Deref, DerefMut};
use image::{imageops, DynamicImage, ImageBuffer, Luma, Pixel, Primitive, Rgb};
use log::*;
use ndarray::ArrayView2;
use std::f32;
use wide::f32x4;

type GrayImageBuffer = ImageBuffer<Luma<f32>, Vec<f32>>;

/// The BT.601 luma weights for red, green and blue.
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// A single-channel intensity image with values between 0 and 1.
///
/// Every stage of the extractor works on this type. The image crate is still
/// used for loading, resampling and as the backing buffer, and the buffer can
/// be viewed as an `ndarray` for whole-image arithmetic.
#[derive(Debug, Clone, Deref, DerefMut)]
pub struct GrayFloatImage(pub GrayImageBuffer);

impl GrayFloatImage {
    /// Convert a color image into a unit float intensity image.
    ///
    /// Only 3-channel RGB layouts are accepted. Luma, luma with alpha and RGBA
    /// inputs are rejected with [`Error::InvalidImageFormat`].
    ///
    /// # Arguments
    /// * `input_image` - the input image.
    /// # Return value
    /// An image of the same size with pixel values between 0 and 1.
    pub fn from_color(input_image: &DynamicImage) -> Result<Self, Error> {
        let gray = match input_image {
            DynamicImage::ImageRgb8(rgb) => {
                debug!("Converting a {} x {} 8-bit RGB image", rgb.width(), rgb.height());
                weighted_luma(rgb, 255.0f32.recip())
            }
            DynamicImage::ImageRgb16(rgb) => {
                debug!("Converting a {} x {} 16-bit RGB image", rgb.width(), rgb.height());
                weighted_luma(rgb, 65535.0f32.recip())
            }
            DynamicImage::ImageRgb32F(rgb) => {
                debug!(
                    "Converting a {} x {} 32-bit RGB float image",
                    rgb.width(),
                    rgb.height()
                );
                weighted_luma(rgb, 1.0)
            }
            other => {
                return Err(Error::InvalidImageFormat {
                    color_type: other.color(),
                })
            }
        };
        Ok(Self(gray))
    }

    pub fn ref_array2(&self) -> ArrayView2<f32> {
        ArrayView2::from_shape((self.height(), self.width()), self.0.as_raw())
            .expect("image buffer holds exactly width * height pixels")
    }

    pub fn width(&self) -> usize {
        self.0.width() as usize
    }

    pub fn height(&self) -> usize {
        self.0.height() as usize
    }

    pub fn new(width: usize, height: usize) -> Self {
        Self(ImageBuffer::from_pixel(
            width as u32,
            height as u32,
            Luma([0.0]),
        ))
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.get_pixel(x as u32, y as u32)[0]
    }

    /// Returns the pixel at a signed location, or `None` outside of the image.
    pub fn checked_get(&self, x: isize, y: isize) -> Option<f32> {
        if (0..self.width() as isize).contains(&x) && (0..self.height() as isize).contains(&y) {
            Some(self.get(x as usize, y as usize))
        } else {
            None
        }
    }

    /// Resample the image to the given size with a triangle (bilinear) filter.
    pub fn resized(&self, width: usize, height: usize) -> Self {
        Self(imageops::resize(
            &self.0,
            width as u32,
            height as u32,
            imageops::FilterType::Triangle,
        ))
    }
}

fn weighted_luma<S>(rgb: &ImageBuffer<Rgb<S>, Vec<S>>, normalization: f32) -> GrayImageBuffer
where
    S: Primitive + Into<f32>,
    Rgb<S>: Pixel<Subpixel = S>,
{
    ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let channels = rgb[(x, y)].0.map(Into::<f32>::into);
        let luma = channels
            .iter()
            .zip(LUMA_WEIGHTS.iter())
            .map(|(channel, weight)| channel * weight)
            .sum::<f32>();
        Luma([luma * normalization])
    })
}

/// Split a kernel into SIMD lanes, padding the last lane with zeros.
fn simd_kernel(kernel: &[f32]) -> Vec<f32x4> {
    kernel
        .chunks(4)
        .map(|chunk| {
            let mut lanes = [0.0f32; 4];
            lanes[..chunk.len()].copy_from_slice(chunk);
            f32x4::new(lanes)
        })
        .collect()
}

/// Convolve every row with `kernel`, replicating the edge pixels.
pub fn horizontal_filter(image: &GrayImageBuffer, kernel: &[f32]) -> GrayImageBuffer {
    debug_assert!(kernel.len() % 2 == 1);
    let width = image.width() as usize;
    let height = image.height() as usize;
    if width == 0 || height == 0 {
        return image.clone();
    }
    let half = kernel.len() / 2;
    let lanes = (kernel.len() + 3) / 4 * 4;
    let kernel_simd = simd_kernel(kernel);
    let mut output = vec![0.0; width * height];
    // The padded row is long enough that every window holds whole SIMD lanes.
    let mut padded = vec![0f32; width + 2 * half + (lanes - kernel.len())];
    for (row_in, row_out) in image
        .as_raw()
        .chunks_exact(width)
        .zip(output.chunks_exact_mut(width))
    {
        padded[..half].fill(row_in[0]);
        padded[half..half + width].copy_from_slice(row_in);
        padded[half + width..2 * half + width].fill(row_in[width - 1]);
        for (window, out) in padded.windows(lanes).zip(row_out.iter_mut()) {
            *out = window
                .chunks_exact(4)
                .zip(kernel_simd.iter())
                .fold(f32x4::splat(0.0), |acc, (chunk, k)| {
                    f32x4::new([chunk[0], chunk[1], chunk[2], chunk[3]]).mul_add(*k, acc)
                })
                .reduce_add();
        }
    }
    GrayImageBuffer::from_raw(width as u32, height as u32, output)
        .expect("output holds exactly width * height pixels")
}

/// Convolve every column with `kernel`, replicating the edge pixels.
pub fn vertical_filter(image: &GrayImageBuffer, kernel: &[f32]) -> GrayImageBuffer {
    debug_assert!(kernel.len() % 2 == 1);
    let width = image.width() as usize;
    let height = image.height() as usize;
    if width == 0 || height == 0 {
        return image.clone();
    }
    let half = kernel.len() as isize / 2;
    let rows: Vec<&[f32]> = image.as_raw().chunks_exact(width).collect();
    let mut output = vec![0.0; width * height];
    for (y, row_out) in output.chunks_exact_mut(width).enumerate() {
        for (tap, &weight) in kernel.iter().enumerate() {
            let source = (y as isize + tap as isize - half).clamp(0, height as isize - 1);
            for (out, &pixel) in row_out.iter_mut().zip(rows[source as usize]) {
                *out = pixel.mul_add(weight, *out);
            }
        }
    }
    GrayImageBuffer::from_raw(width as u32, height as u32, output)
        .expect("output holds exactly width * height pixels")
}

pub fn separable_filter(
    image: &GrayImageBuffer,
    h_kernel: &[f32],
    v_kernel: &[f32],
) -> GrayImageBuffer {
    let h = horizontal_filter(image, h_kernel);
    vertical_filter(&h, v_kernel)
}

/// The Gaussian function.
///
/// # Arguments
/// * `x` - the offset.
/// * `r` - sigma.
/// # Return value
/// The kernel value at x.
fn gaussian(x: f32, r: f32) -> f32 {
    ((2.0 * f32::consts::PI).sqrt() * r).recip() * (-x.powi(2) / (2.0 * r.powi(2))).exp()
}

/// Generate a normalized Gaussian kernel.
///
/// # Arguments
/// * `r` - sigma.
/// * `kernel_size` - The size of the kernel, must be odd.
/// # Return value
/// The kernel (a vector).
pub fn gaussian_kernel(r: f32, kernel_size: usize) -> Vec<f32> {
    assert!(kernel_size % 2 == 1, "kernel_size must be odd");
    let half_width = (kernel_size / 2) as i32;
    let kernel: Vec<f32> = (-half_width..=half_width)
        .map(|i| gaussian(i as f32, r))
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.into_iter().map(|val| val / sum).collect()
}

/// Perform Gaussian blur on an image.
///
/// # Arguments
/// * `r` - sigma.
/// * `kernel_size` - The size of the kernel, must be odd.
/// # Return value
/// The resulting image after the filter was applied.
pub fn gaussian_blur(image: &GrayFloatImage, r: f32, kernel_size: usize) -> GrayFloatImage {
    assert!(r > 0.0, "sigma must be > 0.0");
    let kernel = gaussian_kernel(r, kernel_size);
    GrayFloatImage(separable_filter(image, &kernel, &kernel))
}

#[cfg(test)]
mod tests {
    use super::{gaussian_kernel, GrayFloatImage};
    use crate::Error;
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage, RgbaImage};

    fn ramp(width: u32, height: u32) -> GrayFloatImage {
        GrayFloatImage(ImageBuffer::from_fn(width, height, |x, y| {
            Luma([((x * 7 + y * 13) % 29) as f32 / 29.0])
        }))
    }

    #[test]
    fn gaussian_kernel_correct() {
        // test against known correct kernel
        let kernel = gaussian_kernel(3.0, 7);
        let known_correct_kernel = vec![
            0.1062_8852,
            0.1403_2133,
            0.1657_7007,
            0.1752_4014,
            0.1657_7007,
            0.1403_2133,
            0.1062_8852,
        ];
        for (i, j) in kernel.iter().zip(known_correct_kernel.iter()) {
            assert!(f32::abs(*i - *j) < 0.0001);
        }
    }

    #[test]
    fn grayscale_uses_luma_weights() {
        let rgb = RgbImage::from_fn(4, 3, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            2 => Rgb([0, 0, 255]),
            _ => Rgb([255, 255, 255]),
        });
        let gray = GrayFloatImage::from_color(&DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!((gray.width(), gray.height()), (4, 3));
        assert!((gray.get(0, 1) - 0.299).abs() < 1e-6);
        assert!((gray.get(1, 1) - 0.587).abs() < 1e-6);
        assert!((gray.get(2, 1) - 0.114).abs() < 1e-6);
        assert!((gray.get(3, 1) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn grayscale_accepts_every_rgb_depth() {
        let wide = ImageBuffer::<Rgb<u16>, Vec<u16>>::from_pixel(5, 2, Rgb([65535, 0, 0]));
        let gray = GrayFloatImage::from_color(&DynamicImage::ImageRgb16(wide)).unwrap();
        assert!((gray.get(4, 1) - 0.299).abs() < 1e-6);
        let float = ImageBuffer::<Rgb<f32>, Vec<f32>>::from_pixel(3, 4, Rgb([0.0, 0.0, 1.0]));
        let gray = GrayFloatImage::from_color(&DynamicImage::ImageRgb32F(float)).unwrap();
        assert_eq!((gray.width(), gray.height()), (3, 4));
        assert!((gray.get(2, 3) - 0.114).abs() < 1e-6);
    }

    #[test]
    fn grayscale_rejects_non_rgb_layouts() {
        let luma = DynamicImage::ImageLuma8(GrayImage::new(8, 8));
        assert!(matches!(
            GrayFloatImage::from_color(&luma),
            Err(Error::InvalidImageFormat { .. })
        ));
        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(8, 8));
        assert!(matches!(
            GrayFloatImage::from_color(&rgba),
            Err(Error::InvalidImageFormat { .. })
        ));
    }

    #[test]
    fn horizontal_filter() {
        let image = ramp(37, 23);
        let kernel = gaussian_kernel(2.0, 7);
        let filtered_ours = super::horizontal_filter(&image.0, &kernel);
        let filtered_imageproc = imageproc::filter::horizontal_filter(&image.0, &kernel);
        imageproc::assert_pixels_eq_within!(filtered_ours, filtered_imageproc, 0.0001);
    }

    #[test]
    fn vertical_filter() {
        let image = ramp(37, 23);
        let kernel = gaussian_kernel(2.0, 7);
        let filtered_ours = super::vertical_filter(&image.0, &kernel);
        let filtered_imageproc = imageproc::filter::vertical_filter(&image.0, &kernel);
        imageproc::assert_pixels_eq_within!(filtered_ours, filtered_imageproc, 0.0001);
    }

    #[test]
    fn blur_preserves_flat_images() {
        let flat = GrayFloatImage(ImageBuffer::from_pixel(16, 16, Luma([0.25])));
        let blurred = super::gaussian_blur(&flat, 2.0, 7);
        assert!(blurred.pixels().all(|p| (p[0] - 0.25).abs() < 1e-6));
    }
}
