//! Image loading utilities.

use std::path::Path;

use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;

use crate::error::{Error, Result};

use super::{swap_channels, ImageTensor, RGB_CHANNELS};

/// Open an image from disk as 3-channel RGB.
///
/// # Errors
///
/// Returns [`Error::InputNotFound`] if the path does not resolve to a
/// decodable image.
pub fn open_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::InputNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(img.to_rgb8())
}

/// Compute resized dimensions so the longer edge equals `load_size` and the
/// aspect ratio is preserved. The scaled edge is truncated to an integer but
/// never below 1, so extreme aspect ratios still yield a usable image.
pub fn fit_dimensions(width: u32, height: u32, load_size: u32) -> (u32, u32) {
    let ratio = f64::from(width) / f64::from(height);

    if ratio > 1.0 {
        (load_size, ((f64::from(load_size) / ratio) as u32).max(1))
    } else {
        (((f64::from(load_size) * ratio) as u32).max(1), load_size)
    }
}

/// Load an image from disk and convert it to a network input tensor.
///
/// The image is:
/// 1. Loaded from the specified path and converted to RGB
/// 2. Resized so its longer edge equals `load_size`, bicubic interpolation
/// 3. Reordered RGB -> BGR (the channel order the generators expect)
/// 4. Normalized from [0, 255] to [-1, 1]
/// 5. Returned as an NCHW tensor (1, 3, height, width)
///
/// # Errors
///
/// Returns [`Error::InputNotFound`] if the image cannot be loaded.
pub fn load_image<P: AsRef<Path>>(path: P, load_size: u32) -> Result<ImageTensor> {
    let img = open_rgb(path)?;

    let (width, height) = fit_dimensions(img.width(), img.height(), load_size);
    let resized = image::DynamicImage::ImageRgb8(img)
        .resize_exact(width, height, FilterType::CatmullRom)
        .to_rgb8();

    Ok(swap_channels(&image_to_tensor(&resized)))
}

/// Convert an RGB image to a normalized NCHW tensor.
fn image_to_tensor(img: &RgbImage) -> ImageTensor {
    let (width, height) = (img.width() as usize, img.height() as usize);

    let mut tensor = Array4::<f32>::zeros((1, RGB_CHANNELS, height, width));

    for y in 0..height {
        for x in 0..width {
            let pixel = img.get_pixel(x as u32, y as u32);
            // Normalize from [0, 255] to [-1, 1]
            tensor[[0, 0, y, x]] = (f32::from(pixel[0]) / 127.5) - 1.0;
            tensor[[0, 1, y, x]] = (f32::from(pixel[1]) / 127.5) - 1.0;
            tensor[[0, 2, y, x]] = (f32::from(pixel[2]) / 127.5) - 1.0;
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_dimensions_portrait() {
        // 300x450 with load size 450: longer edge already at target.
        assert_eq!(fit_dimensions(300, 450, 450), (300, 450));
    }

    #[test]
    fn test_fit_dimensions_landscape() {
        // 800x600 -> width 450, height truncated from 337.5.
        assert_eq!(fit_dimensions(800, 600, 450), (450, 337));
    }

    #[test]
    fn test_fit_dimensions_square() {
        assert_eq!(fit_dimensions(500, 500, 450), (450, 450));
    }

    #[test]
    fn test_fit_dimensions_upscale() {
        assert_eq!(fit_dimensions(100, 200, 450), (225, 450));
    }

    #[test]
    fn test_fit_dimensions_extreme_ratio_keeps_one_pixel() {
        // A 1000x1 strip would truncate to zero height; the scaled edge is
        // floored at one pixel instead.
        assert_eq!(fit_dimensions(1000, 1, 450), (450, 1));
        assert_eq!(fit_dimensions(1, 1000, 450), (1, 450));
    }

    #[test]
    fn test_tensor_shape_and_range() {
        let mut img = RgbImage::new(4, 3);
        img.put_pixel(0, 0, image::Rgb([255, 0, 128]));
        let tensor = image_to_tensor(&img);

        assert_eq!(tensor.shape(), &[1, 3, 3, 4]);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 1, 0, 0]] - (-1.0)).abs() < 1e-6);
        // Remaining pixels are black, i.e. -1.0 after normalization.
        assert!((tensor[[0, 2, 2, 3]] - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_is_input_not_found() {
        let err = open_rgb("/nonexistent/natalie.jpg").unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
    }
}
