//! Image saving utilities.

use std::path::Path;

use image::RgbImage;

use crate::error::{Error, Result};

use super::{swap_channels, ImageTensor};

/// Convert a network output tensor back to an RGB image.
///
/// The tensor is:
/// 1. Reordered BGR -> RGB
/// 2. Denormalized from [-1, 1] to [0, 255] with clamping
pub fn tensor_to_image(tensor: &ImageTensor) -> RgbImage {
    let rgb = swap_channels(tensor);
    let (_, _, height, width) = rgb.dim();

    let mut img = RgbImage::new(width as u32, height as u32);

    for y in 0..height {
        for x in 0..width {
            let r = denormalize(rgb[[0, 0, y, x]]);
            let g = denormalize(rgb[[0, 1, y, x]]);
            let b = denormalize(rgb[[0, 2, y, x]]);
            img.put_pixel(x as u32, y as u32, image::Rgb([r, g, b]));
        }
    }

    img
}

/// Save an RGB image to disk, format inferred from the extension.
///
/// `quality` applies to JPEG output only.
///
/// # Errors
///
/// Returns [`Error::ImageSave`] if the image cannot be encoded or written.
pub fn save_image<P: AsRef<Path>>(img: &RgbImage, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            img.write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}

/// Denormalize a value from [-1, 1] to [0, 255] with clamping.
#[inline]
fn denormalize(value: f32) -> u8 {
    let scaled = value.mul_add(0.5, 0.5) * 255.0;
    scaled.clamp(0.0, 255.0) as u8
}
