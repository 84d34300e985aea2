//! Adaptive mean thresholding for edge-mask extraction.

use image::GrayImage;

/// Extract a binary edge mask via adaptive mean thresholding.
///
/// For each pixel, the threshold is the mean intensity over a
/// `block_size` x `block_size` neighborhood minus `offset`. Pixels above
/// their local threshold become 255 (background), the rest become 0 (edge).
/// Borders are handled by clamping coordinates.
///
/// Smooth regions sit at their local mean and land above `mean - offset`,
/// so only pixels on the dark side of a local discontinuity are marked.
pub fn adaptive_threshold(src: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let (width, height) = src.dimensions();
    let radius = i64::from(block_size / 2);
    let count = {
        let side = (2 * radius + 1) as f32;
        side * side
    };

    let mut out = GrayImage::new(width, height);

    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let mut sum = 0.0f32;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let ny = (y + dy).clamp(0, height as i64 - 1);
                    let nx = (x + dx).clamp(0, width as i64 - 1);
                    sum += f32::from(src.get_pixel(nx as u32, ny as u32)[0]);
                }
            }

            let threshold = sum / count - offset;
            let value = if f32::from(src.get_pixel(x as u32, y as u32)[0]) > threshold {
                255
            } else {
                0
            };
            out.put_pixel(x as u32, y as u32, image::Luma([value]));
        }
    }

    out
}
