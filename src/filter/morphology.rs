//! Grayscale morphology with a square structuring element.

use image::GrayImage;

/// Erode a grayscale image: each pixel becomes the minimum over a square
/// structuring element of side `kernel_size`, applied `iterations` times.
///
/// A 1x1 element (or zero iterations) leaves the image unchanged.
pub fn erode(src: &GrayImage, kernel_size: u32, iterations: u32) -> GrayImage {
    iterate(src, kernel_size, iterations, |a, b| a.min(b))
}

/// Dilate a grayscale image: the maximum-filter counterpart of [`erode`].
pub fn dilate(src: &GrayImage, kernel_size: u32, iterations: u32) -> GrayImage {
    iterate(src, kernel_size, iterations, |a, b| a.max(b))
}

/// Morphological opening: erosion followed by dilation with the same element
/// and iteration count. Removes features smaller than the element while
/// approximately preserving larger region sizes.
pub fn open(src: &GrayImage, kernel_size: u32, iterations: u32) -> GrayImage {
    dilate(&erode(src, kernel_size, iterations), kernel_size, iterations)
}

fn iterate(
    src: &GrayImage,
    kernel_size: u32,
    iterations: u32,
    select: impl Fn(u8, u8) -> u8 + Copy,
) -> GrayImage {
    let radius = i64::from(kernel_size / 2);
    if radius == 0 || iterations == 0 {
        return src.clone();
    }

    let mut current = src.clone();
    for _ in 0..iterations {
        current = filter_pass(&current, radius, select);
    }
    current
}

fn filter_pass(src: &GrayImage, radius: i64, select: impl Fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = src.dimensions();
    let mut out = GrayImage::new(width, height);

    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let mut value = src.get_pixel(x as u32, y as u32)[0];

            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let ny = (y + dy).clamp(0, height as i64 - 1);
                    let nx = (x + dx).clamp(0, width as i64 - 1);
                    value = select(value, src.get_pixel(nx as u32, ny as u32)[0]);
                }
            }

            out.put_pixel(x as u32, y as u32, image::Luma([value]));
        }
    }

    out
}
