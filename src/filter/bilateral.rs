//! Edge-preserving bilateral smoothing.

use image::GrayImage;

/// Apply a bilateral filter to a grayscale image.
///
/// Each output pixel is a weighted average of the `(2 * radius + 1)^2`
/// neighborhood, where each neighbor's weight is the product of a spatial
/// Gaussian on its Euclidean distance and an intensity Gaussian on its
/// absolute intensity difference from the center pixel. Large intensity
/// discontinuities therefore contribute almost nothing and edges survive
/// the smoothing. Borders are handled by clamping coordinates.
pub fn bilateral_filter(
    src: &GrayImage,
    radius: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    let (width, height) = src.dimensions();
    let r = radius as i64;

    // Spatial weights depend only on the offset; intensity weights only on
    // the absolute difference. Precompute both.
    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let color_coeff = -0.5 / (sigma_color * sigma_color);

    let side = (2 * r + 1) as usize;
    let mut space_weights = vec![0.0f32; side * side];
    for dy in -r..=r {
        for dx in -r..=r {
            let dist_sq = (dy * dy + dx * dx) as f32;
            space_weights[((dy + r) * (2 * r + 1) + (dx + r)) as usize] =
                (dist_sq * space_coeff).exp();
        }
    }

    let mut color_weights = [0.0f32; 256];
    for (diff, weight) in color_weights.iter_mut().enumerate() {
        let d = diff as f32;
        *weight = (d * d * color_coeff).exp();
    }

    let mut out = GrayImage::new(width, height);

    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let center = src.get_pixel(x as u32, y as u32)[0];

            let mut total = 0.0f32;
            let mut weight_sum = 0.0f32;

            for dy in -r..=r {
                for dx in -r..=r {
                    let ny = (y + dy).clamp(0, height as i64 - 1);
                    let nx = (x + dx).clamp(0, width as i64 - 1);
                    let neighbor = src.get_pixel(nx as u32, ny as u32)[0];

                    let diff = usize::from(center.abs_diff(neighbor));
                    let w = space_weights[((dy + r) * (2 * r + 1) + (dx + r)) as usize]
                        * color_weights[diff];

                    total += w * f32::from(neighbor);
                    weight_sum += w;
                }
            }

            let value = (total / weight_sum).round().clamp(0.0, 255.0) as u8;
            out.put_pixel(x as u32, y as u32, image::Luma([value]));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_image_unchanged() {
        let src = GrayImage::from_pixel(8, 6, image::Luma([120]));
        let out = bilateral_filter(&src, 3, 75.0, 75.0);
        assert!(out.pixels().all(|p| p[0] == 120));
    }

    #[test]
    fn test_dimensions_preserved() {
        let src = GrayImage::new(11, 7);
        let out = bilateral_filter(&src, 3, 75.0, 75.0);
        assert_eq!(out.dimensions(), (11, 7));
    }

    #[test]
    fn test_hard_edge_preserved() {
        // Left half 0, right half 255. The intensity Gaussian with sigma 40
        // gives cross-edge neighbors weight exp(-255^2 / (2*40^2)) ~ 1e-9,
        // so each side stays essentially untouched.
        let mut src = GrayImage::new(16, 8);
        for y in 0..8 {
            for x in 8..16 {
                src.put_pixel(x, y, image::Luma([255]));
            }
        }
        let out = bilateral_filter(&src, 3, 40.0, 75.0);
        assert!(out.get_pixel(0, 4)[0] < 2);
        assert!(out.get_pixel(15, 4)[0] > 253);
        assert!(out.get_pixel(7, 4)[0] < 2);
        assert!(out.get_pixel(8, 4)[0] > 253);
    }

    #[test]
    fn test_smooths_isolated_noise() {
        // A small intensity bump sits well inside the intensity Gaussian,
        // so the surrounding pixels pull it toward the background.
        let mut src = GrayImage::from_pixel(9, 9, image::Luma([100]));
        src.put_pixel(4, 4, image::Luma([130]));
        let out = bilateral_filter(&src, 3, 75.0, 75.0);
        assert!(out.get_pixel(4, 4)[0] < 130);
        assert!(out.get_pixel(4, 4)[0] >= 100);
    }
}
