//! Color quantization via K-means clustering.

use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of clustering a sample set: per-sample cluster labels, the K
/// centroids, and the total squared distance of samples to their centroids.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub labels: Vec<usize>,
    pub centroids: Vec<[f32; 3]>,
    pub compactness: f64,
}

/// Run K-means over 3-dimensional samples.
///
/// Each attempt starts from `k` randomly chosen samples and iterates Lloyd's
/// algorithm until `max_iterations` is reached or the largest centroid
/// movement falls below `epsilon`. The attempt with the lowest compactness
/// wins. All randomness is drawn from `rng`, so a seeded generator makes the
/// result fully deterministic.
pub fn kmeans(
    samples: &[[f32; 3]],
    k: usize,
    max_iterations: u32,
    epsilon: f32,
    attempts: u32,
    rng: &mut StdRng,
) -> Clustering {
    debug_assert!(k > 0 && !samples.is_empty());

    let mut best: Option<Clustering> = None;

    for _ in 0..attempts {
        let result = kmeans_attempt(samples, k, max_iterations, epsilon, rng);
        let improved = match &best {
            Some(b) => result.compactness < b.compactness,
            None => true,
        };
        if improved {
            best = Some(result);
        }
    }

    best.expect("at least one attempt")
}

fn kmeans_attempt(
    samples: &[[f32; 3]],
    k: usize,
    max_iterations: u32,
    epsilon: f32,
    rng: &mut StdRng,
) -> Clustering {
    let mut centroids: Vec<[f32; 3]> = (0..k)
        .map(|_| samples[rng.random_range(0..samples.len())])
        .collect();
    let mut labels = vec![0usize; samples.len()];

    for _ in 0..max_iterations {
        for (label, sample) in labels.iter_mut().zip(samples) {
            *label = nearest(sample, &centroids);
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (label, sample) in labels.iter().zip(samples) {
            for c in 0..3 {
                sums[*label][c] += f64::from(sample[c]);
            }
            counts[*label] += 1;
        }

        let mut max_shift = 0.0f32;
        for cluster in 0..k {
            let updated = if counts[cluster] == 0 {
                // Re-seed an empty cluster from a random sample.
                samples[rng.random_range(0..samples.len())]
            } else {
                let n = counts[cluster] as f64;
                [
                    (sums[cluster][0] / n) as f32,
                    (sums[cluster][1] / n) as f32,
                    (sums[cluster][2] / n) as f32,
                ]
            };
            max_shift = max_shift.max(distance_sq(&centroids[cluster], &updated).sqrt());
            centroids[cluster] = updated;
        }

        if max_shift < epsilon {
            break;
        }
    }

    // Final assignment against the converged centroids.
    let mut compactness = 0.0f64;
    for (label, sample) in labels.iter_mut().zip(samples) {
        *label = nearest(sample, &centroids);
        compactness += f64::from(distance_sq(sample, &centroids[*label]));
    }

    Clustering {
        labels,
        centroids,
        compactness,
    }
}

fn nearest(sample: &[f32; 3], centroids: &[[f32; 3]]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = distance_sq(sample, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

fn distance_sq(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let mut sum = 0.0;
    for c in 0..3 {
        let d = a[c] - b[c];
        sum += d * d;
    }
    sum
}

/// Posterize a color image: cluster its pixels into `k` colors and replace
/// each pixel with its centroid color (truncated to u8).
pub fn kmeans_quantize(
    img: &RgbImage,
    k: usize,
    max_iterations: u32,
    epsilon: f32,
    attempts: u32,
    seed: Option<u64>,
) -> RgbImage {
    let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    let samples: Vec<[f32; 3]> = img
        .pixels()
        .map(|p| [f32::from(p[0]), f32::from(p[1]), f32::from(p[2])])
        .collect();

    let clustering = kmeans(&samples, k, max_iterations, epsilon, attempts, &mut rng);

    let palette: Vec<image::Rgb<u8>> = clustering
        .centroids
        .iter()
        .map(|c| {
            image::Rgb([
                c[0].clamp(0.0, 255.0) as u8,
                c[1].clamp(0.0, 255.0) as u8,
                c[2].clamp(0.0, 255.0) as u8,
            ])
        })
        .collect();

    let mut out = RgbImage::new(img.width(), img.height());
    for (pixel, label) in out.pixels_mut().zip(&clustering.labels) {
        *pixel = palette[*label];
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn two_tone_image() -> RgbImage {
        RgbImage::from_fn(12, 8, |x, _| {
            if x < 6 {
                image::Rgb([10, 20, 30])
            } else {
                image::Rgb([200, 210, 220])
            }
        })
    }

    #[test]
    fn test_two_clusters_recover_group_means() {
        let samples = vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [100.0, 100.0, 100.0],
            [102.0, 100.0, 100.0],
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let result = kmeans(&samples, 2, 10, 0.01, 10, &mut rng);

        let mut centroids = result.centroids.clone();
        centroids.sort_by(|a, b| a[0].total_cmp(&b[0]));
        assert!((centroids[0][0] - 1.0).abs() < 1e-3);
        assert!((centroids[1][0] - 101.0).abs() < 1e-3);
        assert_eq!(result.labels[0], result.labels[1]);
        assert_eq!(result.labels[2], result.labels[3]);
        assert_ne!(result.labels[0], result.labels[2]);
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let img = two_tone_image();
        let a = kmeans_quantize(&img, 5, 10, 1.0, 10, Some(42));
        let b = kmeans_quantize(&img, 5, 10, 1.0, 10, Some(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_palette_bounded_by_k() {
        let img = RgbImage::from_fn(16, 16, |x, y| {
            image::Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8])
        });
        let quantized = kmeans_quantize(&img, 5, 10, 1.0, 10, Some(1));

        let colors: HashSet<_> = quantized.pixels().map(|p| p.0).collect();
        assert!(colors.len() <= 5);
        assert_eq!(quantized.dimensions(), img.dimensions());
    }

    #[test]
    fn test_single_cluster_is_mean_color() {
        let img = two_tone_image();
        let quantized = kmeans_quantize(&img, 1, 10, 1.0, 3, Some(3));
        let colors: HashSet<_> = quantized.pixels().map(|p| p.0).collect();
        assert_eq!(colors.len(), 1);
        // Mean of the two tones, truncated.
        assert!(colors.contains(&[105, 115, 125]));
    }
}
