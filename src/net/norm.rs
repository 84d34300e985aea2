//! Instance normalization.

use ndarray::{Array1, Array4, s};

/// Per-sample, per-channel normalization with a learned affine rescale.
///
/// The mean and *biased* variance (dividing by N, not N - 1) are computed
/// over each channel's own spatial extent, matching the pretrained
/// checkpoints' normalization layers.
#[derive(Debug, Clone)]
pub struct InstanceNorm2d {
    pub scale: Array1<f32>,
    pub shift: Array1<f32>,
    pub eps: f32,
}

/// Numerical-stability constant used by the pretrained networks.
pub const INSTANCE_NORM_EPS: f32 = 1e-9;

impl InstanceNorm2d {
    pub fn new(scale: Array1<f32>, shift: Array1<f32>) -> Self {
        Self {
            scale,
            shift,
            eps: INSTANCE_NORM_EPS,
        }
    }

    pub fn forward(&self, x: &Array4<f32>) -> Array4<f32> {
        let (n, c, h, w) = x.dim();
        let count = (h * w) as f32;

        let mut out = Array4::<f32>::zeros((n, c, h, w));

        for b in 0..n {
            for ch in 0..c {
                let plane = x.slice(s![b, ch, .., ..]);

                let mean = plane.sum() / count;
                let var = plane.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / count;
                let denom = (var + self.eps).sqrt();

                let scale = self.scale[ch];
                let shift = self.shift[ch];

                let mut target = out.slice_mut(s![b, ch, .., ..]);
                target.zip_mut_with(&plane, |o, v| {
                    *o = (v - mean) / denom * scale + shift;
                });
            }
        }

        out
    }
}
