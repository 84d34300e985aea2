//! The generator network: a fixed encoder / residual-transformer / decoder
//! graph expressed as an explicit sequence of owned transform stages.
//!
//! The topology must match the pretrained CartoonGAN checkpoints exactly:
//! three encoder stages (3 -> 64 -> 128 -> 256 channels, the last two
//! downsampling by stride 2), eight residual blocks at 256 channels, and a
//! mirrored decoder back to 3 channels with a tanh output.

mod norm;
pub mod ops;

pub use norm::{InstanceNorm2d, INSTANCE_NORM_EPS};

use ndarray::{Array1, Array4};

use ops::{conv2d, conv_transpose2d, reflect_pad, relu, tanh};

/// Number of residual blocks at the bottleneck resolution.
pub const NUM_RES_BLOCKS: usize = 8;

/// Channel widths of the three encoder stages.
pub const ENCODER_WIDTHS: [usize; 3] = [64, 128, 256];

/// A convolution stage with owned weights.
#[derive(Debug, Clone)]
pub struct Conv2d {
    pub weight: Array4<f32>,
    pub bias: Array1<f32>,
    pub stride: usize,
    pub padding: usize,
}

impl Conv2d {
    pub fn forward(&self, x: &Array4<f32>) -> Array4<f32> {
        conv2d(x, &self.weight, &self.bias, self.stride, self.padding)
    }
}

/// A transposed-convolution stage with owned weights.
#[derive(Debug, Clone)]
pub struct ConvTranspose2d {
    pub weight: Array4<f32>,
    pub bias: Array1<f32>,
    pub stride: usize,
    pub padding: usize,
    pub output_padding: usize,
}

impl ConvTranspose2d {
    pub fn forward(&self, x: &Array4<f32>) -> Array4<f32> {
        conv_transpose2d(
            x,
            &self.weight,
            &self.bias,
            self.stride,
            self.padding,
            self.output_padding,
        )
    }
}

/// One residual block: two reflect-padded 3x3 convolutions with instance
/// normalization, a ReLU between them, and an identity skip connection.
#[derive(Debug, Clone)]
pub struct ResidualBlock {
    pub conv1: Conv2d,
    pub norm1: InstanceNorm2d,
    pub conv2: Conv2d,
    pub norm2: InstanceNorm2d,
}

impl ResidualBlock {
    pub fn forward(&self, x: &Array4<f32>) -> Array4<f32> {
        let y = relu(&self.norm1.forward(&self.conv1.forward(&reflect_pad(x, 1))));
        let y = self.norm2.forward(&self.conv2.forward(&reflect_pad(&y, 1)));
        y + x
    }
}

/// The full image-to-image generator.
#[derive(Debug, Clone)]
pub struct Generator {
    pub conv_in: Conv2d,
    pub norm_in: InstanceNorm2d,

    pub down1_a: Conv2d,
    pub down1_b: Conv2d,
    pub norm_down1: InstanceNorm2d,

    pub down2_a: Conv2d,
    pub down2_b: Conv2d,
    pub norm_down2: InstanceNorm2d,

    pub blocks: Vec<ResidualBlock>,

    pub up1_a: ConvTranspose2d,
    pub up1_b: Conv2d,
    pub norm_up1: InstanceNorm2d,

    pub up2_a: ConvTranspose2d,
    pub up2_b: Conv2d,
    pub norm_up2: InstanceNorm2d,

    pub conv_out: Conv2d,
}

impl Generator {
    /// Run the forward pass. Inference only; no gradient machinery exists.
    ///
    /// Spatial dimensions divisible by four are restored exactly by the
    /// decoder's two stride-2 upsampling stages.
    pub fn forward(&self, x: &Array4<f32>) -> Array4<f32> {
        let y = relu(&self.norm_in.forward(&self.conv_in.forward(&reflect_pad(x, 3))));
        let y = relu(
            &self
                .norm_down1
                .forward(&self.down1_b.forward(&self.down1_a.forward(&y))),
        );
        let mut y = relu(
            &self
                .norm_down2
                .forward(&self.down2_b.forward(&self.down2_a.forward(&y))),
        );

        for block in &self.blocks {
            y = block.forward(&y);
        }

        let y = relu(
            &self
                .norm_up1
                .forward(&self.up1_b.forward(&self.up1_a.forward(&y))),
        );
        let y = relu(
            &self
                .norm_up2
                .forward(&self.up2_b.forward(&self.up2_a.forward(&y))),
        );

        tanh(&self.conv_out.forward(&reflect_pad(&y, 3)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Random-weight construction of the real topology for tests.

    use super::*;
    use rand::rngs::StdRng;
    use rand::Rng;

    pub(crate) fn rand_array4(
        rng: &mut StdRng,
        shape: (usize, usize, usize, usize),
    ) -> Array4<f32> {
        Array4::from_shape_fn(shape, |_| (rng.random::<f32>() - 0.5) * 0.2)
    }

    pub(crate) fn rand_array1(rng: &mut StdRng, len: usize) -> Array1<f32> {
        Array1::from_shape_fn(len, |_| (rng.random::<f32>() - 0.5) * 0.2)
    }

    pub(crate) fn conv(
        rng: &mut StdRng,
        out_c: usize,
        in_c: usize,
        k: usize,
        stride: usize,
        padding: usize,
    ) -> Conv2d {
        Conv2d {
            weight: rand_array4(rng, (out_c, in_c, k, k)),
            bias: rand_array1(rng, out_c),
            stride,
            padding,
        }
    }

    pub(crate) fn deconv(rng: &mut StdRng, in_c: usize, out_c: usize) -> ConvTranspose2d {
        ConvTranspose2d {
            weight: rand_array4(rng, (in_c, out_c, 3, 3)),
            bias: rand_array1(rng, out_c),
            stride: 2,
            padding: 1,
            output_padding: 1,
        }
    }

    pub(crate) fn norm(rng: &mut StdRng, dim: usize) -> InstanceNorm2d {
        InstanceNorm2d::new(rand_array1(rng, dim), rand_array1(rng, dim))
    }

    pub(crate) fn random_generator(rng: &mut StdRng) -> Generator {
        let [w1, w2, w3] = ENCODER_WIDTHS;

        let blocks = (0..NUM_RES_BLOCKS)
            .map(|_| ResidualBlock {
                conv1: conv(rng, w3, w3, 3, 1, 0),
                norm1: norm(rng, w3),
                conv2: conv(rng, w3, w3, 3, 1, 0),
                norm2: norm(rng, w3),
            })
            .collect();

        Generator {
            conv_in: conv(rng, w1, 3, 7, 1, 0),
            norm_in: norm(rng, w1),
            down1_a: conv(rng, w2, w1, 3, 2, 1),
            down1_b: conv(rng, w2, w2, 3, 1, 1),
            norm_down1: norm(rng, w2),
            down2_a: conv(rng, w3, w2, 3, 2, 1),
            down2_b: conv(rng, w3, w3, 3, 1, 1),
            norm_down2: norm(rng, w3),
            blocks,
            up1_a: deconv(rng, w3, w2),
            up1_b: conv(rng, w2, w2, 3, 1, 1),
            norm_up1: norm(rng, w2),
            up2_a: deconv(rng, w2, w1),
            up2_b: conv(rng, w1, w1, 3, 1, 1),
            norm_up2: norm(rng, w1),
            conv_out: conv(rng, 3, w1, 7, 1, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{conv, norm, rand_array4, random_generator};
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_residual_block_preserves_shape() {
        let mut rng = StdRng::seed_from_u64(11);
        let block = ResidualBlock {
            conv1: conv(&mut rng, 4, 4, 3, 1, 0),
            norm1: norm(&mut rng, 4),
            conv2: conv(&mut rng, 4, 4, 3, 1, 0),
            norm2: norm(&mut rng, 4),
        };
        let x = rand_array4(&mut rng, (1, 4, 6, 5));
        assert_eq!(block.forward(&x).dim(), (1, 4, 6, 5));
    }

    #[test]
    fn test_residual_block_zero_weights_is_identity() {
        // With all-zero convolution weights and zero norm scale, the block
        // contributes nothing and the skip connection passes x through.
        let zero_conv = Conv2d {
            weight: Array4::zeros((4, 4, 3, 3)),
            bias: Array1::zeros(4),
            stride: 1,
            padding: 0,
        };
        let zero_norm = InstanceNorm2d::new(Array1::zeros(4), Array1::zeros(4));
        let block = ResidualBlock {
            conv1: zero_conv.clone(),
            norm1: zero_norm.clone(),
            conv2: zero_conv,
            norm2: zero_norm,
        };

        let mut rng = StdRng::seed_from_u64(3);
        let x = rand_array4(&mut rng, (1, 4, 5, 5));
        let out = block.forward(&x);
        for (a, b) in out.iter().zip(x.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_forward_restores_spatial_dimensions() {
        let mut rng = StdRng::seed_from_u64(99);
        let generator = random_generator(&mut rng);

        let x = rand_array4(&mut rng, (1, 3, 8, 12));
        let out = generator.forward(&x);

        assert_eq!(out.dim(), (1, 3, 8, 12));
        assert!(out.iter().all(|v| (-1.0..=1.0).contains(v)));
    }
}
