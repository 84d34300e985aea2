//! Tensor operations for the generator network.
//!
//! All operations take and return NCHW `Array4<f32>` tensors and run on the
//! calling thread. Shapes follow the standard convolution arithmetic:
//! `out = (in + 2 * padding - kernel) / stride + 1` for convolution and
//! `out = (in - 1) * stride - 2 * padding + kernel + output_padding` for
//! transposed convolution.

use ndarray::{Array1, Array4};

/// Pad spatially by `pad` pixels with mirror reflection (the edge row/column
/// itself is not duplicated).
pub fn reflect_pad(x: &Array4<f32>, pad: usize) -> Array4<f32> {
    let (n, c, h, w) = x.dim();

    Array4::from_shape_fn((n, c, h + 2 * pad, w + 2 * pad), |(b, ch, y, xx)| {
        let sy = reflect_index(y as isize - pad as isize, h);
        let sx = reflect_index(xx as isize - pad as isize, w);
        x[[b, ch, sy, sx]]
    })
}

/// Fold an out-of-range index back into `0..len` by reflection. Total for
/// every `len >= 1` and any padding amount; a single-element axis replicates.
fn reflect_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let mut m = i.rem_euclid(period);
    if m >= len as isize {
        m = period - m;
    }
    m as usize
}

/// 2-D convolution with zero padding.
///
/// `weight` has shape (out_channels, in_channels, kh, kw); `bias` has one
/// entry per output channel.
pub fn conv2d(
    x: &Array4<f32>,
    weight: &Array4<f32>,
    bias: &Array1<f32>,
    stride: usize,
    padding: usize,
) -> Array4<f32> {
    let (n, in_c, in_h, in_w) = x.dim();
    let (out_c, _, kh, kw) = weight.dim();

    let out_h = (in_h + 2 * padding - kh) / stride + 1;
    let out_w = (in_w + 2 * padding - kw) / stride + 1;

    let mut out = Array4::<f32>::zeros((n, out_c, out_h, out_w));

    for b in 0..n {
        for oc in 0..out_c {
            for oy in 0..out_h {
                for ox in 0..out_w {
                    let mut acc = bias[oc];
                    for ic in 0..in_c {
                        for ky in 0..kh {
                            let iy = (oy * stride + ky) as isize - padding as isize;
                            if iy < 0 || iy >= in_h as isize {
                                continue;
                            }
                            for kx in 0..kw {
                                let ix = (ox * stride + kx) as isize - padding as isize;
                                if ix < 0 || ix >= in_w as isize {
                                    continue;
                                }
                                acc += x[[b, ic, iy as usize, ix as usize]]
                                    * weight[[oc, ic, ky, kx]];
                            }
                        }
                    }
                    out[[b, oc, oy, ox]] = acc;
                }
            }
        }
    }

    out
}

/// 2-D transposed convolution.
///
/// `weight` has shape (in_channels, out_channels, kh, kw), matching the
/// layout of the pretrained checkpoints. Each input pixel scatters its
/// weighted kernel into the output.
pub fn conv_transpose2d(
    x: &Array4<f32>,
    weight: &Array4<f32>,
    bias: &Array1<f32>,
    stride: usize,
    padding: usize,
    output_padding: usize,
) -> Array4<f32> {
    let (n, in_c, in_h, in_w) = x.dim();
    let (_, out_c, kh, kw) = weight.dim();

    let out_h = (in_h - 1) * stride + kh + output_padding - 2 * padding;
    let out_w = (in_w - 1) * stride + kw + output_padding - 2 * padding;

    let mut out = Array4::<f32>::zeros((n, out_c, out_h, out_w));

    for b in 0..n {
        for oc in 0..out_c {
            out.slice_mut(ndarray::s![b, oc, .., ..]).fill(bias[oc]);
        }

        for ic in 0..in_c {
            for iy in 0..in_h {
                for ix in 0..in_w {
                    let value = x[[b, ic, iy, ix]];
                    for oc in 0..out_c {
                        for ky in 0..kh {
                            let oy = (iy * stride + ky) as isize - padding as isize;
                            if oy < 0 || oy >= out_h as isize {
                                continue;
                            }
                            for kx in 0..kw {
                                let ox = (ix * stride + kx) as isize - padding as isize;
                                if ox < 0 || ox >= out_w as isize {
                                    continue;
                                }
                                out[[b, oc, oy as usize, ox as usize]] +=
                                    value * weight[[ic, oc, ky, kx]];
                            }
                        }
                    }
                }
            }
        }
    }

    out
}

/// Elementwise rectified linear unit.
pub fn relu(x: &Array4<f32>) -> Array4<f32> {
    x.mapv(|v| v.max(0.0))
}

/// Elementwise hyperbolic tangent, bounding values to (-1, 1).
pub fn tanh(x: &Array4<f32>) -> Array4<f32> {
    x.mapv(f32::tanh)
}
