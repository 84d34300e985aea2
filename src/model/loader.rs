//! Pretrained weight loading.
//!
//! Weight archives are safetensors files whose tensor names follow the
//! original checkpoint state dicts (`conv01_1.weight`, `in01_1.scale`, ...).
//! Every tensor is verified against the declared architecture shape at load
//! time; the archive is otherwise treated as an opaque immutable parameter
//! set.

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array4};
use safetensors::tensor::{Dtype, SafeTensors, TensorView};

use crate::error::{Error, Result};
use crate::net::{
    Conv2d, ConvTranspose2d, Generator, InstanceNorm2d, ResidualBlock, ENCODER_WIDTHS,
    NUM_RES_BLOCKS,
};

/// Load a generator from a safetensors weight archive.
///
/// # Errors
///
/// Returns [`Error::WeightLoad`] if the archive cannot be read or a tensor
/// is missing, and [`Error::WeightLoadMismatch`] if any tensor's shape does
/// not match the architecture.
pub fn load_generator<P: AsRef<Path>>(path: P) -> Result<Generator> {
    let path = path.as_ref();

    let bytes = fs::read(path).map_err(|source| Error::WeightLoad {
        path: path.to_path_buf(),
        reason: source.to_string(),
    })?;

    let archive = SafeTensors::deserialize(&bytes).map_err(|source| Error::WeightLoad {
        path: path.to_path_buf(),
        reason: source.to_string(),
    })?;

    Loader {
        archive,
        path,
    }
    .generator()
}

struct Loader<'a> {
    archive: SafeTensors<'a>,
    path: &'a Path,
}

impl Loader<'_> {
    /// Materialize every stage, in architecture order.
    fn generator(&self) -> Result<Generator> {
        let [w1, w2, w3] = ENCODER_WIDTHS;

        let conv_in = self.conv("conv01_1", w1, 3, 7, 1, 0)?;
        let norm_in = self.norm("in01_1", w1)?;
        let down1_a = self.conv("conv02_1", w2, w1, 3, 2, 1)?;
        let down1_b = self.conv("conv02_2", w2, w2, 3, 1, 1)?;
        let norm_down1 = self.norm("in02_1", w2)?;
        let down2_a = self.conv("conv03_1", w3, w2, 3, 2, 1)?;
        let down2_b = self.conv("conv03_2", w3, w3, 3, 1, 1)?;
        let norm_down2 = self.norm("in03_1", w3)?;

        let blocks = (0..NUM_RES_BLOCKS)
            .map(|i| self.residual_block(i + 4))
            .collect::<Result<Vec<_>>>()?;

        Ok(Generator {
            conv_in,
            norm_in,
            down1_a,
            down1_b,
            norm_down1,
            down2_a,
            down2_b,
            norm_down2,
            blocks,
            up1_a: self.deconv("deconv01_1", w3, w2)?,
            up1_b: self.conv("deconv01_2", w2, w2, 3, 1, 1)?,
            norm_up1: self.norm("in12_1", w2)?,
            up2_a: self.deconv("deconv02_1", w2, w1)?,
            up2_b: self.conv("deconv02_2", w1, w1, 3, 1, 1)?,
            norm_up2: self.norm("in13_1", w1)?,
            conv_out: self.conv("deconv03_1", 3, w1, 7, 1, 0)?,
        })
    }

    fn residual_block(&self, index: usize) -> Result<ResidualBlock> {
        let [_, _, w] = ENCODER_WIDTHS;
        Ok(ResidualBlock {
            conv1: self.conv(&format!("conv{index:02}_1"), w, w, 3, 1, 0)?,
            norm1: self.norm(&format!("in{index:02}_1"), w)?,
            conv2: self.conv(&format!("conv{index:02}_2"), w, w, 3, 1, 0)?,
            norm2: self.norm(&format!("in{index:02}_2"), w)?,
        })
    }

    fn conv(
        &self,
        name: &str,
        out_c: usize,
        in_c: usize,
        kernel: usize,
        stride: usize,
        padding: usize,
    ) -> Result<Conv2d> {
        Ok(Conv2d {
            weight: self.array4(&format!("{name}.weight"), [out_c, in_c, kernel, kernel])?,
            bias: self.array1(&format!("{name}.bias"), out_c)?,
            stride,
            padding,
        })
    }

    /// Transposed convolutions store weights as (in, out, kh, kw).
    fn deconv(&self, name: &str, in_c: usize, out_c: usize) -> Result<ConvTranspose2d> {
        Ok(ConvTranspose2d {
            weight: self.array4(&format!("{name}.weight"), [in_c, out_c, 3, 3])?,
            bias: self.array1(&format!("{name}.bias"), out_c)?,
            stride: 2,
            padding: 1,
            output_padding: 1,
        })
    }

    fn norm(&self, name: &str, dim: usize) -> Result<InstanceNorm2d> {
        Ok(InstanceNorm2d::new(
            self.array1(&format!("{name}.scale"), dim)?,
            self.array1(&format!("{name}.shift"), dim)?,
        ))
    }

    fn array4(&self, name: &str, expected: [usize; 4]) -> Result<Array4<f32>> {
        let data = self.values(name, &expected)?;
        Ok(Array4::from_shape_vec(
            (expected[0], expected[1], expected[2], expected[3]),
            data,
        )
        .expect("shape verified against element count"))
    }

    fn array1(&self, name: &str, expected: usize) -> Result<Array1<f32>> {
        let data = self.values(name, &[expected])?;
        Ok(Array1::from_vec(data))
    }

    /// Fetch a tensor, verify dtype and shape, and decode to f32 values.
    fn values(&self, name: &str, expected: &[usize]) -> Result<Vec<f32>> {
        let view = self
            .archive
            .tensor(name)
            .map_err(|source| Error::WeightLoad {
                path: self.path.to_path_buf(),
                reason: format!("missing tensor {name}: {source}"),
            })?;

        if view.dtype() != Dtype::F32 {
            return Err(Error::WeightLoad {
                path: self.path.to_path_buf(),
                reason: format!("tensor {name} has dtype {:?}, expected F32", view.dtype()),
            });
        }

        if view.shape() != expected {
            return Err(Error::WeightLoadMismatch {
                name: name.to_string(),
                expected: expected.to_vec(),
                actual: view.shape().to_vec(),
            });
        }

        Ok(decode_f32(&view))
    }
}

fn decode_f32(view: &TensorView<'_>) -> Vec<f32> {
    view.data()
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn write_archive(tensors: Vec<(String, Vec<usize>, Vec<f32>)>) -> tempfile::NamedTempFile {
        let buffers: Vec<(String, Vec<usize>, Vec<u8>)> = tensors
            .into_iter()
            .map(|(name, shape, values)| (name, shape, f32_bytes(&values)))
            .collect();

        let views: HashMap<String, TensorView<'_>> = buffers
            .iter()
            .map(|(name, shape, bytes)| {
                (
                    name.clone(),
                    TensorView::new(Dtype::F32, shape.clone(), bytes).expect("valid view"),
                )
            })
            .collect();

        let serialized = safetensors::serialize(&views, &None).expect("serialize");

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(&serialized).expect("write archive");
        file
    }

    #[test]
    fn test_missing_archive_is_weight_load_error() {
        let err = load_generator("/nonexistent/Shinkai_net_G_float.safetensors").unwrap_err();
        assert!(matches!(err, Error::WeightLoad { .. }));
    }

    #[test]
    fn test_garbage_archive_is_weight_load_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a safetensors archive").unwrap();
        let err = load_generator(file.path()).unwrap_err();
        assert!(matches!(err, Error::WeightLoad { .. }));
    }

    #[test]
    fn test_wrong_shape_is_mismatch_error() {
        // conv01_1 must be (64, 3, 7, 7); offer a 1x1 kernel instead.
        let file = write_archive(vec![
            (
                "conv01_1.weight".to_string(),
                vec![64, 3, 1, 1],
                vec![0.0; 64 * 3],
            ),
            ("conv01_1.bias".to_string(), vec![64], vec![0.0; 64]),
        ]);

        let err = load_generator(file.path()).unwrap_err();
        match err {
            Error::WeightLoadMismatch {
                name,
                expected,
                actual,
            } => {
                assert_eq!(name, "conv01_1.weight");
                assert_eq!(expected, vec![64, 3, 7, 7]);
                assert_eq!(actual, vec![64, 3, 1, 1]);
            }
            other => panic!("expected WeightLoadMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_tensor_is_weight_load_error() {
        let file = write_archive(vec![(
            "conv01_1.weight".to_string(),
            vec![64, 3, 7, 7],
            vec![0.0; 64 * 3 * 7 * 7],
        )]);

        // conv01_1.bias is absent.
        let err = load_generator(file.path()).unwrap_err();
        assert!(matches!(err, Error::WeightLoad { .. }));
    }

    #[test]
    fn test_decode_f32_round_trip() {
        let values = vec![0.0f32, -1.5, 3.25, f32::MIN_POSITIVE];
        let bytes = f32_bytes(&values);
        let view = TensorView::new(Dtype::F32, vec![4], &bytes).unwrap();
        assert_eq!(decode_f32(&view), values);
    }
}
