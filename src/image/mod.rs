//! Image loading, tensor conversion, and saving utilities.

mod load;
mod save;

pub use load::{fit_dimensions, load_image, open_rgb};
pub use save::{save_image, tensor_to_image};

use ndarray::Array4;

/// Image tensor in NCHW format (batch, channels, height, width).
/// Values are normalized to [-1, 1]; channels are in BGR order, the order
/// the generator networks were trained on.
pub type ImageTensor = Array4<f32>;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Default target size for the longer image edge when resizing for inference.
pub const DEFAULT_LOAD_SIZE: u32 = 450;

/// Reverse the channel order of an NCHW tensor (RGB <-> BGR).
///
/// Applying the reorder twice restores the original order.
pub fn swap_channels(tensor: &ImageTensor) -> ImageTensor {
    let (n, c, h, w) = tensor.dim();
    Array4::from_shape_fn((n, c, h, w), |(b, ch, y, x)| tensor[[b, c - 1 - ch, y, x]])
}
