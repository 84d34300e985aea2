//! # cartoonify
//!
//! Cartoon-style image stylization, two ways: a classical-vision filter
//! chain (bilateral smoothing, adaptive edge masking, morphology, K-means
//! color quantization) and inference through pretrained CartoonGAN-style
//! generator networks, one per trained style.
//!
//! ## Example
//!
//! ```no_run
//! use cartoonify::{CartoonConfig, CartoonPipeline};
//!
//! # fn main() -> cartoonify::Result<()> {
//! let pipeline = CartoonPipeline::new(CartoonConfig::default())?;
//! let cartoon = pipeline.process("photo.jpg")?;
//! cartoonify::image::save_image(&cartoon, "cartoon.png", 95)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod filter;
pub mod image;
pub mod model;
pub mod net;
pub mod pipeline;

pub use error::{Error, Result};
pub use model::{Device, Style, StyleRegistry};
pub use pipeline::{CartoonConfig, CartoonPipeline, StylizeConfig, StylizePipeline};
