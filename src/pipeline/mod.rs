//! The two stylization pipelines: the classical cartoon filter chain and
//! generator-network inference.

mod cartoon;
mod stylize;

pub use cartoon::{CartoonConfig, CartoonPipeline};
pub use stylize::{StylizeConfig, StylizePipeline};
