//! Classical image filtering primitives for the cartoon pipeline.

mod bilateral;
mod morphology;
mod quantize;
mod threshold;

pub use bilateral::bilateral_filter;
pub use morphology::{dilate, erode, open};
pub use quantize::{kmeans, kmeans_quantize, Clustering};
pub use threshold::adaptive_threshold;
