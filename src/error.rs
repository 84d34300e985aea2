//! Custom error types for cartoonify.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the cartoonify library.
#[derive(Error, Debug)]
pub enum Error {
    /// The input path does not resolve to a decodable image.
    #[error("cannot load input image from {path}: {source}")]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Requested style is not one of the trained styles, or was not loaded.
    #[error("unknown style {name:?} (expected one of: Hosoda, Hayao, Shinkai, Paprika)")]
    UnknownStyle { name: String },

    /// A weight archive could not be read or deserialized.
    #[error("failed to load weights from {path}: {reason}")]
    WeightLoad { path: PathBuf, reason: String },

    /// A weight tensor does not match the declared network architecture.
    #[error("weight tensor {name} has shape {actual:?}, expected {expected:?}")]
    WeightLoadMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Requested an unavailable compute device.
    #[error("configuration error: {reason}")]
    ConfigurationError { reason: String },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cartoonify operations.
pub type Result<T> = std::result::Result<T, Error>;
