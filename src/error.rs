// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use thiserror::Error;

/// Errors surfaced by composition, saturation repair and output encoding.
/// Numeric edge cases inside the per-pixel math (zero intensity, overflowing
/// stretches) are clamped locally and never reported here.
#[derive(Debug, Error)]
pub enum RgbError {
    /// The three bands do not share the same width and height.
    #[error("each of the RGB bands must be the same size: \
             {}x{} {}x{} {}x{}", .red.0, .red.1, .green.0, .green.1, .blue.0, .blue.1)]
    DimensionMismatch {
        red: (u32, u32),
        green: (u32, u32),
        blue: (u32, u32),
    },

    /// A plane was combined with another plane of a different size.
    #[error("plane size mismatch: expected {}x{}, got {}x{}",
            .expected.0, .expected.1, .actual.0, .actual.1)]
    SizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// The output path does not name a format we can encode.
    #[error("unrecognised file type: {0}")]
    UnsupportedFormat(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, RgbError>;
