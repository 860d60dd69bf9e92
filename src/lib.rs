//! jpeg-gray library crate.
//!
//! Decodes an RGB JPEG, reduces every scanline to BT.709 luminance and
//! encodes the result as a grayscale JPEG. The binary in `main.rs` is a thin
//! wrapper over [`pipeline::Pipeline`] and the [`cli`] helpers.

pub mod buffer;
pub mod cli;
pub mod codec;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod luminance;
pub mod pipeline;

pub use crate::error::{ErrorKind, GrayscaleError};
pub use crate::pipeline::{Pipeline, PipelineState, Summary, TransformOptions};

use std::path::Path;

/// Convert `input` to a grayscale JPEG at `output`.
pub fn transform_image(
    input: &Path,
    output: &Path,
    options: &TransformOptions,
) -> Result<Summary, GrayscaleError> {
    Pipeline::new(input, output, *options).run()
}
