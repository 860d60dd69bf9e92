//! Encode stage: writes the destination rows through a [`ScanlineEncoder`].

use std::path::{Path, PathBuf};

use crate::buffer::ScanlineBuffer;
use crate::codec::{ColorSpace, ImageDescriptor, ScanlineEncoder};
use crate::error::{CodecError, GrayscaleError};
use crate::luminance::OUTPUT_COMPONENTS;

/// Descriptor for the grayscale output of `source`.
///
/// Width, height and density are copied; the colour space and component
/// count are fixed.
pub fn destination_descriptor(source: &ImageDescriptor) -> ImageDescriptor {
    ImageDescriptor {
        width: source.width,
        height: source.height,
        components: OUTPUT_COMPONENTS as u8,
        color_space: ColorSpace::Grayscale,
        density: source.density,
    }
}

/// Drives a [`ScanlineEncoder`] for one output file.
pub struct EncodeDriver<E> {
    encoder: E,
    path: PathBuf,
}

impl<E: ScanlineEncoder> EncodeDriver<E> {
    pub fn new(encoder: E, path: &Path) -> Self {
        Self {
            encoder,
            path: path.to_path_buf(),
        }
    }

    /// Configure the encoder from `source` and write every destination row
    /// of `buffer` in order.
    pub fn encode_from(
        &mut self,
        buffer: &ScanlineBuffer,
        source: &ImageDescriptor,
    ) -> Result<ImageDescriptor, GrayscaleError> {
        let destination = destination_descriptor(source);
        let layout = buffer.layout();
        if layout.height != destination.height as usize {
            return Err(GrayscaleError::mismatch(
                "buffer row count",
                destination.height as usize,
                layout.height,
            ));
        }
        if layout.destination_row_len != destination.row_len() {
            return Err(GrayscaleError::mismatch(
                "buffer destination row length",
                destination.row_len(),
                layout.destination_row_len,
            ));
        }

        self.encoder
            .configure(&destination)
            .map_err(|source| self.write_error(source))?;
        self.encoder
            .start()
            .map_err(|source| self.write_error(source))?;
        for row in 0..layout.height {
            self.encoder
                .write_scanline(buffer.destination_row(row))
                .map_err(|source| self.write_error(source))?;
        }
        self.encoder
            .finish()
            .map_err(|source| self.write_error(source))?;

        log::debug!(
            "encoded {} scanlines to {}",
            layout.height,
            self.path.display()
        );
        Ok(destination)
    }

    fn write_error(&self, source: CodecError) -> GrayscaleError {
        GrayscaleError::EncodeWrite {
            path: self.path.clone(),
            source,
        }
    }
}
