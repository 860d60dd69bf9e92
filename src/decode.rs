//! Decode stage: header parsing and scanline delivery into the buffer.

use std::path::{Path, PathBuf};

use crate::buffer::{BufferLayout, ScanlineBuffer};
use crate::codec::{ColorSpace, ImageDescriptor, ScanlineDecoder};
use crate::error::GrayscaleError;
use crate::luminance::{OUTPUT_COMPONENTS, SOURCE_COMPONENTS};

/// Drives a [`ScanlineDecoder`] for one input file.
pub struct DecodeDriver<D> {
    decoder: D,
    path: PathBuf,
    descriptor: Option<ImageDescriptor>,
}

impl<D: ScanlineDecoder> DecodeDriver<D> {
    pub fn new(decoder: D, path: &Path) -> Self {
        Self {
            decoder,
            path: path.to_path_buf(),
            descriptor: None,
        }
    }

    /// Parse the header and check it describes an 8-bit RGB image.
    pub fn read_header(&mut self) -> Result<ImageDescriptor, GrayscaleError> {
        let descriptor = self
            .decoder
            .read_header()
            .map_err(|source| self.header_error(source))?;

        if descriptor.components as usize != SOURCE_COMPONENTS
            || descriptor.color_space != ColorSpace::Rgb
        {
            return Err(self.header_error(
                format!(
                    "expected a {}-component RGB image, found {} component(s) ({:?})",
                    SOURCE_COMPONENTS, descriptor.components, descriptor.color_space
                )
                .into(),
            ));
        }
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(self.header_error(
                format!(
                    "image has empty dimensions {}x{}",
                    descriptor.width, descriptor.height
                )
                .into(),
            ));
        }

        self.descriptor = Some(descriptor);
        Ok(descriptor)
    }

    /// Buffer geometry for the decoded image and its grayscale output.
    pub fn layout(&self) -> Result<BufferLayout, GrayscaleError> {
        let descriptor = self.descriptor.ok_or_else(|| {
            self.header_error("buffer layout requested before the header was read".into())
        })?;
        BufferLayout::new(
            descriptor.height as usize,
            descriptor.row_len(),
            descriptor.width as usize * OUTPUT_COMPONENTS,
        )
    }

    /// Fill the source region of `buffer` with every scanline.
    ///
    /// Keeps asking the decoder for the remaining rows until it reports the
    /// full image height delivered.
    pub fn decode_into(&mut self, buffer: &mut ScanlineBuffer) -> Result<(), GrayscaleError> {
        let descriptor = self.descriptor.ok_or_else(|| {
            self.header_error("decode started before the header was read".into())
        })?;
        let height = descriptor.height as usize;
        if buffer.layout().height != height {
            return Err(GrayscaleError::mismatch(
                "buffer row count",
                height,
                buffer.layout().height,
            ));
        }
        if buffer.layout().source_row_len != descriptor.row_len() {
            return Err(GrayscaleError::mismatch(
                "buffer source row length",
                descriptor.row_len(),
                buffer.layout().source_row_len,
            ));
        }

        self.decoder
            .start()
            .map_err(|source| self.read_error(source))?;

        while (self.decoder.output_scanline() as usize) < height {
            let next = self.decoder.output_scanline() as usize;
            let requested = height - next;
            let rows = buffer.source_rows_from_mut(next);
            let delivered = self
                .decoder
                .read_scanlines(rows)
                .map_err(|source| self.read_error(source))?;
            if delivered == 0 {
                return Err(self.read_error(
                    format!("decoder stalled at scanline {next} of {height}").into(),
                ));
            }
            if delivered > requested {
                return Err(GrayscaleError::mismatch(
                    "scanlines delivered",
                    requested,
                    delivered,
                ));
            }
            if self.decoder.output_scanline() as usize != next + delivered {
                return Err(GrayscaleError::mismatch(
                    "decoder scanline counter",
                    next + delivered,
                    self.decoder.output_scanline() as usize,
                ));
            }
            log::trace!("decoded scanlines {}..{}", next, next + delivered);
        }

        self.decoder
            .finish()
            .map_err(|source| self.read_error(source))?;
        log::debug!("decoded {} scanlines from {}", height, self.path.display());
        Ok(())
    }

    fn header_error(&self, source: crate::error::CodecError) -> GrayscaleError {
        GrayscaleError::DecodeHeader {
            path: self.path.clone(),
            source,
        }
    }

    fn read_error(&self, source: crate::error::CodecError) -> GrayscaleError {
        GrayscaleError::DecodeRead {
            path: self.path.clone(),
            source,
        }
    }
}
