//! Codec seam: image metadata plus the decoder and encoder traits.
//!
//! The pipeline only talks to codecs through [`ScanlineDecoder`] and
//! [`ScanlineEncoder`]. Releasing codec state is `Drop`.

pub mod jfif;
pub mod jpeg;

pub use crate::error::CodecError;
pub use jpeg::{JpegScanlineDecoder, JpegScanlineEncoder};

/// Colour space of decoded or encoded samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Grayscale,
    Rgb,
    Unknown,
}

/// JFIF density unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DensityUnit {
    /// No unit, `x:y` is the pixel aspect ratio
    #[default]
    AspectRatio,
    PerInch,
    PerCentimeter,
}

impl DensityUnit {
    /// Map a JFIF unit code (0, 1, 2). Unknown codes become `AspectRatio`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => DensityUnit::PerInch,
            2 => DensityUnit::PerCentimeter,
            _ => DensityUnit::AspectRatio,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            DensityUnit::AspectRatio => 0,
            DensityUnit::PerInch => 1,
            DensityUnit::PerCentimeter => 2,
        }
    }
}

/// Resolution metadata. Copied, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Density {
    pub unit: DensityUnit,
    pub x: u16,
    pub y: u16,
}

impl Default for Density {
    fn default() -> Self {
        Self {
            unit: DensityUnit::AspectRatio,
            x: 1,
            y: 1,
        }
    }
}

/// Metadata describing an image, independent of its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub width: u32,
    pub height: u32,
    pub components: u8,
    pub color_space: ColorSpace,
    pub density: Density,
}

impl ImageDescriptor {
    /// Bytes per scanline.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.components as usize
    }
}

/// Source of decoded scanlines.
pub trait ScanlineDecoder {
    /// Parse the stream header.
    fn read_header(&mut self) -> Result<ImageDescriptor, CodecError>;

    /// Begin decompression. Must follow `read_header`.
    fn start(&mut self) -> Result<(), CodecError>;

    /// Decode up to `rows.len() / row_len` whole scanlines into `rows` and
    /// return how many were written. May deliver fewer than requested.
    fn read_scanlines(&mut self, rows: &mut [u8]) -> Result<usize, CodecError>;

    /// Scanlines delivered so far.
    fn output_scanline(&self) -> u32;

    fn finish(&mut self) -> Result<(), CodecError>;
}

/// Sink for scanlines to be encoded.
pub trait ScanlineEncoder {
    fn configure(&mut self, descriptor: &ImageDescriptor) -> Result<(), CodecError>;

    fn start(&mut self) -> Result<(), CodecError>;

    /// Accept the next scanline, top to bottom.
    fn write_scanline(&mut self, row: &[u8]) -> Result<(), CodecError>;

    /// Flush all encoded data to the underlying writer.
    fn finish(&mut self) -> Result<(), CodecError>;
}

impl<D: ScanlineDecoder + ?Sized> ScanlineDecoder for &mut D {
    fn read_header(&mut self) -> Result<ImageDescriptor, CodecError> {
        (**self).read_header()
    }
    fn start(&mut self) -> Result<(), CodecError> {
        (**self).start()
    }
    fn read_scanlines(&mut self, rows: &mut [u8]) -> Result<usize, CodecError> {
        (**self).read_scanlines(rows)
    }
    fn output_scanline(&self) -> u32 {
        (**self).output_scanline()
    }
    fn finish(&mut self) -> Result<(), CodecError> {
        (**self).finish()
    }
}

impl<E: ScanlineEncoder + ?Sized> ScanlineEncoder for &mut E {
    fn configure(&mut self, descriptor: &ImageDescriptor) -> Result<(), CodecError> {
        (**self).configure(descriptor)
    }
    fn start(&mut self) -> Result<(), CodecError> {
        (**self).start()
    }
    fn write_scanline(&mut self, row: &[u8]) -> Result<(), CodecError> {
        (**self).write_scanline(row)
    }
    fn finish(&mut self) -> Result<(), CodecError> {
        (**self).finish()
    }
}
