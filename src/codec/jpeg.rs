//! JPEG bindings for the codec traits, backed by `image::codecs::jpeg`.

use std::io::{Cursor, Read, Write};

use image::codecs::jpeg::{JpegDecoder, JpegEncoder, PixelDensity, PixelDensityUnit};
use image::{ColorType, ExtendedColorType, ImageDecoder};

use super::jfif;
use super::{
    CodecError, ColorSpace, Density, DensityUnit, ImageDescriptor, ScanlineDecoder,
    ScanlineEncoder,
};

/// Quality used by libjpeg's defaults.
pub const DEFAULT_QUALITY: u8 = 75;

/// Decodes a JPEG stream read from `R`.
///
/// The whole stream is buffered when the header is read; the input reader
/// is dropped (and a file handle closed) at that point.
pub struct JpegScanlineDecoder<R: Read> {
    reader: Option<R>,
    decoder: Option<JpegDecoder<Cursor<Vec<u8>>>>,
    descriptor: Option<ImageDescriptor>,
    started: bool,
    output_scanline: u32,
    // decoded rows not yet handed out, for callers asking for fewer rows
    pending: Vec<u8>,
    pending_pos: usize,
}

impl<R: Read> JpegScanlineDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            decoder: None,
            descriptor: None,
            started: false,
            output_scanline: 0,
            pending: Vec::new(),
            pending_pos: 0,
        }
    }

    fn descriptor(&self) -> Result<ImageDescriptor, CodecError> {
        self.descriptor
            .ok_or_else(|| "jpeg header has not been read".into())
    }
}

impl<R: Read> ScanlineDecoder for JpegScanlineDecoder<R> {
    fn read_header(&mut self) -> Result<ImageDescriptor, CodecError> {
        if let Some(descriptor) = self.descriptor {
            return Ok(descriptor);
        }
        let mut reader = self
            .reader
            .take()
            .ok_or("jpeg input is no longer available")?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        drop(reader);

        let density = jfif::read_density(&data).unwrap_or_default();
        let decoder = JpegDecoder::new(Cursor::new(data))?;
        let (width, height) = decoder.dimensions();
        let color_type = decoder.color_type();
        let (components, color_space) = match color_type {
            ColorType::Rgb8 => (3, ColorSpace::Rgb),
            ColorType::L8 => (1, ColorSpace::Grayscale),
            other => (other.channel_count(), ColorSpace::Unknown),
        };
        log::debug!(
            "jpeg header: {}x{}, {:?}, density {:?}",
            width,
            height,
            color_type,
            density
        );

        let descriptor = ImageDescriptor {
            width,
            height,
            components,
            color_space,
            density,
        };
        self.decoder = Some(decoder);
        self.descriptor = Some(descriptor);
        Ok(descriptor)
    }

    fn start(&mut self) -> Result<(), CodecError> {
        self.descriptor()?;
        self.started = true;
        Ok(())
    }

    fn read_scanlines(&mut self, rows: &mut [u8]) -> Result<usize, CodecError> {
        if !self.started {
            return Err("jpeg decompression has not been started".into());
        }
        let descriptor = self.descriptor()?;
        let row_len = descriptor.row_len();
        if row_len == 0 {
            return Ok(0);
        }
        let requested = rows.len() / row_len;
        if requested == 0 {
            return Ok(0);
        }

        if let Some(decoder) = self.decoder.take() {
            let total = usize::try_from(decoder.total_bytes())?;
            if rows.len() == total {
                // caller handed us the whole image; decode in place
                decoder.read_image(rows)?;
                self.output_scanline = descriptor.height;
                return Ok(descriptor.height as usize);
            }
            let mut staging = vec![0u8; total];
            decoder.read_image(&mut staging)?;
            self.pending = staging;
            self.pending_pos = 0;
        }

        let available = (self.pending.len() - self.pending_pos) / row_len;
        let delivered = requested.min(available);
        let bytes = delivered * row_len;
        rows[..bytes].copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + bytes]);
        self.pending_pos += bytes;
        self.output_scanline += delivered as u32;
        Ok(delivered)
    }

    fn output_scanline(&self) -> u32 {
        self.output_scanline
    }

    fn finish(&mut self) -> Result<(), CodecError> {
        let descriptor = self.descriptor()?;
        if self.output_scanline != descriptor.height {
            return Err(format!(
                "decompression finished after {} of {} scanlines",
                self.output_scanline, descriptor.height
            )
            .into());
        }
        self.pending = Vec::new();
        self.pending_pos = 0;
        Ok(())
    }
}

/// Encodes grayscale scanlines as baseline JPEG into `W`.
///
/// The `image` encoder works on whole images, so scanlines are staged until
/// [`ScanlineEncoder::finish`].
pub struct JpegScanlineEncoder<W: Write> {
    writer: W,
    quality: u8,
    descriptor: Option<ImageDescriptor>,
    started: bool,
    staging: Vec<u8>,
    rows_written: u32,
}

impl<W: Write> JpegScanlineEncoder<W> {
    pub fn new(writer: W, quality: u8) -> Self {
        Self {
            writer,
            quality: quality.clamp(1, 100),
            descriptor: None,
            started: false,
            staging: Vec::new(),
            rows_written: 0,
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

fn pixel_density(density: Density) -> PixelDensity {
    PixelDensity {
        density: (density.x, density.y),
        unit: match density.unit {
            DensityUnit::AspectRatio => PixelDensityUnit::PixelAspectRatio,
            DensityUnit::PerInch => PixelDensityUnit::Inches,
            DensityUnit::PerCentimeter => PixelDensityUnit::Centimeters,
        },
    }
}

impl<W: Write> ScanlineEncoder for JpegScanlineEncoder<W> {
    fn configure(&mut self, descriptor: &ImageDescriptor) -> Result<(), CodecError> {
        if descriptor.components != 1 || descriptor.color_space != ColorSpace::Grayscale {
            return Err(format!(
                "jpeg encoder only accepts 1-component grayscale input, got {} components ({:?})",
                descriptor.components, descriptor.color_space
            )
            .into());
        }
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err("jpeg encoder needs non-zero dimensions".into());
        }
        self.descriptor = Some(*descriptor);
        Ok(())
    }

    fn start(&mut self) -> Result<(), CodecError> {
        let descriptor = self
            .descriptor
            .ok_or("jpeg encoder has not been configured")?;
        let total = descriptor.row_len() * descriptor.height as usize;
        self.staging.clear();
        self.staging.try_reserve_exact(total)?;
        self.rows_written = 0;
        self.started = true;
        Ok(())
    }

    fn write_scanline(&mut self, row: &[u8]) -> Result<(), CodecError> {
        let descriptor = match (self.started, self.descriptor) {
            (true, Some(d)) => d,
            _ => return Err("jpeg compression has not been started".into()),
        };
        if self.rows_written >= descriptor.height {
            return Err(format!("more than {} scanlines written", descriptor.height).into());
        }
        if row.len() != descriptor.row_len() {
            return Err(format!(
                "scanline has {} samples, expected {}",
                row.len(),
                descriptor.row_len()
            )
            .into());
        }
        self.staging.extend_from_slice(row);
        self.rows_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CodecError> {
        let descriptor = match (self.started, self.descriptor) {
            (true, Some(d)) => d,
            _ => return Err("jpeg compression has not been started".into()),
        };
        if self.rows_written != descriptor.height {
            return Err(format!(
                "compression finished after {} of {} scanlines",
                self.rows_written, descriptor.height
            )
            .into());
        }

        {
            let mut encoder = JpegEncoder::new_with_quality(&mut self.writer, self.quality);
            encoder.set_pixel_density(pixel_density(descriptor.density));
            encoder.encode(
                &self.staging,
                descriptor.width,
                descriptor.height,
                ExtendedColorType::L8,
            )?;
        }
        self.writer.flush()?;
        self.staging = Vec::new();
        self.started = false;
        Ok(())
    }
}
