//! RGB to grayscale conversion using ITU-R BT.709 luminance weights.
//!
//! The luminance formula is: Y = 0.2126*R + 0.7152*G + 0.0722*B
//!
//! Integer math is used in the hot path. The coefficients are scaled by
//! 10000 (2126 + 7152 + 722 = 10000), so white maps to exactly 255 and the
//! final division truncates toward zero.

use crate::buffer::ScanlineBuffer;
use crate::error::GrayscaleError;

/// Components per pixel in the decoded source image (R, G, B).
pub const SOURCE_COMPONENTS: usize = 3;

/// Components per pixel in the encoded output image.
pub const OUTPUT_COMPONENTS: usize = 1;

const RED_WEIGHT: u32 = 2126;
const GREEN_WEIGHT: u32 = 7152;
const BLUE_WEIGHT: u32 = 722;
const WEIGHT_SCALE: u32 = 10_000;

/// Convert one RGB triple to a gray intensity.
///
/// The weighted sum is truncated, not rounded: pure red (255, 0, 0) gives
/// 54 because 0.2126 * 255 = 54.213.
#[inline]
pub fn luminance(red: u8, green: u8, blue: u8) -> u8 {
    let sum = RED_WEIGHT * red as u32 + GREEN_WEIGHT * green as u32 + BLUE_WEIGHT * blue as u32;
    // at most 255 * WEIGHT_SCALE, so the quotient fits in u8
    (sum / WEIGHT_SCALE) as u8
}

/// Convert one decoded RGB scanline into one gray scanline.
///
/// `source` must hold exactly `width * 3` samples and `destination` exactly
/// `width` samples. Nothing is written if either length is wrong.
pub fn transform_row(
    source: &[u8],
    destination: &mut [u8],
    width: usize,
) -> Result<(), GrayscaleError> {
    let source_len = width * SOURCE_COMPONENTS;
    if source.len() != source_len {
        return Err(GrayscaleError::mismatch(
            "source row length",
            source_len,
            source.len(),
        ));
    }
    if destination.len() != width * OUTPUT_COMPONENTS {
        return Err(GrayscaleError::mismatch(
            "destination row length",
            width * OUTPUT_COMPONENTS,
            destination.len(),
        ));
    }

    for (gray, rgb) in destination
        .iter_mut()
        .zip(source.chunks_exact(SOURCE_COMPONENTS))
    {
        *gray = luminance(rgb[0], rgb[1], rgb[2]);
    }
    Ok(())
}

/// Apply [`transform_row`] to every row of the buffer.
///
/// With the `parallel` feature and `parallel` set, rows are spread over the
/// rayon thread pool. Each row reads its own source row and writes its own
/// destination row, so the output is identical either way.
pub fn transform_rows(buffer: &mut ScanlineBuffer, parallel: bool) -> Result<(), GrayscaleError> {
    let layout = *buffer.layout();
    let width = layout.destination_row_len / OUTPUT_COMPONENTS;
    if layout.source_row_len != width * SOURCE_COMPONENTS {
        return Err(GrayscaleError::mismatch(
            "source row length",
            width * SOURCE_COMPONENTS,
            layout.source_row_len,
        ));
    }
    if layout.height == 0 || width == 0 {
        return Ok(());
    }

    let (source, destination) = buffer.regions_mut();

    #[cfg(feature = "parallel")]
    {
        if parallel {
            use rayon::prelude::*;

            return source
                .par_chunks_exact(layout.source_row_len)
                .zip(destination.par_chunks_exact_mut(layout.destination_row_len))
                .try_for_each(|(src, dst)| transform_row(src, dst, width));
        }
    }
    #[cfg(not(feature = "parallel"))]
    {
        if parallel {
            log::debug!("parallel transform requested but the `parallel` feature is disabled");
        }
    }

    let rows = source
        .chunks_exact(layout.source_row_len)
        .zip(destination.chunks_exact_mut(layout.destination_row_len));
    let mut transformed = 0usize;
    for (src, dst) in rows {
        transform_row(src, dst, width)?;
        transformed += 1;
    }
    if transformed != layout.height {
        return Err(GrayscaleError::mismatch(
            "transformed row count",
            layout.height,
            transformed,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferLayout;

    #[test]
    fn test_luminance_primaries_truncate() {
        // 0.2126 * 255 = 54.213
        assert_eq!(luminance(255, 0, 0), 54);
        // 0.7152 * 255 = 182.376
        assert_eq!(luminance(0, 255, 0), 182);
        // 0.0722 * 255 = 18.411
        assert_eq!(luminance(0, 0, 255), 18);
    }

    #[test]
    fn test_luminance_extremes() {
        assert_eq!(luminance(255, 255, 255), 255);
        assert_eq!(luminance(0, 0, 0), 0);
    }

    #[test]
    fn test_luminance_truncates_just_below_integer() {
        // 0.2126 * 4 + 0.7152 * 1 = 1.5656 -> 1, rounding would give 2
        assert_eq!(luminance(4, 1, 0), 1);
    }

    #[test]
    fn test_luminance_matches_formula_exhaustive_diagonal() {
        for v in 0..=255u8 {
            assert_eq!(luminance(v, v, v), v);
        }
    }

    #[test]
    fn test_luminance_matches_float_formula_sampled() {
        for r in (0..=255u32).step_by(15) {
            for g in (0..=255u32).step_by(17) {
                for b in (0..=255u32).step_by(51) {
                    let exact = (2126 * r + 7152 * g + 722 * b) as f64 / 10_000.0;
                    assert_eq!(
                        luminance(r as u8, g as u8, b as u8) as u32,
                        exact.trunc() as u32,
                        "rgb=({r},{g},{b})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_transform_row_writes_every_pixel() {
        let source = [255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let mut destination = [7u8; 4];
        transform_row(&source, &mut destination, 4).unwrap();
        assert_eq!(destination, [54, 182, 18, 255]);
    }

    #[test]
    fn test_transform_row_rejects_short_source() {
        let source = [0u8; 5];
        let mut destination = [9u8; 2];
        let err = transform_row(&source, &mut destination, 2).unwrap_err();
        assert!(matches!(
            err,
            GrayscaleError::DimensionMismatch {
                expected: 6,
                actual: 5,
                ..
            }
        ));
        // untouched on failure
        assert_eq!(destination, [9, 9]);
    }

    #[test]
    fn test_transform_row_rejects_wrong_destination() {
        let source = [0u8; 6];
        let mut destination = [0u8; 3];
        assert!(transform_row(&source, &mut destination, 2).is_err());
    }

    #[test]
    fn test_transform_row_zero_width() {
        let mut destination: [u8; 0] = [];
        transform_row(&[], &mut destination, 0).unwrap();
    }

    fn filled_buffer(width: usize, height: usize, rgb: [u8; 3]) -> ScanlineBuffer {
        let layout = BufferLayout::new(height, width * SOURCE_COMPONENTS, width).unwrap();
        let mut buffer = ScanlineBuffer::allocate(layout).unwrap();
        for px in buffer.source_region_mut().chunks_exact_mut(3) {
            px.copy_from_slice(&rgb);
        }
        buffer
    }

    #[test]
    fn test_transform_rows_white_and_black() {
        let mut white = filled_buffer(5, 3, [255, 255, 255]);
        transform_rows(&mut white, false).unwrap();
        assert!(white.destination_region().iter().all(|&v| v == 255));

        let mut black = filled_buffer(5, 3, [0, 0, 0]);
        transform_rows(&mut black, false).unwrap();
        assert!(black.destination_region().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_transform_rows_parallel_matches_sequential() {
        let mut a = filled_buffer(7, 9, [0, 0, 0]);
        for (i, v) in a.source_region_mut().iter_mut().enumerate() {
            *v = (i * 31 % 256) as u8;
        }
        let mut b = ScanlineBuffer::allocate(*a.layout()).unwrap();
        b.source_region_mut().copy_from_slice(a.source_region());

        transform_rows(&mut a, false).unwrap();
        transform_rows(&mut b, true).unwrap();
        assert_eq!(a.destination_region(), b.destination_region());
    }

    #[test]
    fn test_transform_rows_leaves_source_untouched() {
        let mut buffer = filled_buffer(2, 2, [10, 20, 30]);
        let before = buffer.source_region().to_vec();
        transform_rows(&mut buffer, false).unwrap();
        assert_eq!(buffer.source_region(), &before[..]);
    }
}
