//! Single-allocation scanline storage.
//!
//! One `Vec<u8>` holds every decoded source row followed by every output
//! row. Row starts are computed once into two offset tables and all row
//! access goes through slices derived from them.

use crate::error::GrayscaleError;

/// Row geometry of a [`ScanlineBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    pub height: usize,
    /// Bytes per decoded source row (width * source components)
    pub source_row_len: usize,
    /// Bytes per output row (width * output components)
    pub destination_row_len: usize,
    source_len: usize,
    destination_len: usize,
}

impl BufferLayout {
    /// Validate the geometry. Fails with an allocation error if any region
    /// size overflows `usize`.
    pub fn new(
        height: usize,
        source_row_len: usize,
        destination_row_len: usize,
    ) -> Result<Self, GrayscaleError> {
        let overflow = || GrayscaleError::Allocation {
            requested: usize::MAX,
            source: None,
        };
        let source_len = height.checked_mul(source_row_len).ok_or_else(overflow)?;
        let destination_len = height
            .checked_mul(destination_row_len)
            .ok_or_else(overflow)?;
        source_len
            .checked_add(destination_len)
            .ok_or_else(overflow)?;
        Ok(Self {
            height,
            source_row_len,
            destination_row_len,
            source_len,
            destination_len,
        })
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn destination_len(&self) -> usize {
        self.destination_len
    }

    pub fn total_len(&self) -> usize {
        self.source_len + self.destination_len
    }
}

/// Owned storage for the source and destination regions.
#[derive(Debug)]
pub struct ScanlineBuffer {
    data: Vec<u8>,
    layout: BufferLayout,
    source_rows: Vec<usize>,
    destination_rows: Vec<usize>,
}

impl ScanlineBuffer {
    /// Allocate one block for both regions and derive the row tables.
    ///
    /// Allocation failure is reported, never retried.
    pub fn allocate(layout: BufferLayout) -> Result<Self, GrayscaleError> {
        let total = layout.total_len();
        let mut data = Vec::new();
        data.try_reserve_exact(total)
            .map_err(|e| GrayscaleError::Allocation {
                requested: total,
                source: Some(e),
            })?;
        data.resize(total, 0);

        let mut source_rows = Vec::new();
        let mut destination_rows = Vec::new();
        for table in [&mut source_rows, &mut destination_rows] {
            table
                .try_reserve_exact(layout.height)
                .map_err(|e| GrayscaleError::Allocation {
                    requested: layout.height * std::mem::size_of::<usize>(),
                    source: Some(e),
                })?;
        }
        source_rows.extend((0..layout.height).map(|i| i * layout.source_row_len));
        destination_rows
            .extend((0..layout.height).map(|i| layout.source_len + i * layout.destination_row_len));

        log::debug!(
            "allocated scanline buffer: {} rows, {} + {} bytes",
            layout.height,
            layout.source_len,
            layout.destination_len
        );

        Ok(Self {
            data,
            layout,
            source_rows,
            destination_rows,
        })
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    /// Start offset of each source row within the block.
    pub fn source_row_offsets(&self) -> &[usize] {
        &self.source_rows
    }

    /// Start offset of each destination row within the block.
    pub fn destination_row_offsets(&self) -> &[usize] {
        &self.destination_rows
    }

    pub fn source_row(&self, row: usize) -> &[u8] {
        let start = self.source_rows[row];
        &self.data[start..start + self.layout.source_row_len]
    }

    pub fn destination_row(&self, row: usize) -> &[u8] {
        let start = self.destination_rows[row];
        &self.data[start..start + self.layout.destination_row_len]
    }

    pub fn source_region(&self) -> &[u8] {
        &self.data[..self.layout.source_len]
    }

    pub fn source_region_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.layout.source_len]
    }

    /// Source rows from `first_row` to the end of the source region.
    pub fn source_rows_from_mut(&mut self, first_row: usize) -> &mut [u8] {
        let start = self
            .source_rows
            .get(first_row)
            .copied()
            .unwrap_or(self.layout.source_len);
        &mut self.data[start..self.layout.source_len]
    }

    pub fn destination_region(&self) -> &[u8] {
        &self.data[self.layout.source_len..]
    }

    /// Borrow both regions at once: read-only source, writable destination.
    pub fn regions_mut(&mut self) -> (&[u8], &mut [u8]) {
        let (source, destination) = self.data.split_at_mut(self.layout.source_len);
        (&*source, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(height: usize, width: usize) -> ScanlineBuffer {
        let layout = BufferLayout::new(height, width * 3, width).unwrap();
        ScanlineBuffer::allocate(layout).unwrap()
    }

    #[test]
    fn test_layout_sizes() {
        let layout = BufferLayout::new(4, 30, 10).unwrap();
        assert_eq!(layout.source_len(), 120);
        assert_eq!(layout.destination_len(), 40);
        assert_eq!(layout.total_len(), 160);
    }

    #[test]
    fn test_layout_overflow_is_allocation_error() {
        let err = BufferLayout::new(usize::MAX, 3, 1).unwrap_err();
        assert!(matches!(
            err,
            GrayscaleError::Allocation {
                requested: usize::MAX,
                source: None
            }
        ));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_huge_allocation_fails_without_abort() {
        let layout = BufferLayout::new(1 << 20, usize::MAX >> 24, 1).unwrap();
        let err = ScanlineBuffer::allocate(layout).unwrap_err();
        assert!(matches!(err, GrayscaleError::Allocation { source: Some(_), .. }));
    }

    #[test]
    fn test_destination_follows_source_without_gap() {
        let buf = buffer(3, 4);
        let last_source = *buf.source_row_offsets().last().unwrap();
        assert_eq!(
            buf.destination_row_offsets()[0],
            last_source + buf.layout().source_row_len
        );
        assert_eq!(buf.destination_row_offsets()[0], buf.layout().source_len());
    }

    #[test]
    fn test_row_offsets_are_evenly_spaced() {
        let buf = buffer(5, 7);
        for pair in buf.source_row_offsets().windows(2) {
            assert_eq!(pair[1] - pair[0], 21);
        }
        for pair in buf.destination_row_offsets().windows(2) {
            assert_eq!(pair[1] - pair[0], 7);
        }
        assert_eq!(buf.source_row_offsets().len(), 5);
        assert_eq!(buf.destination_row_offsets().len(), 5);
    }

    #[test]
    fn test_rows_are_disjoint_slices() {
        let mut buf = buffer(2, 2);
        {
            let (source, destination) = buf.regions_mut();
            assert_eq!(source.len(), 12);
            assert_eq!(destination.len(), 4);
            destination.fill(0xAA);
        }
        assert!(buf.source_region().iter().all(|&b| b == 0));
        assert_eq!(buf.destination_row(1), &[0xAA, 0xAA]);
        assert_eq!(buf.source_row(1).len(), 6);
    }

    #[test]
    fn test_source_rows_from_tail() {
        let mut buf = buffer(3, 1);
        assert_eq!(buf.source_rows_from_mut(0).len(), 9);
        assert_eq!(buf.source_rows_from_mut(2).len(), 3);
        assert!(buf.source_rows_from_mut(3).is_empty());
    }

    #[test]
    fn test_empty_image() {
        let buf = buffer(0, 0);
        assert!(buf.source_row_offsets().is_empty());
        assert!(buf.destination_region().is_empty());
    }
}
