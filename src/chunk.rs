use std::ops::Range;

use crate::error::UploadError;

/// Splits `[0, file_size)` into consecutive ranges of `chunk_size` bytes.
/// The last range may be shorter; a zero-byte file has no chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    file_size: u64,
    chunk_size: u64,
    chunk_count: u64,
}

impl ChunkPlan {
    pub fn new(file_size: u64, chunk_size: u64) -> Result<Self, UploadError> {
        if chunk_size == 0 {
            return Err(UploadError::InvalidInput(
                "chunk size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            file_size,
            chunk_size,
            chunk_count: file_size.div_ceil(chunk_size),
        })
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_count == 0
    }

    /// Byte range of chunk `index`, or `None` past the end of the plan.
    pub fn range_of(&self, index: u64) -> Option<Range<u64>> {
        if index >= self.chunk_count {
            return None;
        }
        let start = index * self.chunk_size;
        let end = (start + self.chunk_size).min(self.file_size);
        Some(start..end)
    }

    pub fn ranges(&self) -> impl Iterator<Item = (u64, Range<u64>)> + '_ {
        (0..self.chunk_count).filter_map(move |index| self.range_of(index).map(|r| (index, r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partitions(file_size: u64, chunk_size: u64) {
        let plan = ChunkPlan::new(file_size, chunk_size).unwrap();
        assert_eq!(plan.chunk_count(), file_size.div_ceil(chunk_size));

        let mut expected_start = 0;
        for (index, range) in plan.ranges() {
            assert_eq!(range.start, expected_start, "gap or overlap at chunk {}", index);
            assert!(range.end > range.start);
            assert!(range.end - range.start <= chunk_size);
            expected_start = range.end;
        }
        assert_eq!(expected_start, file_size);
    }

    #[test]
    fn test_ranges_partition_file() {
        let cases = [
            (1, 1),
            (1, 4096),
            (4096, 4096),
            (4097, 4096),
            (10 * 1000 * 1000, 2 * 1000 * 1000),
            (10 * 1024 * 1024 + 17, 1024 * 1024),
            (999_983, 7919),
        ];
        for (file_size, chunk_size) in cases {
            assert_partitions(file_size, chunk_size);
        }
    }

    #[test]
    fn test_last_chunk_is_short() {
        let plan = ChunkPlan::new(10, 4).unwrap();
        assert_eq!(plan.chunk_count(), 3);
        assert_eq!(plan.range_of(0), Some(0..4));
        assert_eq!(plan.range_of(1), Some(4..8));
        assert_eq!(plan.range_of(2), Some(8..10));
        assert_eq!(plan.range_of(3), None);
    }

    #[test]
    fn test_ten_megabytes_in_two_megabyte_chunks() {
        let plan = ChunkPlan::new(10 * 1024 * 1024, 2 * 1024 * 1024).unwrap();
        assert_eq!(plan.chunk_count(), 5);
        assert_eq!(plan.range_of(4), Some(8 * 1024 * 1024..10 * 1024 * 1024));
    }

    #[test]
    fn test_zero_byte_file_has_no_chunks() {
        let plan = ChunkPlan::new(0, 1024).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.ranges().count(), 0);
        assert_eq!(plan.range_of(0), None);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            ChunkPlan::new(100, 0),
            Err(UploadError::InvalidInput(_))
        ));
    }
}
