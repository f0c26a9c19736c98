//! Types related to source files.

use std::fmt;
use std::ops::Range;

use crate::files::FileId;

/// Byte offsets into source files.
pub type BytePos = u32;

/// The largest source file that can be loaded, so that every offset fits in
/// a [`BytePos`].
pub const MAX_SOURCE_LEN: usize = u32::MAX as usize;

/// Byte ranges in source files.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ByteRange {
    file_id: FileId,
    start: BytePos,
    end: BytePos,
}

impl fmt::Debug for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteRange({:?}, {}..{})", self.file_id, self.start, self.end)
    }
}

impl ByteRange {
    pub const fn new(file_id: FileId, start: BytePos, end: BytePos) -> ByteRange {
        ByteRange {
            file_id,
            start,
            end,
        }
    }

    pub const fn file_id(&self) -> FileId {
        self.file_id
    }

    pub const fn start(&self) -> BytePos {
        self.start
    }

    pub const fn end(&self) -> BytePos {
        self.end
    }

    /// The smallest range covering both `self` and `other`. Ranges in
    /// different files are not merged.
    pub fn merge(&self, other: &ByteRange) -> Option<ByteRange> {
        if self.file_id == other.file_id {
            Some(ByteRange::new(
                self.file_id,
                self.start.min(other.start),
                self.end.max(other.end),
            ))
        } else {
            None
        }
    }
}

impl From<ByteRange> for Range<usize> {
    fn from(range: ByteRange) -> Self {
        (range.start as usize)..(range.end as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// `ByteRange` is stored in every AST identifier. Ensure it doesn't grow
    /// accidentally.
    fn byte_range_size() {
        assert_eq!(std::mem::size_of::<ByteRange>(), 12);
        assert_eq!(std::mem::size_of::<Option<ByteRange>>(), 12);
    }

    #[test]
    fn merge_same_file() {
        let file_id = FileId::try_from(1).unwrap();
        let a = ByteRange::new(file_id, 4, 8);
        let b = ByteRange::new(file_id, 2, 5);
        assert_eq!(a.merge(&b), Some(ByteRange::new(file_id, 2, 8)));
    }

    #[test]
    fn merge_different_files() {
        let a = ByteRange::new(FileId::try_from(1).unwrap(), 0, 1);
        let b = ByteRange::new(FileId::try_from(2).unwrap(), 0, 1);
        assert_eq!(a.merge(&b), None);
    }
}
