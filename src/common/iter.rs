use crate::common::metadata::Version;

// Iterator over the data region of a QR symbol
//------------------------------------------------------------------------------

// Walks column pairs right to left, alternating between upward and downward
// passes and emitting the right cell of the pair before the left. The pair
// straddling the vertical timing column is collapsed one column to the left.
// Function cells are not skipped here; the caller filters them.
pub(crate) struct DataRegionIter {
    r: i16,
    c: i16,
    width: i16,
}

impl DataRegionIter {
    pub const fn new(version: Version) -> Self {
        let w = version.width() as i16;
        Self { r: w - 1, c: w - 1, width: w }
    }
}

impl Iterator for DataRegionIter {
    type Item = (i16, i16);
    fn next(&mut self) -> Option<Self::Item> {
        if self.c < 0 {
            return None;
        }
        let adjusted_col = if self.c <= VERT_TIMING_COL { self.c + 1 } else { self.c };
        let res = (self.r, self.c);
        let col_type = (self.width - adjusted_col) % 4;
        match col_type {
            2 if self.r > 0 => {
                self.r -= 1;
                self.c += 1;
            }
            0 if self.r < self.width - 1 => {
                self.r += 1;
                self.c += 1;
            }
            0 | 2 if self.c == VERT_TIMING_COL + 1 => {
                self.c -= 2;
            }
            _ => {
                self.c -= 1;
            }
        }
        Some(res)
    }
}


// Global constants
//------------------------------------------------------------------------------

const VERT_TIMING_COL: i16 = 6;
