//! Position tracking for the row protocol.

use crate::error::RowProtocolViolation;

/// Which column the next value belongs to, plus row counters.
///
/// `column` runs from 0 to `columns`; at `columns` the row is complete and
/// only `end_of_row` is legal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCursor {
    column: usize,
    columns: usize,
    batch_rows: usize,
    total_rows: u64,
}

impl RowCursor {
    pub fn new(columns: usize) -> Self {
        Self {
            column: 0,
            columns,
            batch_rows: 0,
            total_rows: 0,
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn batch_rows(&self) -> usize {
        self.batch_rows
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    /// True when some but not all columns of the current row are written.
    pub fn in_row(&self) -> bool {
        self.column > 0
    }

    /// The column a write would land in, or `TooManyColumns` if the row is full.
    pub fn next_column(&self) -> Result<usize, RowProtocolViolation> {
        if self.column >= self.columns {
            return Err(RowProtocolViolation::TooManyColumns {
                expected: self.columns,
                got: self.column + 1,
            });
        }
        Ok(self.column)
    }

    /// Step past the column returned by `next_column`.
    pub fn advance(&mut self) {
        debug_assert!(self.column < self.columns);
        self.column += 1;
    }

    /// Close the current row. An incomplete row is an error and is dropped
    /// from the cursor's point of view; the caller decides what to do with
    /// the values already buffered.
    pub fn end_of_row(&mut self) -> Result<(), RowProtocolViolation> {
        if self.column != self.columns {
            let got = self.column;
            self.column = 0;
            return Err(RowProtocolViolation::TooFewColumns {
                expected: self.columns,
                got,
            });
        }
        self.column = 0;
        self.batch_rows += 1;
        self.total_rows += 1;
        Ok(())
    }

    /// Called after a flush drains the accumulators.
    pub fn reset_batch(&mut self) {
        self.batch_rows = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_row() {
        let mut cursor = RowCursor::new(2);
        for expected in 0..2 {
            assert_eq!(cursor.next_column().unwrap(), expected);
            cursor.advance();
        }
        assert!(cursor.in_row());
        assert_eq!(
            cursor.next_column(),
            Err(RowProtocolViolation::TooManyColumns { expected: 2, got: 3 })
        );
        cursor.end_of_row().unwrap();
        assert!(!cursor.in_row());
        assert_eq!(cursor.batch_rows(), 1);
        assert_eq!(cursor.total_rows(), 1);
    }

    #[test]
    fn test_short_row() {
        let mut cursor = RowCursor::new(3);
        cursor.advance();
        assert_eq!(
            cursor.end_of_row(),
            Err(RowProtocolViolation::TooFewColumns { expected: 3, got: 1 })
        );
        assert_eq!(cursor.column(), 0);
        assert_eq!(cursor.total_rows(), 0);
    }

    #[test]
    fn test_reset_batch_keeps_total() {
        let mut cursor = RowCursor::new(1);
        for _ in 0..3 {
            cursor.advance();
            cursor.end_of_row().unwrap();
        }
        cursor.reset_batch();
        assert_eq!(cursor.batch_rows(), 0);
        assert_eq!(cursor.total_rows(), 3);
    }
}
