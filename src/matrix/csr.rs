//! Compressed Sparse Row (CSR) matrix
//!
//! Stores non-zero entries contiguously per row, so the cost of every
//! operation scales with the number of non-zeros rather than with
//! rows × columns. Column indices within a row are always sorted.

use rustc_hash::FxHashMap;

/// A sparse integer matrix in CSR format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrMatrix {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Row pointers: row i's entries are at indices row_ptr[i]..row_ptr[i+1]
    pub row_ptr: Vec<usize>,
    /// Column index for each stored entry
    pub col_idx: Vec<u32>,
    /// Value for each stored entry
    pub values: Vec<u32>,
}

impl CsrMatrix {
    /// An empty matrix with no stored entries
    pub fn zeros(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            row_ptr: vec![0; num_rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build a binary matrix from per-row column sets.
    ///
    /// Duplicate columns within a row collapse to a single 1.
    pub fn from_binary_rows<I, R>(num_cols: usize, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = u32>,
    {
        let mut row_ptr = vec![0];
        let mut col_idx = Vec::new();

        for row in rows {
            let mut cols: Vec<u32> = row.into_iter().collect();
            cols.sort_unstable();
            cols.dedup();
            debug_assert!(cols.last().map_or(true, |&c| (c as usize) < num_cols));
            col_idx.extend(cols);
            row_ptr.push(col_idx.len());
        }

        let values = vec![1; col_idx.len()];
        Self {
            num_rows: row_ptr.len() - 1,
            num_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Iterate over the non-zero entries of a row as (column, value)
    pub fn row(&self, row: usize) -> impl Iterator<Item = (u32, u32)> + '_ {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        (start..end).map(move |i| (self.col_idx[i], self.values[i]))
    }

    /// Sorted column indices of the non-zero entries in a row
    pub fn row_indices(&self, row: usize) -> &[u32] {
        &self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]]
    }

    /// Number of stored entries in a row
    pub fn row_nnz(&self, row: usize) -> usize {
        self.row_ptr[row + 1] - self.row_ptr[row]
    }

    /// Value at (row, col), zero when not stored
    pub fn get(&self, row: usize, col: u32) -> u32 {
        let cols = self.row_indices(row);
        match cols.binary_search(&col) {
            Ok(pos) => self.values[self.row_ptr[row] + pos],
            Err(_) => 0,
        }
    }

    /// Total number of stored entries
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// Check if the matrix stores no entries
    pub fn is_empty(&self) -> bool {
        self.col_idx.is_empty()
    }

    /// Transpose into a new CSR matrix
    pub fn transpose(&self) -> Self {
        let mut counts = vec![0usize; self.num_cols + 1];
        for &c in &self.col_idx {
            counts[c as usize + 1] += 1;
        }
        for i in 0..self.num_cols {
            counts[i + 1] += counts[i];
        }
        let row_ptr = counts.clone();

        let mut next = counts;
        let mut col_idx = vec![0u32; self.nnz()];
        let mut values = vec![0u32; self.nnz()];

        // Rows are visited in ascending order, so each transposed row comes
        // out sorted.
        debug_assert!(u32::try_from(self.num_rows).is_ok());
        for r in 0..self.num_rows {
            for (c, v) in self.row(r) {
                let slot = next[c as usize];
                col_idx[slot] = r as u32;
                values[slot] = v;
                next[c as usize] += 1;
            }
        }

        Self {
            num_rows: self.num_cols,
            num_cols: self.num_rows,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Sparse matrix product `self · other`
    pub fn matmul(&self, other: &CsrMatrix) -> Self {
        assert_eq!(
            self.num_cols, other.num_rows,
            "dimension mismatch in sparse product"
        );

        let mut row_ptr = Vec::with_capacity(self.num_rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        let mut acc: FxHashMap<u32, u32> = FxHashMap::default();
        for r in 0..self.num_rows {
            acc.clear();
            for (k, a) in self.row(r) {
                for (c, b) in other.row(k as usize) {
                    *acc.entry(c).or_insert(0) += a * b;
                }
            }

            // Sort for deterministic iteration
            let mut entries: Vec<_> = acc.iter().map(|(&c, &v)| (c, v)).collect();
            entries.sort_by_key(|(c, _)| *c);
            for (c, v) in entries {
                col_idx.push(c);
                values.push(v);
            }
            row_ptr.push(col_idx.len());
        }

        Self {
            num_rows: self.num_rows,
            num_cols: other.num_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Expand into a dense row-major matrix (tests and debugging)
    pub fn to_dense(&self) -> Vec<Vec<u32>> {
        let mut dense = vec![vec![0; self.num_cols]; self.num_rows];
        for (r, row) in dense.iter_mut().enumerate() {
            for (c, v) in self.row(r) {
                row[c as usize] = v;
            }
        }
        dense
    }
}

impl Default for CsrMatrix {
    fn default() -> Self {
        Self::zeros(0, 0)
    }
}
