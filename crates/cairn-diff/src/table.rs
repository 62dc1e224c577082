//! Dynamic-programming alignment table for the longest common subsequence.
//!
//! The grid has one extra row and column for the empty-prefix base case, so
//! cell `(i, j)` describes the best alignment of the first `i` lines of the
//! old file against the first `j` lines of the new one. All three per-cell
//! arrays live in flat row-major buffers.

use tracing::debug;

use crate::deltafile::DeltaFile;
use crate::error::{DiffError, DiffResult};

/// Which neighbour produced a cell's score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Arrow {
    /// From `(i-1, j)`: line `i-1` of the old file was deleted.
    Up,
    /// From `(i, j-1)`: line `j-1` of the new file was inserted.
    Left,
    /// From `(i-1, j-1)`: the two lines match.
    Tilt,
    /// Reserved alternate diagonal. The fill never produces it.
    Down,
}

/// Sentinel stored in `prev` for the origin cell.
const NO_PREV: usize = usize::MAX;

/// The `(rows) x (cols)` arrow grid with its `prev` and `sol` companions.
#[derive(Debug)]
pub struct DeltaTable {
    arrows: Vec<Arrow>,
    /// Flat index of the predecessor of each cell.
    prev: Vec<usize>,
    /// Length of the best common subsequence ending at each cell.
    sol: Vec<usize>,
    rows: usize,
    cols: usize,
    filled: bool,
}

fn alloc<T: Clone>(cells: usize, fill: T, rows: usize, cols: usize) -> DiffResult<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(cells)
        .map_err(|_| DiffError::TableAllocation { rows, cols })?;
    buf.resize(cells, fill);
    Ok(buf)
}

impl DeltaTable {
    /// Allocate a table for an old file of `m` lines and a new file of `n`.
    ///
    /// The grid is `(m + 1) x (n + 1)`. Allocation failure, including a cell
    /// count that does not fit in `usize`, is returned rather than aborting.
    pub fn new(m: usize, n: usize) -> DiffResult<Self> {
        let rows = m.saturating_add(1);
        let cols = n.saturating_add(1);
        let cells = m
            .checked_add(1)
            .zip(n.checked_add(1))
            .and_then(|(r, c)| r.checked_mul(c))
            .ok_or(DiffError::TableAllocation { rows, cols })?;

        let arrows = alloc(cells, Arrow::Tilt, rows, cols)?;
        let prev = alloc(cells, NO_PREV, rows, cols)?;
        let sol = alloc(cells, 0usize, rows, cols)?;

        debug!(rows, cols, "allocated delta table");
        Ok(Self {
            arrows,
            prev,
            sol,
            rows,
            cols,
            filled: false,
        })
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, arrow: Arrow, prev: usize, sol: usize) {
        let k = self.at(i, j);
        self.arrows[k] = arrow;
        self.prev[k] = prev;
        self.sol[k] = sol;
    }

    /// Fill the table from the two files and return the LCS length.
    ///
    /// Rows follow the old file, columns the new one. When deleting and
    /// inserting score the same, the cell takes the insertion, which keeps
    /// the output stable for a given pair of files.
    pub fn compare(&mut self, a: &DeltaFile, b: &DeltaFile) -> DiffResult<usize> {
        if a.len() + 1 != self.rows || b.len() + 1 != self.cols {
            return Err(DiffError::DimensionMismatch {
                table_rows: self.rows,
                table_cols: self.cols,
                rows: a.len() + 1,
                cols: b.len() + 1,
            });
        }

        self.set(0, 0, Arrow::Tilt, NO_PREV, 0);
        for j in 1..self.cols {
            let left = self.at(0, j - 1);
            self.set(0, j, Arrow::Left, left, 0);
        }

        let (a_lines, b_lines) = (a.lines(), b.lines());
        for i in 1..self.rows {
            let up = self.at(i - 1, 0);
            self.set(i, 0, Arrow::Up, up, 0);

            let a_line = &a_lines[i - 1];
            for j in 1..self.cols {
                let diag = self.at(i - 1, j - 1);
                let up = self.at(i - 1, j);
                let left = self.at(i, j - 1);

                if *a_line == b_lines[j - 1] {
                    let score = self.sol[diag] + 1;
                    self.set(i, j, Arrow::Tilt, diag, score);
                } else if self.sol[up] > self.sol[left] {
                    let score = self.sol[up];
                    self.set(i, j, Arrow::Up, up, score);
                } else {
                    let score = self.sol[left];
                    self.set(i, j, Arrow::Left, left, score);
                }
            }
        }

        self.filled = true;
        let lcs = self.lcs_len();
        debug!(rows = self.rows, cols = self.cols, lcs, "filled delta table");
        Ok(lcs)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    /// Score of the bottom-right cell.
    pub fn lcs_len(&self) -> usize {
        self.sol[self.at(self.rows - 1, self.cols - 1)]
    }

    /// Panics if `(i, j)` is outside the grid.
    pub fn arrow(&self, i: usize, j: usize) -> Arrow {
        assert!(i < self.rows && j < self.cols, "cell ({i}, {j}) out of range");
        self.arrows[self.at(i, j)]
    }

    /// Panics if `(i, j)` is outside the grid.
    pub fn score(&self, i: usize, j: usize) -> usize {
        assert!(i < self.rows && j < self.cols, "cell ({i}, {j}) out of range");
        self.sol[self.at(i, j)]
    }

    /// The cell that produced `(i, j)`, or `None` for the origin.
    pub fn predecessor(&self, i: usize, j: usize) -> Option<(usize, usize)> {
        if i >= self.rows || j >= self.cols {
            return None;
        }
        match self.prev[self.at(i, j)] {
            NO_PREV => None,
            p => Some((p / self.cols, p % self.cols)),
        }
    }
}
