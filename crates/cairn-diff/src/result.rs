//! Backtracing a filled [`DeltaTable`] into a readable delta.

use serde::Serialize;
use tracing::debug;

use crate::error::{DiffError, DiffResult};
use crate::input::DeltaInput;
use crate::table::{Arrow, DeltaTable};

/// Direction of a changed line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Insertion,
    Deletion,
}

/// A line present on only one side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeltaLine {
    pub change: Change,
    /// 1-based line number in the file the line comes from.
    pub line_no: usize,
    pub text: String,
}

/// One step of the alignment, with 0-based line indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edit {
    Common { old: usize, new: usize },
    Delete { old: usize },
    Insert { new: usize },
}

/// Counters of a delta, detached from the line buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeltaCounts {
    pub insertions: usize,
    pub deletions: usize,
    pub common: usize,
}

/// The outcome of one delta, in top-to-bottom file order.
#[derive(Clone, Debug)]
pub struct BasicDeltaResult<'a> {
    pub insertions: usize,
    pub deletions: usize,
    pub common: usize,
    input: &'a DeltaInput,
    /// Lines found in both files.
    pub common_lines: Vec<String>,
    /// Lines found in only one file, tagged with their direction.
    pub diff_lines: Vec<DeltaLine>,
    script: Vec<Edit>,
}

impl<'a> BasicDeltaResult<'a> {
    /// Walk `table` from the bottom-right cell back to the origin.
    ///
    /// The walk produces lines last-to-first; every sequence is reversed
    /// before returning.
    pub fn backtrace(table: &DeltaTable, input: &'a DeltaInput) -> DiffResult<Self> {
        if !table.is_filled() {
            return Err(DiffError::TableNotFilled);
        }
        let (a, b) = (input.file_a(), input.file_b());
        if table.rows() != a.len() + 1 || table.cols() != b.len() + 1 {
            return Err(DiffError::DimensionMismatch {
                table_rows: table.rows(),
                table_cols: table.cols(),
                rows: a.len() + 1,
                cols: b.len() + 1,
            });
        }

        let mut result = Self {
            insertions: 0,
            deletions: 0,
            common: 0,
            input,
            common_lines: Vec::new(),
            diff_lines: Vec::new(),
            script: Vec::with_capacity(a.len() + b.len()),
        };

        let (mut i, mut j) = (a.len(), b.len());
        while i > 0 || j > 0 {
            let (pi, pj) = table
                .predecessor(i, j)
                .ok_or(DiffError::Invariant("delta table cell has no predecessor"))?;

            match table.arrow(i, j) {
                Arrow::Tilt if i > 0 && j > 0 => {
                    result.common += 1;
                    result.common_lines.push(a.lines()[i - 1].clone());
                    result.script.push(Edit::Common {
                        old: i - 1,
                        new: j - 1,
                    });
                }
                Arrow::Up if i > 0 => {
                    result.deletions += 1;
                    result.diff_lines.push(DeltaLine {
                        change: Change::Deletion,
                        line_no: i,
                        text: a.lines()[i - 1].clone(),
                    });
                    result.script.push(Edit::Delete { old: i - 1 });
                }
                Arrow::Left if j > 0 => {
                    result.insertions += 1;
                    result.diff_lines.push(DeltaLine {
                        change: Change::Insertion,
                        line_no: j,
                        text: b.lines()[j - 1].clone(),
                    });
                    result.script.push(Edit::Insert { new: j - 1 });
                }
                _ => return Err(DiffError::Invariant("delta table arrow leaves the grid")),
            }

            debug_assert!(pi + pj + 1 == i + j || (pi + 1 == i && pj + 1 == j));
            (i, j) = (pi, pj);
        }

        result.common_lines.reverse();
        result.diff_lines.reverse();
        result.script.reverse();

        debug!(
            insertions = result.insertions,
            deletions = result.deletions,
            common = result.common,
            "backtraced delta table"
        );
        Ok(result)
    }

    pub fn input(&self) -> &'a DeltaInput {
        self.input
    }

    /// The full alignment, top to bottom.
    pub fn script(&self) -> &[Edit] {
        &self.script
    }

    pub fn counts(&self) -> DeltaCounts {
        DeltaCounts {
            insertions: self.insertions,
            deletions: self.deletions,
            common: self.common,
        }
    }

    /// True when the two files have the same lines.
    pub fn is_identical(&self) -> bool {
        self.insertions == 0 && self.deletions == 0
    }
}

/// Compute the delta between the two sides of `input`.
///
/// The table lives only for the duration of this call.
pub fn delta(input: &DeltaInput) -> DiffResult<BasicDeltaResult<'_>> {
    let (a, b) = (input.file_a(), input.file_b());
    let mut table = DeltaTable::new(a.len(), b.len())?;
    table.compare(a, b)?;
    BasicDeltaResult::backtrace(&table, input)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::deltafile::{DeltaFile, FileSpec};
    use proptest::prelude::*;
    use similar::{capture_diff_slices, Algorithm, DiffOp};

    /// Small alphabet so that random files share lines often.
    fn lines() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d"]), 0..12)
            .prop_map(|v| v.into_iter().map(String::from).collect())
    }

    fn make(a: &[String], b: &[String]) -> DeltaInput {
        DeltaInput::from_files(
            FileSpec::new("a"),
            DeltaFile::from_lines(a.iter().cloned()),
            FileSpec::new("b"),
            DeltaFile::from_lines(b.iter().cloned()),
        )
    }

    /// Exhaustive LCS by memoised recursion; fine for the sizes above.
    fn brute_lcs(a: &[String], b: &[String]) -> usize {
        fn go(
            a: &[String],
            b: &[String],
            memo: &mut std::collections::HashMap<(usize, usize), usize>,
        ) -> usize {
            if a.is_empty() || b.is_empty() {
                return 0;
            }
            let key = (a.len(), b.len());
            if let Some(&v) = memo.get(&key) {
                return v;
            }
            let v = if a[0] == b[0] {
                1 + go(&a[1..], &b[1..], memo)
            } else {
                go(&a[1..], b, memo).max(go(a, &b[1..], memo))
            };
            memo.insert(key, v);
            v
        }
        go(a, b, &mut Default::default())
    }

    /// Myers' algorithm finds a minimal edit script, so its matched lines
    /// form a longest common subsequence.
    fn myers_common(a: &[String], b: &[String]) -> usize {
        capture_diff_slices(Algorithm::Myers, a, b)
            .iter()
            .map(|op| match op {
                DiffOp::Equal { len, .. } => *len,
                _ => 0,
            })
            .sum()
    }

    proptest! {
        #[test]
        fn common_count_is_lcs(a in lines(), b in lines()) {
            let input = make(&a, &b);
            let result = delta(&input).unwrap();
            prop_assert_eq!(result.common, brute_lcs(&a, &b));
            prop_assert_eq!(result.common, myers_common(&a, &b));
        }

        #[test]
        fn counts_are_conserved(a in lines(), b in lines()) {
            let input = make(&a, &b);
            let result = delta(&input).unwrap();
            prop_assert_eq!(result.insertions + result.common, b.len());
            prop_assert_eq!(result.deletions + result.common, a.len());
            prop_assert_eq!(result.diff_lines.len(), result.insertions + result.deletions);
            prop_assert_eq!(result.common_lines.len(), result.common);
        }

        #[test]
        fn script_replays_both_files(a in lines(), b in lines()) {
            let input = make(&a, &b);
            let result = delta(&input).unwrap();
            let mut old = Vec::new();
            let mut new = Vec::new();
            for edit in result.script() {
                match *edit {
                    Edit::Common { old: o, new: n } => {
                        prop_assert_eq!(&a[o], &b[n]);
                        old.push(a[o].clone());
                        new.push(b[n].clone());
                    }
                    Edit::Delete { old: o } => old.push(a[o].clone()),
                    Edit::Insert { new: n } => new.push(b[n].clone()),
                }
            }
            prop_assert_eq!(old, a);
            prop_assert_eq!(new, b);
        }

        #[test]
        fn self_delta_is_identity(a in lines()) {
            let input = make(&a, &a);
            let result = delta(&input).unwrap();
            prop_assert_eq!(result.insertions, 0);
            prop_assert_eq!(result.deletions, 0);
            prop_assert_eq!(result.common, a.len());
        }
    }
}
