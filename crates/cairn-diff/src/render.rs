//! Text renderings of a [`BasicDeltaResult`].
//!
//! Every function here is pure: the same result always renders to the same
//! bytes.

use std::fmt::Write as _;

use crate::config::RenderMode;
use crate::result::{BasicDeltaResult, Change, Edit};

/// Width of the `+`/`-` bar drawn by [`stat`].
const STAT_GRAPH_WIDTH: usize = 40;

/// Render with the given mode. `context` only applies to
/// [`RenderMode::Enhanced`].
pub fn render(result: &BasicDeltaResult<'_>, mode: RenderMode, context: usize) -> String {
    match mode {
        RenderMode::Minimal => render_minimal(result),
        RenderMode::Enhanced => render_enhanced(result, context),
    }
}

/// Changed lines only, `-` for deletions and `+` for insertions.
pub fn render_minimal(result: &BasicDeltaResult<'_>) -> String {
    let mut out = String::new();
    for line in &result.diff_lines {
        out.push(marker(line.change));
        out.push_str(&line.text);
        out.push('\n');
    }
    out
}

fn marker(change: Change) -> char {
    match change {
        Change::Insertion => '+',
        Change::Deletion => '-',
    }
}

/// A contiguous slice of the edit script to print together.
struct Hunk {
    /// Script indices, half-open.
    start: usize,
    end: usize,
    old_start: usize,
    new_start: usize,
    old_count: usize,
    new_count: usize,
}

/// Group changes whose gaps are at most `2 * context` common lines, and pad
/// each group with up to `context` common lines on both sides.
fn hunks(script: &[Edit], context: usize) -> Vec<Hunk> {
    // Positions in the old and new file reached before each script step.
    let mut before = Vec::with_capacity(script.len() + 1);
    let (mut old, mut new) = (0usize, 0usize);
    for edit in script {
        before.push((old, new));
        match edit {
            Edit::Common { .. } => {
                old += 1;
                new += 1;
            }
            Edit::Delete { .. } => old += 1,
            Edit::Insert { .. } => new += 1,
        }
    }
    before.push((old, new));

    let changed: Vec<usize> = script
        .iter()
        .enumerate()
        .filter(|(_, e)| !matches!(e, Edit::Common { .. }))
        .map(|(k, _)| k)
        .collect();

    let mut groups: Vec<(usize, usize)> = Vec::new();
    for &k in &changed {
        match groups.last_mut() {
            Some((_, last)) if k - *last - 1 <= context.saturating_mul(2) => *last = k,
            _ => groups.push((k, k)),
        }
    }

    groups
        .into_iter()
        .map(|(first, last)| {
            let start = first.saturating_sub(context);
            let end = last.saturating_add(1).saturating_add(context).min(script.len());
            let (old_start, new_start) = before[start];
            let (old_end, new_end) = before[end];
            Hunk {
                start,
                end,
                old_start,
                new_start,
                old_count: old_end - old_start,
                new_count: new_end - new_start,
            }
        })
        .collect()
}

/// `start,count` the way unified diffs print it. An empty range names the
/// line before it.
fn range(start: usize, count: usize) -> String {
    match count {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{count}", start + 1),
    }
}

/// Changed lines with surrounding context, as unified-diff hunks.
///
/// Identical inputs render as the empty string.
pub fn render_enhanced(result: &BasicDeltaResult<'_>, context: usize) -> String {
    let script = result.script();
    let hunks = hunks(script, context);
    if hunks.is_empty() {
        return String::new();
    }

    let input = result.input();
    let (a, b) = (input.file_a().lines(), input.file_b().lines());

    let mut out = String::new();
    let _ = writeln!(out, "--- {}", input.spec_a().label);
    let _ = writeln!(out, "+++ {}", input.spec_b().label);
    for hunk in hunks {
        let _ = writeln!(
            out,
            "@@ -{} +{} @@",
            range(hunk.old_start, hunk.old_count),
            range(hunk.new_start, hunk.new_count)
        );
        for edit in &script[hunk.start..hunk.end] {
            let (prefix, text) = match *edit {
                Edit::Common { old, .. } => (' ', &a[old]),
                Edit::Delete { old } => ('-', &a[old]),
                Edit::Insert { new } => ('+', &b[new]),
            };
            out.push(prefix);
            out.push_str(text);
            out.push('\n');
        }
    }
    out
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// One-line statistics built from the counters alone.
pub fn summary(result: &BasicDeltaResult<'_>) -> String {
    format!(
        "{} insertion{}(+), {} deletion{}(-), {} line{} in common",
        result.insertions,
        plural(result.insertions),
        result.deletions,
        plural(result.deletions),
        result.common,
        plural(result.common),
    )
}

/// A `--stat` style line: file names, change count and a `+`/`-` bar.
pub fn stat(result: &BasicDeltaResult<'_>) -> String {
    let input = result.input();
    let (la, lb) = (&input.spec_a().label, &input.spec_b().label);
    let name = if la == lb {
        la.clone()
    } else {
        format!("{la} => {lb}")
    };

    let total = result.insertions + result.deletions;
    let (plus, minus) = if total <= STAT_GRAPH_WIDTH {
        (result.insertions, result.deletions)
    } else {
        let scale = |n: usize| match n {
            0 => 0,
            n => (n * STAT_GRAPH_WIDTH / total).max(1),
        };
        (scale(result.insertions), scale(result.deletions))
    };

    format!("{name} | {total} {}{}", "+".repeat(plus), "-".repeat(minus))
}
