//! # Reconciliation Engine
//!
//! Turns an edited buffer back into paragraph operations against the store
//! it was projected from.
//!
//! ```text
//! old paragraphs ──┐
//!                  ├─ align (LCS) ─→ keep / remove / add ─→ pair into hunks ─→ EditPlan
//! new lines ───────┘
//! ```
//!
//! Within each run of unmatched lines between two aligned anchors, removed
//! and added lines are paired in order. A pair is an `Update` (the paragraph
//! keeps its style), leftovers are `Delete`s or `Insert`s.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::model::ParagraphStore;
use crate::ops::{EditPlan, ParagraphOp};
use crate::projector::{EditBuffer, EscapeFault, Projection};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Malformed buffer at line {line}, column {column}: {fault}")]
    MalformedBuffer {
        line: usize,
        column: usize,
        fault: EscapeFault,
    },

    #[error("Projection has {lines} lines but the store has {paragraphs} paragraphs")]
    ProjectionMismatch { lines: usize, paragraphs: usize },
}

/// One step of a line alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Keep { old: usize, new: usize },
    Remove { old: usize },
    Add { new: usize },
}

/// Compute the operations that turn `store` into `buffer`
#[instrument(skip_all, fields(paragraphs = store.len(), lines = buffer.len()))]
pub fn reconcile(
    store: &ParagraphStore,
    projection: &Projection,
    buffer: &EditBuffer,
) -> Result<EditPlan, ReconcileError> {
    projection.check(store)?;
    let new_texts = buffer.decode()?;

    let paragraphs = store.paragraphs();
    let old: Vec<&str> = projection
        .indices()
        .iter()
        .map(|&i| paragraphs[i].text.as_str())
        .collect();
    let new: Vec<&str> = new_texts.iter().map(String::as_str).collect();

    let steps = align(&old, &new);
    let ops = ops_from_steps(&steps, projection.indices(), &old, &new);
    let plan = EditPlan::from_ops(ops);

    let summary = plan.summary();
    debug!(
        updated = summary.updated,
        inserted = summary.inserted,
        deleted = summary.deleted,
        "Reconciled buffer"
    );

    Ok(plan)
}

/// Largest middle section aligned with a full table; bigger ones are first
/// split on lines that occur exactly once on each side.
const MAX_TABLE_CELLS: usize = 2 << 20;

/// Align two line sequences, matching as many equal lines as possible.
///
/// Among alignments with the most matches, the one whose matched pairs sit
/// closest to the diagonal (least total `|old - new|`) wins.
pub(crate) fn align(old: &[&str], new: &[&str]) -> Vec<Step> {
    let mut steps = Vec::with_capacity(old.len().max(new.len()));
    align_range(old, new, 0, 0, &mut steps);
    steps
}

fn align_range(a: &[&str], b: &[&str], a_off: usize, b_off: usize, steps: &mut Vec<Step>) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    steps.extend((0..prefix).map(|k| Step::Keep {
        old: a_off + k,
        new: b_off + k,
    }));

    let middle_a = &a[prefix..a.len() - suffix];
    let middle_b = &b[prefix..b.len() - suffix];
    let (a_mid, b_mid) = (a_off + prefix, b_off + prefix);

    if middle_a.is_empty() || middle_b.is_empty() {
        steps.extend((0..middle_a.len()).map(|k| Step::Remove { old: a_mid + k }));
        steps.extend((0..middle_b.len()).map(|k| Step::Add { new: b_mid + k }));
    } else if (middle_a.len() + 1) * (middle_b.len() + 1) <= MAX_TABLE_CELLS {
        align_table(middle_a, middle_b, a_mid, b_mid, steps);
    } else {
        align_large(middle_a, middle_b, a_mid, b_mid, steps);
    }

    let (a_tail, b_tail) = (a_off + a.len() - suffix, b_off + b.len() - suffix);
    steps.extend((0..suffix).map(|k| Step::Keep {
        old: a_tail + k,
        new: b_tail + k,
    }));
}

/// Best alignment of two suffixes: most matches, then least displacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Score {
    matched: u32,
    displacement: u64,
}

impl Score {
    fn beats(self, other: Score) -> bool {
        self.matched > other.matched
            || (self.matched == other.matched && self.displacement < other.displacement)
    }
}

fn align_table(a: &[&str], b: &[&str], a_off: usize, b_off: usize, steps: &mut Vec<Step>) {
    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    let distance = |i: usize, j: usize| (a_off + i).abs_diff(b_off + j) as u64;

    // table[i * width + j] = best score for a[i..] against b[j..]
    let mut table = vec![Score::default(); (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            let mut best = table[(i + 1) * width + j];
            let skip_new = table[i * width + j + 1];
            if skip_new.beats(best) {
                best = skip_new;
            }
            if a[i] == b[j] {
                let next = table[(i + 1) * width + j + 1];
                let keep = Score {
                    matched: next.matched + 1,
                    displacement: next.displacement + distance(i, j),
                };
                if !best.beats(keep) {
                    best = keep;
                }
            }
            table[i * width + j] = best;
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        let here = table[i * width + j];
        if a[i] == b[j] {
            let next = table[(i + 1) * width + j + 1];
            if here.matched == next.matched + 1
                && here.displacement == next.displacement + distance(i, j)
            {
                steps.push(Step::Keep {
                    old: a_off + i,
                    new: b_off + j,
                });
                i += 1;
                j += 1;
                continue;
            }
        }

        let skip_old = table[(i + 1) * width + j];
        let skip_new = table[i * width + j + 1];
        let remove = skip_old.beats(skip_new)
            || (skip_old == skip_new && distance(i + 1, j) <= distance(i, j + 1));

        if remove {
            steps.push(Step::Remove { old: a_off + i });
            i += 1;
        } else {
            steps.push(Step::Add { new: b_off + j });
            j += 1;
        }
    }

    steps.extend((i..n).map(|i| Step::Remove { old: a_off + i }));
    steps.extend((j..m).map(|j| Step::Add { new: b_off + j }));
}

/// Split on lines unique to both sides (longest increasing run of them),
/// aligning the gaps between them recursively. Without such anchors the
/// section is replaced wholesale.
fn align_large(a: &[&str], b: &[&str], a_off: usize, b_off: usize, steps: &mut Vec<Step>) {
    let anchors = unique_anchors(a, b);
    if anchors.is_empty() {
        debug!(old = a.len(), new = b.len(), "No anchors in large section");
        steps.extend((0..a.len()).map(|k| Step::Remove { old: a_off + k }));
        steps.extend((0..b.len()).map(|k| Step::Add { new: b_off + k }));
        return;
    }

    let (mut i, mut j) = (0, 0);
    for (ai, bj) in anchors {
        align_range(&a[i..ai], &b[j..bj], a_off + i, b_off + j, steps);
        steps.push(Step::Keep {
            old: a_off + ai,
            new: b_off + bj,
        });
        i = ai + 1;
        j = bj + 1;
    }
    align_range(&a[i..], &b[j..], a_off + i, b_off + j, steps);
}

/// Pairs `(i, j)` of lines occurring once in `a` and once in `b`, forming the
/// longest run increasing on both sides
fn unique_anchors(a: &[&str], b: &[&str]) -> Vec<(usize, usize)> {
    let mut counts: HashMap<&str, (u32, usize, u32, usize)> = HashMap::new();
    for (i, line) in a.iter().enumerate() {
        let entry = counts.entry(*line).or_default();
        entry.0 += 1;
        entry.1 = i;
    }
    for (j, line) in b.iter().enumerate() {
        if let Some(entry) = counts.get_mut(line) {
            entry.2 += 1;
            entry.3 = j;
        }
    }

    let mut pairs: Vec<(usize, usize)> = counts
        .values()
        .filter(|(in_a, _, in_b, _)| *in_a == 1 && *in_b == 1)
        .map(|&(_, i, _, j)| (i, j))
        .collect();
    pairs.sort_unstable();

    // Patience sort over `j`; `tails[k]` ends the best run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; pairs.len()];
    for (k, &(_, j)) in pairs.iter().enumerate() {
        let slot = tails.partition_point(|&t| pairs[t].1 < j);
        if slot > 0 {
            previous[k] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(k);
        } else {
            tails[slot] = k;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(k) = cursor {
        run.push(pairs[k]);
        cursor = previous[k];
    }
    run.reverse();
    run
}

/// Pair unmatched lines between anchors into operations.
///
/// `indices[k]` is the paragraph index behind old line `k`.
pub(crate) fn ops_from_steps(
    steps: &[Step],
    indices: &[usize],
    old: &[&str],
    new: &[&str],
) -> Vec<ParagraphOp> {
    let mut ops = Vec::new();
    let mut survivor: Option<usize> = None;
    let mut removed: Vec<usize> = Vec::new();
    let mut added: Vec<usize> = Vec::new();

    let mut flush = |removed: &mut Vec<usize>,
                     added: &mut Vec<usize>,
                     survivor: &mut Option<usize>| {
        let paired = removed.len().min(added.len());

        for (&o, &n) in removed.iter().zip(added.iter()) {
            if old[o] != new[n] {
                ops.push(ParagraphOp::Update {
                    index: indices[o],
                    text: new[n].to_string(),
                });
            }
            *survivor = Some(indices[o]);
        }
        for &o in &removed[paired..] {
            ops.push(ParagraphOp::Delete { index: indices[o] });
        }
        for &n in &added[paired..] {
            ops.push(ParagraphOp::Insert {
                after: *survivor,
                position: n,
                text: new[n].to_string(),
            });
        }

        removed.clear();
        added.clear();
    };

    for step in steps {
        match *step {
            Step::Keep { old: o, .. } => {
                flush(&mut removed, &mut added, &mut survivor);
                survivor = Some(indices[o]);
            }
            Step::Remove { old: o } => removed.push(o),
            Step::Add { new: n } => added.push(n),
        }
    }
    flush(&mut removed, &mut added, &mut survivor);

    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(steps: &[Step]) -> String {
        steps
            .iter()
            .map(|s| match s {
                Step::Keep { .. } => '=',
                Step::Remove { .. } => '-',
                Step::Add { .. } => '+',
            })
            .collect()
    }

    #[test]
    fn test_align_identical() {
        let steps = align(&["a", "b"], &["a", "b"]);
        assert_eq!(kinds(&steps), "==");
    }

    #[test]
    fn test_align_duplicate_lines_stay_on_diagonal() {
        // Dropping one of two identical lines removes the later one
        let steps = align(&["a", "a", "b"], &["a", "b"]);
        assert_eq!(
            steps,
            vec![
                Step::Keep { old: 0, new: 0 },
                Step::Remove { old: 1 },
                Step::Keep { old: 2, new: 1 },
            ]
        );
    }

    #[test]
    fn test_align_duplicates_in_middle() {
        let steps = align(&["x", "a", "a", "y"], &["z", "a", "a", "a", "w"]);
        let keeps: Vec<(usize, usize)> = steps
            .iter()
            .filter_map(|s| match s {
                Step::Keep { old, new } => Some((*old, *new)),
                _ => None,
            })
            .collect();
        assert_eq!(keeps, vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn test_align_prefers_match_on_diagonal() {
        // "b" could pair with either new line; the one in place wins
        let old = ["a", "b", "c"];
        let new = ["b", "b", "c2"];
        let steps = align(&old, &new);
        assert!(steps.contains(&Step::Keep { old: 1, new: 1 }));
        assert!(!steps.contains(&Step::Keep { old: 1, new: 0 }));

        let ops = ops_from_steps(&steps, &[0, 1, 2], &old, &new);
        assert_eq!(
            ops,
            vec![
                ParagraphOp::Update { index: 0, text: "b".to_string() },
                ParagraphOp::Update { index: 2, text: "c2".to_string() },
            ]
        );
    }

    #[test]
    fn test_unique_anchors_increasing_run() {
        let a = ["u", "x", "v", "x", "w"];
        let b = ["v", "w", "u", "x"];
        // u, v, w are unique on both sides; v then w is the longest ordered run
        assert_eq!(unique_anchors(&a, &b), vec![(2, 0), (4, 1)]);
    }

    #[test]
    fn test_large_section_splits_on_anchors() {
        let a = ["p", "one", "q", "two"];
        let b = ["p2", "one", "q2", "two"];
        let mut steps = Vec::new();
        align_large(&a, &b, 0, 0, &mut steps);
        assert_eq!(kinds(&steps), "-+=-+=");

        let ops = ops_from_steps(&steps, &[0, 1, 2, 3], &a, &b);
        assert_eq!(EditPlan::from_ops(ops).summary().updated, 2);
    }

    #[test]
    fn test_large_section_without_anchors_is_replaced() {
        let a = ["x", "x"];
        let b = ["y"];
        let mut steps = Vec::new();
        align_large(&a, &b, 3, 3, &mut steps);
        assert_eq!(
            steps,
            vec![Step::Remove { old: 3 }, Step::Remove { old: 4 }, Step::Add { new: 3 }]
        );
    }

    #[test]
    fn test_oversized_middle_pairs_edits_in_place() {
        let old: Vec<String> = (0..1600).map(|i| format!("line {}", i)).collect();
        let new: Vec<String> = (0..1600)
            .map(|i| if i % 10 == 0 { format!("edited {}", i) } else { format!("line {}", i) })
            .collect();
        let old: Vec<&str> = old.iter().map(String::as_str).collect();
        let new: Vec<&str> = new.iter().map(String::as_str).collect();
        assert!(old.len() * new.len() > MAX_TABLE_CELLS);

        let steps = align(&old, &new);
        let indices: Vec<usize> = (0..old.len()).collect();
        let summary = EditPlan::from_ops(ops_from_steps(&steps, &indices, &old, &new)).summary();
        assert_eq!((summary.updated, summary.inserted, summary.deleted), (160, 0, 0));
    }

    #[test]
    fn test_align_swap() {
        let steps = align(&["a", "b"], &["b", "a"]);
        assert_eq!(kinds(&steps), "-=+");
    }

    #[test]
    fn test_pairing_produces_update() {
        let old = ["a", "b"];
        let new = ["a", "b2"];
        let steps = align(&old, &new);
        let ops = ops_from_steps(&steps, &[0, 1], &old, &new);
        assert_eq!(
            ops,
            vec![ParagraphOp::Update { index: 1, text: "b2".to_string() }]
        );
    }

    #[test]
    fn test_surplus_lines_insert_after_last_pair() {
        let old = ["a", "b"];
        let new = ["a", "b2", "c"];
        let steps = align(&old, &new);
        let ops = ops_from_steps(&steps, &[0, 1], &old, &new);
        assert_eq!(
            ops,
            vec![
                ParagraphOp::Update { index: 1, text: "b2".to_string() },
                ParagraphOp::Insert { after: Some(1), position: 2, text: "c".to_string() },
            ]
        );
    }

    #[test]
    fn test_leading_insert_has_no_anchor() {
        let old = ["a"];
        let new = ["x", "a"];
        let steps = align(&old, &new);
        let ops = ops_from_steps(&steps, &[0], &old, &new);
        assert_eq!(
            ops,
            vec![ParagraphOp::Insert { after: None, position: 0, text: "x".to_string() }]
        );
    }
}
