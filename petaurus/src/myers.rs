//! The bisecting Myers diff over element sequences.
//!
//! Ported to generic element runs from the classic linear-space formulation:
//! two furthest-reaching frontiers walk the edit graph from both ends, the
//! first crossing splits the problem into two independent halves. Speedups
//! run before bisection in a fixed order: equality short-circuit,
//! common-prefix/suffix trim, containment scan, single-element fallback.

use crate::sequence::{DiffElement, Edit, EditKind, Nodes};
use crate::tracing_macros::trace;

/// Compute a raw edit script. Callers are expected to run the cleanup
/// passes afterwards; [`crate::diff`] does both.
pub(crate) fn diff_main<E: DiffElement>(a: Nodes<E>, b: Nodes<E>) -> Vec<Edit<E>> {
    // Equality short-circuit.
    if a.equals(&b) {
        if a.is_empty() {
            return Vec::new();
        }
        return vec![Edit::equal(a.merge(&b))];
    }

    // Trim off the common prefix.
    let p = common_prefix(&a, &b);
    let prefix_a = a.slice(..p);
    let prefix_b = b.slice(..p);
    let a = a.slice(p..);
    let b = b.slice(p..);

    // Trim off the common suffix.
    let s = common_suffix(&a, &b);
    let suffix_a = a.slice(a.len() - s..);
    let suffix_b = b.slice(b.len() - s..);
    let a = a.slice(..a.len() - s);
    let b = b.slice(..b.len() - s);

    // Diff the middle block.
    let mut edits = compute(a, b);

    // Restore the prefix and suffix as merged equalities.
    if !prefix_a.is_empty() {
        edits.insert(0, Edit::equal(prefix_a.merge(&prefix_b)));
    }
    if !suffix_a.is_empty() {
        edits.push(Edit::equal(suffix_a.merge(&suffix_b)));
    }
    edits
}

fn compute<E: DiffElement>(a: Nodes<E>, b: Nodes<E>) -> Vec<Edit<E>> {
    if a.is_empty() {
        return vec![Edit::insert(b)];
    }
    if b.is_empty() {
        return vec![Edit::delete(a)];
    }

    // Containment: does the shorter side appear whole inside the longer?
    let a_longer = a.len() > b.len();
    let (long, short) = if a_longer { (&a, &b) } else { (&b, &a) };
    let contained = (0..=long.len() - short.len())
        .find(|&i| short.iter().zip(&long[i..]).all(|(s, l)| s.equals(l)));
    if let Some(i) = contained {
        // Excess on the long side is a deletion when the first input is the
        // longer one, an insertion otherwise.
        let excess = if a_longer {
            EditKind::Delete
        } else {
            EditKind::Insert
        };
        let mut edits = Vec::new();
        if i > 0 {
            edits.push(Edit {
                kind: excess,
                nodes: long.slice(..i),
            });
        }
        edits.push(Edit::equal(
            short.clone().merge(&long.slice(i..i + short.len())),
        ));
        if i + short.len() < long.len() {
            edits.push(Edit {
                kind: excess,
                nodes: long.slice(i + short.len()..),
            });
        }
        return edits;
    }

    if short.len() == 1 {
        // After the trims and the containment scan a single leftover
        // element cannot be an equality.
        return vec![Edit::delete(a), Edit::insert(b)];
    }

    bisect(a, b)
}

/// Find a point where the forward and reverse edit paths cross, then split
/// the problem in two and recurse on the halves in order.
fn bisect<E: DiffElement>(a: Nodes<E>, b: Nodes<E>) -> Vec<Edit<E>> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    trace!(a_len = a.len(), b_len = b.len(), "bisect");
    let max_d = (a.len() + b.len()).div_ceil(2) as isize;
    let v_offset = max_d;
    let v_len = (2 * max_d) as usize;
    let mut v1 = vec![-1isize; v_len];
    let mut v2 = vec![-1isize; v_len];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;
    let delta = n - m;
    // With an odd delta the forward path detects the collision, with an
    // even delta the reverse path does.
    let front = delta % 2 != 0;
    // Trim diagonals that ran off the edit graph; without this the k loop
    // bound is wrong.
    let mut k1start: isize = 0;
    let mut k1end: isize = 0;
    let mut k2start: isize = 0;
    let mut k2end: isize = 0;
    for d in 0..max_d {
        // Walk the forward path one step.
        let mut k1 = -d + k1start;
        while k1 <= d - k1end {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            // Snake: advance while elements are equal.
            while x1 < n && y1 < m && a[x1 as usize].equals(&b[y1 as usize]) {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;
            if x1 > n {
                // Ran off the right of the graph.
                k1end += 2;
            } else if y1 > m {
                // Ran off the bottom of the graph.
                k1start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && (k2_offset as usize) < v_len && v2[k2_offset as usize] != -1
                {
                    // Mirror x2 onto the top-left coordinate system.
                    let x2 = n - v2[k2_offset as usize];
                    if x1 >= x2 {
                        return bisect_split(a, b, x1 as usize, y1 as usize);
                    }
                }
            }
            k1 += 2;
        }

        // Walk the reverse path one step.
        let mut k2 = -d + k2start;
        while k2 <= d - k2end {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < n && y2 < m && a[(n - x2 - 1) as usize].equals(&b[(m - y2 - 1) as usize])
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;
            if x2 > n {
                // Ran off the left of the graph.
                k2end += 2;
            } else if y2 > m {
                // Ran off the top of the graph.
                k2start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && (k1_offset as usize) < v_len && v1[k1_offset as usize] != -1
                {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    // Mirror x2 onto the top-left coordinate system.
                    let x2 = n - x2;
                    if x1 >= x2 {
                        return bisect_split(a, b, x1 as usize, y1 as usize);
                    }
                }
            }
            k2 += 2;
        }
    }
    // No commonality at all, or the depth bound was hit.
    vec![Edit::delete(a), Edit::insert(b)]
}

fn bisect_split<E: DiffElement>(a: Nodes<E>, b: Nodes<E>, x: usize, y: usize) -> Vec<Edit<E>> {
    let a1 = a.slice(..x);
    let b1 = b.slice(..y);
    let a2 = a.slice(x..);
    let b2 = b.slice(y..);

    let mut edits = diff_main(a1, b1);
    edits.extend(diff_main(a2, b2));
    edits
}

/// Length of the longest common prefix, found by binary search over slice
/// comparisons.
pub(crate) fn common_prefix<E: DiffElement>(a: &Nodes<E>, b: &Nodes<E>) -> usize {
    if a.is_empty() || b.is_empty() || !a[0].equals(&b[0]) {
        return 0;
    }
    let mut lo = 0;
    let mut hi = a.len().min(b.len());
    let mut mid = hi;
    let mut start = 0;
    while lo < mid {
        if slices_equal(&a[start..mid], &b[start..mid]) {
            lo = mid;
            start = lo;
        } else {
            hi = mid;
        }
        mid = (hi - lo) / 2 + lo;
    }
    mid
}

/// Length of the longest common suffix, found by binary search.
pub(crate) fn common_suffix<E: DiffElement>(a: &Nodes<E>, b: &Nodes<E>) -> usize {
    if a.is_empty() || b.is_empty() || !a[a.len() - 1].equals(&b[b.len() - 1]) {
        return 0;
    }
    let mut lo = 0;
    let mut hi = a.len().min(b.len());
    let mut mid = hi;
    let mut end = 0;
    while lo < mid {
        if slices_equal(
            &a[a.len() - mid..a.len() - end],
            &b[b.len() - mid..b.len() - end],
        ) {
            lo = mid;
            end = lo;
        } else {
            hi = mid;
        }
        mid = (hi - lo) / 2 + lo;
    }
    mid
}

fn slices_equal<E: DiffElement>(a: &[E], b: &[E]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Nodes<char> {
        s.chars().collect()
    }

    fn kinds<E: DiffElement>(edits: &[Edit<E>]) -> Vec<EditKind> {
        edits.iter().map(|e| e.kind).collect()
    }

    /// Rebuild both inputs from the script, per side.
    fn sides(edits: &[Edit<char>]) -> (String, String) {
        let mut a = String::new();
        let mut b = String::new();
        for edit in edits {
            for &ch in edit.nodes.iter() {
                match edit.kind {
                    EditKind::Delete => a.push(ch),
                    EditKind::Insert => b.push(ch),
                    EditKind::Equal => {
                        a.push(ch);
                        b.push(ch);
                    }
                }
            }
        }
        (a, b)
    }

    #[test]
    fn equal_inputs_single_op() {
        let edits = diff_main(chars("abc"), chars("abc"));
        assert_eq!(kinds(&edits), vec![EditKind::Equal]);
        assert_eq!(diff_main(chars(""), chars("")).len(), 0);
    }

    #[test]
    fn empty_side_single_op() {
        assert_eq!(
            kinds(&diff_main(chars(""), chars("abc"))),
            vec![EditKind::Insert]
        );
        assert_eq!(
            kinds(&diff_main(chars("abc"), chars(""))),
            vec![EditKind::Delete]
        );
    }

    #[test]
    fn containment_splits_in_three() {
        let edits = diff_main(chars("abc"), chars("xabcz"));
        assert_eq!(
            kinds(&edits),
            vec![EditKind::Insert, EditKind::Equal, EditKind::Insert]
        );
        // Reversed roles flip the excess to deletions.
        let edits = diff_main(chars("xabcz"), chars("abc"));
        assert_eq!(
            kinds(&edits),
            vec![EditKind::Delete, EditKind::Equal, EditKind::Delete]
        );
    }

    #[test]
    fn single_element_fallback() {
        let edits = diff_main(chars("abc"), chars("d"));
        assert_eq!(kinds(&edits), vec![EditKind::Delete, EditKind::Insert]);
    }

    #[test]
    fn prefix_and_suffix_are_trimmed() {
        let a = chars("xxabyy");
        let b = chars("xxcdyy");
        let edits = diff_main(a, b);
        assert_eq!(edits.first().map(|e| e.kind), Some(EditKind::Equal));
        assert_eq!(edits.last().map(|e| e.kind), Some(EditKind::Equal));
        let (ra, rb) = sides(&edits);
        assert_eq!(ra, "xxabyy");
        assert_eq!(rb, "xxcdyy");
    }

    #[test]
    fn bisect_reconstructs_both_sides() {
        let edits = diff_main(chars("abcabba"), chars("cbabac"));
        let (a, b) = sides(&edits);
        assert_eq!(a, "abcabba");
        assert_eq!(b, "cbabac");
        // The script found actual structure, not a wholesale replacement.
        assert!(edits.iter().any(|e| e.kind == EditKind::Equal));
    }

    #[test]
    fn dissimilar_inputs_fall_back_to_replace() {
        let edits = diff_main(chars("abcd"), chars("wxyz"));
        let (a, b) = sides(&edits);
        assert_eq!(a, "abcd");
        assert_eq!(b, "wxyz");
        assert!(edits.iter().all(|e| e.kind != EditKind::Equal));
    }

    #[test]
    fn common_prefix_binary_search() {
        assert_eq!(common_prefix(&chars("1234abcdef"), &chars("1234xyz")), 4);
        assert_eq!(common_prefix(&chars("abc"), &chars("xyz")), 0);
        assert_eq!(common_prefix(&chars("1234"), &chars("1234xyz")), 4);
    }

    #[test]
    fn common_suffix_binary_search() {
        assert_eq!(common_suffix(&chars("abcdef1234"), &chars("xyz1234")), 4);
        assert_eq!(common_suffix(&chars("abc"), &chars("xyz")), 0);
        assert_eq!(common_suffix(&chars("1234"), &chars("xyz1234")), 4);
    }
}
