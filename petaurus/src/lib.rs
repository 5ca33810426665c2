//! # Petaurus
//!
//! Myers-style sequence diffing with semantic cleanup passes.
//!
//! Named after *Petaurus breviceps* (the sugar glider), which glides from
//! tree to tree.
//!
//! ## Algorithm overview
//!
//! Petaurus computes an edit script (DELETE / INSERT / EQUAL operations)
//! between two ordered sequences of comparable elements:
//!
//! 1. **Speedups**: equality short-circuit, common prefix/suffix trim by
//!    binary search, containment scan, single-element fallback
//! 2. **Bisection**: the linear-space Myers search, walking forward and
//!    reverse frontiers until they cross, then recursing on the halves
//! 3. **Cleanup**: boundary merge/factoring and a semantic-lossless shift
//!    driven by a pluggable structural cost
//!
//! The script is minimal-ish by design: the speedups trade strict
//! minimality for speed and are part of the contract.
//!
//! Elements are abstract: anything implementing [`DiffElement`] can be
//! diffed. Once two regions are declared equal they are merged, letting
//! each element learn its counterpart's position in the other sequence.
//!
//! ## Usage
//!
//! ```
//! use petaurus::{EditKind, Nodes, diff};
//!
//! let before: Nodes<char> = "abcabba".chars().collect();
//! let after: Nodes<char> = "cbabac".chars().collect();
//!
//! let script = diff(before, after);
//! assert!(script.iter().any(|edit| edit.kind == EditKind::Equal));
//! ```

#![warn(missing_docs)]

mod tracing_macros;

pub mod cleanup;
mod myers;
mod sequence;

pub use sequence::{DiffElement, Edit, EditKind, Nodes};

use crate::tracing_macros::trace;

/// Compute an edit script between two element sequences.
///
/// Runs the bisecting diff followed by both cleanup passes. Total for
/// finite sequences: fully dissimilar inputs fall back to a DELETE+INSERT
/// pair. Concatenating the Delete+Equal segments reproduces `before`;
/// concatenating the Insert+Equal segments reproduces `after`.
pub fn diff<E: DiffElement>(before: Nodes<E>, after: Nodes<E>) -> Vec<Edit<E>> {
    trace!(before = before.len(), after = after.len(), "diff");
    let mut edits = myers::diff_main(before, after);
    cleanup::merge_adjacent(&mut edits);
    cleanup::semantic_lossless(&mut edits);
    edits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Nodes<char> {
        s.chars().collect()
    }

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
    fn reconstruction_law() {
        let edits = diff(chars("abcabba"), chars("cbabac"));
        let (a, b) = sides(&edits);
        assert_eq!(a, "abcabba");
        assert_eq!(b, "cbabac");
    }

    #[test]
    fn idempotence() {
        let edits = diff(chars("hello world"), chars("hello world"));
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].kind, EditKind::Equal);
        assert_eq!(edits[0].nodes.len(), "hello world".len());
    }

    #[test]
    fn swapped_roles_reconstruct_consistently() {
        for (a, b) in [("abcabba", "cbabac"), ("", "xyz"), ("same", "same")] {
            let forward = diff(chars(a), chars(b));
            let (fa, fb) = sides(&forward);
            assert_eq!((fa.as_str(), fb.as_str()), (a, b));
            let backward = diff(chars(b), chars(a));
            let (ba, bb) = sides(&backward);
            assert_eq!((ba.as_str(), bb.as_str()), (b, a));
        }
    }
}
