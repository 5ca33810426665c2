//! Structural tree diffing with selector-addressed change reports.
//!
//! The pipeline: both trees are flattened by [`linearize`] into record
//! sequences, diffed by petaurus into an edit script, and replayed by the
//! reconstructor into two linked shadow trees from which the final records
//! are rendered.

mod linearize;
mod shadow;

pub use linearize::{Record, RecordKind, Side, TagPath, linearize};

use crate::parser::parse_body;
use crate::untyped_dom::Element;
use shadow::Reconstructor;
use thiserror::Error;

/// Errors raised while replaying an edit script into shadow trees.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A record's parent could not be located by path during replay. This
    /// means the linearized paths and the replay order disagree, which is
    /// an upstream defect; the diff is aborted.
    #[error("cannot locate parent of {record} in the {side} shadow tree")]
    StructuralLookup {
        /// Which shadow tree the lookup ran against.
        side: Side,
        /// Description of the record being placed.
        record: String,
    },
}

/// Classification of a reported difference.
///
/// Element-level kinds are unsuffixed; text-level kinds carry a `-string`
/// suffix in their wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// An element was inserted.
    Insert,
    /// Child content of this element was removed.
    Remove,
    /// An element's attributes changed in place.
    Property,
    /// An element moved among its siblings.
    Move,
    /// A text node was inserted.
    InsertText,
    /// A text node was removed.
    RemovedText,
    /// A text node's content changed in place.
    ChangeText,
    /// A text node moved among its siblings.
    MoveText,
}

impl ChangeKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Remove => "remove",
            ChangeKind::Property => "property",
            ChangeKind::Move => "move",
            ChangeKind::InsertText => "insert-string",
            ChangeKind::RemovedText => "removed-string",
            ChangeKind::ChangeText => "change-string",
            ChangeKind::MoveText => "move-string",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported difference, addressed into the "after" document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRecord {
    /// What changed.
    pub kind: ChangeKind,
    /// CSS-style child-indexed path identifying the node's position in the
    /// after document.
    pub selector: String,
    /// Whether some ancestor of the node was itself inserted.
    pub ancestor_inserted: bool,
    /// Whether some ancestor of the node was itself moved.
    pub ancestor_moved: bool,
}

/// Diff two already-parsed trees and report the changes.
///
/// The passed elements are the roots of the two snapshots; selectors are
/// rooted at them.
pub fn diff_trees(before: &Element, after: &Element) -> Result<Vec<DiffRecord>, DiffError> {
    let seq1 = linearize(before, Side::Before);
    let seq2 = linearize(after, Side::After);
    let edits = petaurus::diff(seq1, seq2);

    let mut shadow = Reconstructor::new();
    for edit in &edits {
        shadow.apply(edit)?;
    }
    shadow.resolve();
    Ok(shadow.records())
}

/// Parse two HTML snapshots and diff their `<body>` elements.
pub fn diff_html(before: &str, after: &str) -> Result<Vec<DiffRecord>, DiffError> {
    let before = parse_body(before);
    let after = parse_body(after);
    diff_trees(&before, &after)
}
