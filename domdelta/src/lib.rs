//! Structural HTML diffing with CSS-selector change reports.
//!
//! domdelta compares two snapshots of an HTML document and reports what
//! was inserted, removed, changed, and moved, addressed by stable
//! CSS-style selectors into the "after" document. It is built for
//! change-detection over structured documents, where a flat list diff is
//! not enough because elements live inside a hierarchy and moved/changed
//! distinctions matter.
//!
//! Under the hood, both trees are flattened into record sequences, diffed
//! with [petaurus] (a generalized Myers diff with cleanup passes), and the
//! edit script is replayed into two linked shadow trees from which the
//! change reports are rendered.
//!
//! # Example
//!
//! ```rust
//! let records = domdelta::diff_html(
//!     "<div><p>a</p></div>",
//!     "<div><p>a</p><p>b</p></div>",
//! )
//! .unwrap();
//!
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].kind.as_str(), "insert");
//! assert_eq!(records[0].selector, "body > div > p:nth-child(2)");
//! ```
//!
//! Parsing uses html5ever with full error recovery, so anything a browser
//! accepts diffs cleanly. Already-parsed [`Element`] trees can be diffed
//! directly with [`diff_trees`]; selectors are then rooted at the passed
//! elements.

mod tracing_macros;

pub mod diff;
mod parser;
pub mod untyped_dom;

// Re-export the public diff surface at the crate root.
pub use diff::{ChangeKind, DiffError, DiffRecord, Side, diff_html, diff_trees};

// Re-export parsing and DOM types for convenience.
pub use parser::parse_body;
pub use untyped_dom::{Element, Node};
