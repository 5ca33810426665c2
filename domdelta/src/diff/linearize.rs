//! Tree linearization: flattening a DOM tree into diffable records.
//!
//! Each record carries the ancestor tag chain from its own tree's root, so
//! the reconstructor can replay a flat edit script back into a hierarchy.

use crate::untyped_dom::{Element, Node};
use core::fmt;
use indexmap::IndexMap;
use petaurus::{DiffElement, Nodes};
use smallvec::SmallVec;

/// Which input tree a record originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The first ("before") snapshot.
    Before,
    /// The second ("after") snapshot.
    After,
}

impl Side {
    /// The opposite side.
    pub fn other(self) -> Side {
        match self {
            Side::Before => Side::After,
            Side::After => Side::Before,
        }
    }

    fn index(self) -> usize {
        match self {
            Side::Before => 0,
            Side::After => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Before => write!(f, "before"),
            Side::After => write!(f, "after"),
        }
    }
}

/// Ancestor tag chain from the linearized root down to, but excluding, a
/// node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagPath(SmallVec<[String; 8]>);

impl TagPath {
    /// The chain's segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    fn push(&mut self, tag: String) {
        self.0.push(tag);
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " > ")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

/// What a linearized record stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// An element, with its lowercase tag name and attributes.
    Element {
        /// The tag name.
        tag: String,
        /// The attribute map (order-independent equality).
        attrs: IndexMap<String, String>,
    },
    /// A text node.
    Text(String),
    /// Close of a subtree scope; carries no path.
    End,
}

/// One record of a linearized tree.
///
/// Non-terminator records hold two path slots, one per side: the own-side
/// slot is filled at linearization time, the other once the record has been
/// matched into an EQUAL region.
#[derive(Debug, Clone)]
pub struct Record {
    /// What the record stands for.
    pub kind: RecordKind,
    origin: Side,
    paths: [Option<TagPath>; 2],
}

impl Record {
    fn element(origin: Side, tag: String, attrs: IndexMap<String, String>, path: TagPath) -> Self {
        let mut paths = [None, None];
        paths[origin.index()] = Some(path);
        Record {
            kind: RecordKind::Element { tag, attrs },
            origin,
            paths,
        }
    }

    fn text(origin: Side, content: String, path: TagPath) -> Self {
        let mut paths = [None, None];
        paths[origin.index()] = Some(path);
        Record {
            kind: RecordKind::Text(content),
            origin,
            paths,
        }
    }

    fn end(origin: Side) -> Self {
        Record {
            kind: RecordKind::End,
            origin,
            paths: [None, None],
        }
    }

    /// Which tree this record came from.
    pub fn origin(&self) -> Side {
        self.origin
    }

    /// The ancestor chain for the given side, if known.
    pub fn path(&self, side: Side) -> Option<&TagPath> {
        self.paths[side.index()].as_ref()
    }

    /// Whether this is a scope terminator.
    pub fn is_end(&self) -> bool {
        matches!(self.kind, RecordKind::End)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RecordKind::Element { tag, .. } => write!(f, "<{tag}>"),
            RecordKind::Text(content) => write!(f, "#text {content:?}"),
            RecordKind::End => write!(f, "#end"),
        }
    }
}

impl DiffElement for Record {
    fn equals(&self, other: &Self) -> bool {
        self.kind == other.kind
    }

    fn equals_exact(&self, other: &Self) -> bool {
        self.equals(other) && self.path(self.origin) == other.path(self.origin)
    }

    fn adopt_counterpart_path(&mut self, counterpart: &Self) {
        let slot = self.origin.other().index();
        self.paths[slot] = counterpart.path(counterpart.origin).cloned();
    }

    fn boundary_cost(&self, neighbor: &Self) -> u32 {
        match (self.path(self.origin), neighbor.path(self.origin)) {
            (Some(a), Some(b)) => divergence(a, b),
            // Scope terminators are structural edges, the cheapest cut.
            _ => 0,
        }
    }
}

/// Depth of divergence of two ancestor chains: the total number of trailing
/// segments not shared between them. 0 means identical chains.
fn divergence(a: &TagPath, b: &TagPath) -> u32 {
    let common = a
        .segments()
        .iter()
        .zip(b.segments())
        .take_while(|(x, y)| x == y)
        .count();
    ((a.segments().len() - common) + (b.segments().len() - common)) as u32
}

/// Flatten a tree into diffable records, depth-first pre-order.
///
/// The passed root is itself emitted, with an empty ancestor chain.
/// Whitespace-only text nodes and comments are skipped; an [`RecordKind::End`]
/// terminator closes every element scope.
pub fn linearize(root: &Element, side: Side) -> Nodes<Record> {
    let mut records = Nodes::new();
    let mut path = TagPath::default();
    walk(root, side, &mut path, &mut records);
    records
}

fn walk(element: &Element, side: Side, path: &mut TagPath, out: &mut Nodes<Record>) {
    let tag = element.tag.to_ascii_lowercase();
    out.push(Record::element(
        side,
        tag.clone(),
        element.attrs.clone(),
        path.clone(),
    ));
    path.push(tag);
    for child in &element.children {
        match child {
            Node::Element(e) => walk(e, side, path, out),
            Node::Text(t) if !t.trim().is_empty() => {
                out.push(Record::text(side, t.clone(), path.clone()));
            }
            Node::Text(_) => {}
            Node::Comment(_) => {}
        }
    }
    path.pop();
    out.push(Record::end(side));
}
