//! Shadow trees: replaying an edit script into linked before/after trees.
//!
//! Every non-terminator record of the cleaned edit script is appended to
//! one or both shadow trees by ancestor-path lookup. Three resolution
//! passes then turn raw insert/remove placement into change and move
//! classifications, and the final records are rendered from the after
//! tree.

use crate::diff::linearize::{Record, RecordKind, Side};
use crate::diff::{ChangeKind, DiffError, DiffRecord};
use crate::tracing_macros::{debug, warn_log};
use bitflags::bitflags;
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use petaurus::{Edit, EditKind};

bitflags! {
    /// The closed set of change flags a shadow node can carry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct DiffFlags: u8 {
        const INSERT = 1 << 0;
        const REMOVE = 1 << 1;
        const CHANGE = 1 << 2;
        const MOVE   = 1 << 3;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShadowKind {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
    },
    Text(String),
}

#[derive(Debug)]
struct ShadowNode {
    kind: ShadowKind,
    flags: DiffFlags,
    /// Marks a placeholder mirrored into the after tree for a deletion.
    /// Distinct from the REMOVE flag, which marks a surviving node whose
    /// counterpart (in the before tree) or child (in the after tree) was
    /// deleted.
    removed: bool,
    detected_not_removed: bool,
    /// Twin in the other shadow tree's arena.
    link: Option<NodeId>,
}

impl ShadowNode {
    fn from_record(record: &Record) -> Self {
        let kind = match &record.kind {
            RecordKind::Element { tag, attrs } => ShadowKind::Element {
                tag: tag.clone(),
                attrs: attrs.clone(),
            },
            RecordKind::Text(content) => ShadowKind::Text(content.clone()),
            RecordKind::End => unreachable!("terminators are never placed"),
        };
        Self::new(kind)
    }

    fn new(kind: ShadowKind) -> Self {
        Self {
            kind,
            flags: DiffFlags::empty(),
            removed: false,
            detected_not_removed: false,
            link: None,
        }
    }

    fn is_element(&self) -> bool {
        matches!(self.kind, ShadowKind::Element { .. })
    }

    /// Same variant and tag; attributes and content are ignored.
    fn matches(&self, other: &ShadowNode) -> bool {
        match (&self.kind, &other.kind) {
            (ShadowKind::Element { tag: a, .. }, ShadowKind::Element { tag: b, .. }) => a == b,
            (ShadowKind::Text(_), ShadowKind::Text(_)) => true,
            _ => false,
        }
    }

    fn label(&self) -> String {
        match &self.kind {
            ShadowKind::Element { tag, .. } => tag.clone(),
            ShadowKind::Text(_) => "#text".to_string(),
        }
    }

    /// The node's own classifications, one report each.
    fn classifications(&self) -> Vec<ChangeKind> {
        let text = !self.is_element();
        let mut kinds = Vec::new();
        if self.flags.contains(DiffFlags::CHANGE) {
            kinds.push(if text {
                ChangeKind::ChangeText
            } else {
                ChangeKind::Property
            });
        }
        if self.flags.contains(DiffFlags::INSERT) {
            kinds.push(if text {
                ChangeKind::InsertText
            } else {
                ChangeKind::Insert
            });
        }
        if self.flags.contains(DiffFlags::REMOVE) {
            kinds.push(if text {
                ChangeKind::RemovedText
            } else {
                ChangeKind::Remove
            });
        }
        if self.flags.contains(DiffFlags::MOVE) {
            kinds.push(if text {
                ChangeKind::MoveText
            } else {
                ChangeKind::Move
            });
        }
        kinds
    }
}

/// One shadow tree: an arena of nodes under a synthetic root element.
struct ShadowTree {
    side: Side,
    arena: Arena<ShadowNode>,
    root: NodeId,
}

impl ShadowTree {
    fn new(side: Side) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(ShadowNode::new(ShadowKind::Element {
            tag: "html".to_string(),
            attrs: IndexMap::new(),
        }));
        Self { side, arena, root }
    }

    fn node(&self, id: NodeId) -> &ShadowNode {
        self.arena[id].get()
    }

    fn node_mut(&mut self, id: NodeId) -> &mut ShadowNode {
        self.arena[id].get_mut()
    }

    fn append(&mut self, parent: NodeId, node: ShadowNode) -> NodeId {
        let id = self.arena.new_node(node);
        parent.append(id, &mut self.arena);
        id
    }

    /// All node ids in pre-order, root included.
    fn pre_order(&self) -> Vec<NodeId> {
        self.root.descendants(&self.arena).collect()
    }

    /// Walk an ancestor tag chain from the root, scanning children from
    /// last to first at each level. The backward scan favors the sibling
    /// nearest the current insertion point when tags repeat; selector
    /// stability depends on it.
    fn path_last_match(&self, path: &[String], include_removed: bool) -> Option<NodeId> {
        let mut current = self.root;
        for segment in path {
            let mut found = None;
            for child in current.children(&self.arena).collect::<Vec<_>>().into_iter().rev() {
                let node = self.node(child);
                if !include_removed && node.removed {
                    continue;
                }
                if let ShadowKind::Element { tag, .. } = &node.kind
                    && tag == segment
                {
                    found = Some(child);
                    break;
                }
            }
            current = found?;
        }
        Some(current)
    }

    /// Whether `id` or any of its ancestors carries `flag`.
    fn chain_has_flag(&self, id: NodeId, flag: DiffFlags) -> bool {
        id.ancestors(&self.arena)
            .any(|a| self.node(a).flags.contains(flag))
    }

    fn ignored_for_position(&self, id: NodeId) -> bool {
        let node = self.node(id);
        match self.side {
            Side::Before => node.flags.contains(DiffFlags::REMOVE),
            Side::After => {
                node.removed || node.flags.intersects(DiffFlags::INSERT | DiffFlags::MOVE)
            }
        }
    }

    /// Position-identifying chain used for move detection: (label, index)
    /// pairs from the root, indices counted among siblings that still have
    /// a counterpart. A node always counts itself.
    fn position_chain(&self, id: NodeId) -> Vec<(String, usize)> {
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(parent) = self.arena[current].parent() {
            let mut index = 0;
            for sibling in parent.children(&self.arena) {
                if sibling == current {
                    break;
                }
                if !self.ignored_for_position(sibling) {
                    index += 1;
                }
            }
            chain.push((self.node(current).label(), index));
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// CSS-style child path from (excluding) the synthetic root.
    /// `:nth-child` appears only when same-tag siblings exist, indexed
    /// among non-removed element children.
    fn selector(&self, id: NodeId) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut current = id;
        while let Some(parent) = self.arena[current].parent() {
            let tag = self.node(current).label();
            let siblings: Vec<NodeId> = parent
                .children(&self.arena)
                .filter(|&c| !self.node(c).removed)
                .collect();
            let same_tag = siblings
                .iter()
                .filter(|&&c| self.node(c).is_element() && self.node(c).label() == tag)
                .count();
            if same_tag > 1 {
                let position = siblings
                    .iter()
                    .copied()
                    .filter(|&c| self.node(c).is_element())
                    .position(|c| c == current)
                    .map_or(0, |i| i + 1);
                parts.push(format!("{tag}:nth-child({position})"));
            } else {
                parts.push(tag);
            }
            current = parent;
        }
        parts.reverse();
        parts.join(" > ")
    }
}

/// Replays a cleaned edit script into two shadow trees and renders diff
/// records from the result.
pub(crate) struct Reconstructor {
    tree1: ShadowTree,
    tree2: ShadowTree,
}

impl Reconstructor {
    pub(crate) fn new() -> Self {
        Self {
            tree1: ShadowTree::new(Side::Before),
            tree2: ShadowTree::new(Side::After),
        }
    }

    /// Replay one edit operation, element by element.
    pub(crate) fn apply(&mut self, edit: &Edit<Record>) -> Result<(), DiffError> {
        for record in edit.nodes.iter() {
            if record.is_end() {
                continue;
            }
            debug!(kind = %edit.kind, record = %record, "apply");
            match edit.kind {
                EditKind::Equal => self.apply_equal(record)?,
                EditKind::Insert => self.apply_insert(record)?,
                EditKind::Delete => self.apply_delete(record)?,
            }
        }
        Ok(())
    }

    fn parent_for(tree: &ShadowTree, record: &Record, slot: Side) -> Result<NodeId, DiffError> {
        let lookup_error = || DiffError::StructuralLookup {
            side: tree.side,
            record: record.to_string(),
        };
        let path = record.path(slot).ok_or_else(lookup_error)?;
        tree.path_last_match(path.segments(), false)
            .ok_or_else(lookup_error)
    }

    fn apply_equal(&mut self, record: &Record) -> Result<(), DiffError> {
        let p1 = Self::parent_for(&self.tree1, record, Side::Before)?;
        let p2 = Self::parent_for(&self.tree2, record, Side::After)?;
        let n1 = self.tree1.append(p1, ShadowNode::from_record(record));
        let mut twin = ShadowNode::from_record(record);
        twin.link = Some(n1);
        self.tree2.append(p2, twin);
        Ok(())
    }

    fn apply_insert(&mut self, record: &Record) -> Result<(), DiffError> {
        let p2 = Self::parent_for(&self.tree2, record, Side::After)?;
        let mut node = ShadowNode::from_record(record);
        // Only the subtree root carries the flag; descendants are covered
        // through ancestor_inserted on the report.
        if !self.tree2.chain_has_flag(p2, DiffFlags::INSERT) {
            node.flags |= DiffFlags::INSERT;
        }
        self.tree2.append(p2, node);
        Ok(())
    }

    fn apply_delete(&mut self, record: &Record) -> Result<(), DiffError> {
        let p1 = Self::parent_for(&self.tree1, record, Side::Before)?;
        let mut node = ShadowNode::from_record(record);
        node.flags |= DiffFlags::REMOVE;
        let n1 = self.tree1.append(p1, node);

        // Mirror the deletion into the after tree as a placeholder. The
        // after tree lacks this subtree by definition, so the lookup also
        // considers already-removed nodes and retries with progressively
        // shorter paths.
        let segments = match record.path(Side::Before) {
            Some(path) => path.segments(),
            None => &[],
        };
        for cut in 0..=segments.len() {
            let partial = &segments[..segments.len() - cut];
            if let Some(p2) = self.tree2.path_last_match(partial, true) {
                let mut placeholder = ShadowNode::from_record(record);
                placeholder.removed = true;
                placeholder.link = Some(n1);
                self.tree2.append(p2, placeholder);
                return Ok(());
            }
        }
        warn_log!(record = %record, "no placement point for removed node");
        Ok(())
    }

    /// Run the three resolution passes over the after tree.
    pub(crate) fn resolve(&mut self) {
        self.resolve_changes();
        self.resolve_removes();
        self.resolve_moves();
    }

    /// Pair runs of removed placeholders against inserted siblings of the
    /// same shape, reclassifying delete+insert as in-place change or
    /// same-parent move.
    fn resolve_changes(&mut self) {
        for parent in self.tree2.pre_order() {
            let children: Vec<NodeId> = parent.children(&self.tree2.arena).collect();
            if !children.iter().any(|&c| self.tree2.node(c).removed) {
                continue;
            }
            let mut idx = 0;
            while idx < children.len() {
                if !self.tree2.node(children[idx]).removed {
                    idx += 1;
                    continue;
                }
                let run_start = idx;
                while idx < children.len() && self.tree2.node(children[idx]).removed {
                    idx += 1;
                }
                // Candidates are the inserted siblings after the run, or
                // before it when none follow.
                let mut candidates: Vec<NodeId> = children[idx..]
                    .iter()
                    .copied()
                    .filter(|&c| self.tree2.node(c).flags.contains(DiffFlags::INSERT))
                    .collect();
                if candidates.is_empty() {
                    candidates = children[..run_start]
                        .iter()
                        .copied()
                        .filter(|&c| self.tree2.node(c).flags.contains(DiffFlags::INSERT))
                        .collect();
                }
                let mut used = vec![false; candidates.len()];
                for &placeholder in &children[run_start..idx] {
                    for (ci, &candidate) in candidates.iter().enumerate() {
                        if used[ci] {
                            continue;
                        }
                        if self
                            .tree2
                            .node(placeholder)
                            .matches(self.tree2.node(candidate))
                        {
                            used[ci] = true;
                            self.pair(placeholder, candidate);
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Join a removed placeholder with an inserted sibling: the pair is the
    /// same node that changed in place (attributes or content differ) or
    /// moved within its parent (fully equal).
    fn pair(&mut self, placeholder: NodeId, candidate: NodeId) {
        let fully_equal = self.tree2.node(placeholder).kind == self.tree2.node(candidate).kind;
        let twin = self.tree2.node(placeholder).link;
        debug!(fully_equal, "paired removed placeholder with insertion");

        let node = self.tree2.node_mut(candidate);
        node.flags.remove(DiffFlags::INSERT);
        if fully_equal {
            node.flags |= DiffFlags::MOVE;
        } else {
            node.flags |= DiffFlags::CHANGE;
        }
        node.link = twin;

        self.tree2.node_mut(placeholder).detected_not_removed = true;
        if let Some(twin) = twin {
            let twin_node = self.tree1.node_mut(twin);
            twin_node.flags.remove(DiffFlags::REMOVE);
            if fully_equal {
                twin_node.flags |= DiffFlags::MOVE;
            }
        }
    }

    /// Undetected removed elements report the removal on their surviving
    /// parent; the placeholder itself has no selector in the after tree.
    fn resolve_removes(&mut self) {
        let mut parents = Vec::new();
        for id in self.tree2.pre_order() {
            let node = self.tree2.node(id);
            if node.removed
                && !node.detected_not_removed
                && node.is_element()
                && let Some(parent) = self.tree2.arena[id].parent()
            {
                parents.push(parent);
            }
        }
        for parent in parents {
            self.tree2.node_mut(parent).flags |= DiffFlags::REMOVE;
        }
    }

    /// Flag linked nodes whose position chain differs between the two
    /// trees, or which sit under an inserted ancestor.
    fn resolve_moves(&mut self) {
        for id in self.tree2.pre_order() {
            let node = self.tree2.node(id);
            if node.removed || node.flags.contains(DiffFlags::MOVE) {
                continue;
            }
            let Some(link) = node.link else { continue };
            let parent = self.tree2.arena[id].parent();
            // A moved ancestor already accounts for the whole subtree.
            if parent.is_some_and(|p| self.tree2.chain_has_flag(p, DiffFlags::MOVE)) {
                continue;
            }
            let under_insertion =
                parent.is_some_and(|p| self.tree2.chain_has_flag(p, DiffFlags::INSERT));
            if under_insertion
                || self.tree2.position_chain(id) != self.tree1.position_chain(link)
            {
                debug!(node = %self.tree2.node(id).label(), "move detected");
                self.tree2.node_mut(id).flags |= DiffFlags::MOVE;
                self.tree1.node_mut(link).flags |= DiffFlags::MOVE;
            }
        }
    }

    /// Render the final records from the after tree, pre-order.
    pub(crate) fn records(&self) -> Vec<DiffRecord> {
        let mut out = Vec::new();
        self.visit(self.tree2.root, false, false, &mut out);
        out
    }

    fn visit(
        &self,
        id: NodeId,
        ancestor_inserted: bool,
        ancestor_moved: bool,
        out: &mut Vec<DiffRecord>,
    ) {
        let node = self.tree2.node(id);
        if node.removed {
            // Placeholder subtrees never render; an undetected text
            // placeholder reports the lost text at its parent's position.
            if !node.detected_not_removed && !node.is_element() {
                out.push(DiffRecord {
                    kind: ChangeKind::RemovedText,
                    selector: self.parent_selector(id),
                    ancestor_inserted,
                    ancestor_moved,
                });
            }
            return;
        }
        for kind in node.classifications() {
            let selector = if node.is_element() {
                self.tree2.selector(id)
            } else {
                self.parent_selector(id)
            };
            out.push(DiffRecord {
                kind,
                selector,
                ancestor_inserted,
                ancestor_moved,
            });
        }
        let inserted = ancestor_inserted || node.flags.contains(DiffFlags::INSERT);
        let moved = ancestor_moved || node.flags.contains(DiffFlags::MOVE);
        for child in id.children(&self.tree2.arena) {
            self.visit(child, inserted, moved, out);
        }
    }

    fn parent_selector(&self, id: NodeId) -> String {
        match self.tree2.arena[id].parent() {
            Some(parent) => self.tree2.selector(parent),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str) -> ShadowNode {
        ShadowNode::new(ShadowKind::Element {
            tag: tag.to_string(),
            attrs: IndexMap::new(),
        })
    }

    #[test]
    fn path_lookup_scans_backward() {
        let mut tree = ShadowTree::new(Side::After);
        let _first = tree.append(tree.root, element("div"));
        let second = tree.append(tree.root, element("div"));
        assert_eq!(
            tree.path_last_match(&["div".to_string()], false),
            Some(second)
        );
    }

    #[test]
    fn strict_lookup_skips_removed_placeholders() {
        let mut tree = ShadowTree::new(Side::After);
        let kept = tree.append(tree.root, element("div"));
        let mut ghost = element("div");
        ghost.removed = true;
        let ghost = tree.append(tree.root, ghost);
        assert_eq!(tree.path_last_match(&["div".to_string()], false), Some(kept));
        assert_eq!(tree.path_last_match(&["div".to_string()], true), Some(ghost));
    }

    #[test]
    fn empty_path_resolves_to_the_root() {
        let tree = ShadowTree::new(Side::Before);
        assert_eq!(tree.path_last_match(&[], false), Some(tree.root));
    }

    #[test]
    fn selector_disambiguates_same_tag_siblings() {
        let mut tree = ShadowTree::new(Side::After);
        let div = tree.append(tree.root, element("div"));
        let _p1 = tree.append(div, element("p"));
        let p2 = tree.append(div, element("p"));
        let span = tree.append(div, element("span"));
        assert_eq!(tree.selector(p2), "div > p:nth-child(2)");
        assert_eq!(tree.selector(span), "div > span");
    }

    #[test]
    fn selector_ignores_removed_siblings() {
        let mut tree = ShadowTree::new(Side::After);
        let div = tree.append(tree.root, element("div"));
        let mut ghost = element("p");
        ghost.removed = true;
        tree.append(div, ghost);
        let p = tree.append(div, element("p"));
        assert_eq!(tree.selector(p), "div > p");
    }
}
