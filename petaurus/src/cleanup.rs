//! Cleanup passes over a raw edit script.
//!
//! [`merge_adjacent`] coalesces runs of edits and factors shared content
//! back into equalities; [`semantic_lossless`] slides single edits to the
//! structurally cheapest boundary. Both run unconditionally after the
//! bisecting diff and preserve per-side reconstruction exactly.

use crate::myers::{common_prefix, common_suffix};
use crate::sequence::{DiffElement, Edit, EditKind, Nodes};
use crate::tracing_macros::debug;

/// Coalesce runs of consecutive non-EQUAL ops.
///
/// Scanning left to right, consecutive DELETE and INSERT segments
/// accumulate into two buffers until an equality is hit. A mixed run has
/// its common prefix factored into the preceding equality (or a new leading
/// one) and its common suffix prepended to the following equality, then
/// collapses to at most one DELETE followed by one INSERT. Adjacent
/// equalities are concatenated. A final sub-pass shifts single edits that
/// fully overlap a flanking equality across the boundary, eliminating the
/// equality; if that happened, the whole pass restarts until stable.
pub fn merge_adjacent<E: DiffElement>(edits: &mut Vec<Edit<E>>) {
    if edits.is_empty() {
        return;
    }
    // Sentinel equality so the final run gets flushed.
    edits.push(Edit::equal(Nodes::new()));
    let mut i = 0;
    let mut count_delete = 0usize;
    let mut count_insert = 0usize;
    let mut deletes: Nodes<E> = Nodes::new();
    let mut inserts: Nodes<E> = Nodes::new();
    while i < edits.len() {
        match edits[i].kind {
            EditKind::Insert => {
                count_insert += 1;
                inserts.extend(edits[i].nodes.clone());
                i += 1;
            }
            EditKind::Delete => {
                count_delete += 1;
                deletes.extend(edits[i].nodes.clone());
                i += 1;
            }
            EditKind::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        // Factor out a common prefix into the preceding
                        // equality.
                        let p = common_prefix(&deletes, &inserts);
                        if p != 0 {
                            let prefix = deletes.slice(..p).merge(&inserts.slice(..p));
                            let run_start = i - count_delete - count_insert;
                            if run_start > 0 && edits[run_start - 1].kind == EditKind::Equal {
                                edits[run_start - 1].nodes.extend(prefix);
                            } else {
                                edits.insert(0, Edit::equal(prefix));
                                i += 1;
                            }
                            deletes = deletes.slice(p..);
                            inserts = inserts.slice(p..);
                        }
                        // Factor out a common suffix into the following
                        // equality.
                        let s = common_suffix(&deletes, &inserts);
                        if s != 0 {
                            let suffix = deletes
                                .slice(deletes.len() - s..)
                                .merge(&inserts.slice(inserts.len() - s..));
                            edits[i].nodes.prepend(suffix);
                            deletes = deletes.slice(..deletes.len() - s);
                            inserts = inserts.slice(..inserts.len() - s);
                        }
                    }
                    // Collapse the run to at most one DELETE and one INSERT.
                    let run_start = i - count_delete - count_insert;
                    let mut replacement = Vec::new();
                    if !deletes.is_empty() {
                        replacement.push(Edit::delete(core::mem::take(&mut deletes)));
                    }
                    if !inserts.is_empty() {
                        replacement.push(Edit::insert(core::mem::take(&mut inserts)));
                    }
                    let kept = replacement.len();
                    edits.splice(run_start..i, replacement);
                    i = run_start + kept + 1;
                } else if i != 0 && edits[i - 1].kind == EditKind::Equal {
                    // Fold this equality into the previous one.
                    let nodes = core::mem::take(&mut edits[i].nodes);
                    edits[i - 1].nodes.extend(nodes);
                    edits.remove(i);
                } else {
                    i += 1;
                }
                count_delete = 0;
                count_insert = 0;
                deletes = Nodes::new();
                inserts = Nodes::new();
            }
        }
    }
    if edits.last().is_some_and(|e| e.nodes.is_empty()) {
        edits.pop();
    }

    // Single edits surrounded by equalities which can be shifted sideways
    // to eliminate an equality: A<ins>BA</ins>C becomes <ins>AB</ins>AC.
    let mut changed = false;
    let mut i = 1;
    while i + 1 < edits.len() {
        if edits[i - 1].kind == EditKind::Equal
            && edits[i + 1].kind == EditKind::Equal
            && edits[i].kind != EditKind::Equal
        {
            let prev_len = edits[i - 1].nodes.len();
            let next_len = edits[i + 1].nodes.len();
            if prev_len > 0 && edits[i].nodes.ends_with_exact(&edits[i - 1].nodes) {
                // Shift the edit over the previous equality.
                let prev = edits.remove(i - 1);
                i -= 1;
                let trimmed = edits[i].nodes.slice(..edits[i].nodes.len() - prev_len);
                edits[i].nodes = prev.nodes.clone().concat(trimmed);
                edits[i + 1].nodes.prepend(prev.nodes);
                changed = true;
            } else if next_len > 0 && edits[i].nodes.starts_with_exact(&edits[i + 1].nodes) {
                // Shift the edit over the next equality.
                let next = edits.remove(i + 1);
                edits[i - 1].nodes.extend(next.nodes.clone());
                let trimmed = edits[i].nodes.slice(next_len..);
                edits[i].nodes = trimmed.concat(next.nodes);
                changed = true;
            }
        }
        i += 1;
    }
    if changed {
        debug!("boundary shift occurred, restarting merge");
        merge_adjacent(edits);
    }
}

/// Slide each single edit flanked by equalities to the boundary with the
/// lowest structural cost.
///
/// The edit first slides as far left as exact equality allows, then steps
/// right one element at a time; each configuration is scored by the summed
/// entry/exit [`DiffElement::boundary_cost`] and the cheapest wins, with
/// ties going to the latest position scanned.
pub fn semantic_lossless<E: DiffElement>(edits: &mut Vec<Edit<E>>) {
    let mut i = 1;
    while i + 1 < edits.len() {
        if edits[i - 1].kind == EditKind::Equal
            && edits[i + 1].kind == EditKind::Equal
            && edits[i].kind != EditKind::Equal
        {
            let mut eq1 = edits[i - 1].nodes.clone();
            let mut edit = edits[i].nodes.clone();
            let mut eq2 = edits[i + 1].nodes.clone();

            // First, slide the edit as far left as possible.
            let slide = {
                let max = eq1.len().min(edit.len());
                (0..max)
                    .take_while(|&j| edit[edit.len() - 1 - j].equals_exact(&eq1[eq1.len() - 1 - j]))
                    .count()
            };
            if slide > 0 {
                let shared = eq1.slice(eq1.len() - slide..);
                eq1 = eq1.slice(..eq1.len() - slide);
                edit = shared.clone().concat(edit.slice(..edit.len() - slide));
                eq2 = shared.concat(eq2);
            }

            // Then step right one element at a time, keeping the cheapest
            // boundary.
            let mut best_eq1 = eq1.clone();
            let mut best_edit = edit.clone();
            let mut best_eq2 = eq2.clone();
            let mut best_cost = window_cost(&eq1, &edit, &eq2);
            loop {
                let entering = match (edit.first(), eq2.first()) {
                    (Some(first), Some(entering)) if first.equals_exact(entering) => {
                        entering.clone()
                    }
                    _ => break,
                };
                eq1.push(entering.clone());
                let mut shifted = edit.slice(1..);
                shifted.push(entering);
                edit = shifted;
                eq2 = eq2.slice(1..);
                let cost = window_cost(&eq1, &edit, &eq2);
                // <= so that ties favor trailing context.
                if cost <= best_cost {
                    best_cost = cost;
                    best_eq1 = eq1.clone();
                    best_edit = edit.clone();
                    best_eq2 = eq2.clone();
                }
            }

            if edits[i - 1].nodes.len() != best_eq1.len() {
                debug!(cost = best_cost, "shifted edit boundary");
                if best_eq1.is_empty() {
                    edits.remove(i - 1);
                    i -= 1;
                } else {
                    edits[i - 1].nodes = best_eq1;
                }
                edits[i].nodes = best_edit;
                if best_eq2.is_empty() {
                    edits.remove(i + 1);
                    i = i.saturating_sub(1);
                } else {
                    edits[i + 1].nodes = best_eq2;
                }
            }
        }
        i += 1;
    }
}

fn window_cost<E: DiffElement>(eq1: &Nodes<E>, edit: &Nodes<E>, eq2: &Nodes<E>) -> u32 {
    let entry = match (edit.first(), eq1.last()) {
        (Some(first), Some(prev)) => first.boundary_cost(prev),
        _ => 0,
    };
    let exit = match (edit.last(), eq2.first()) {
        (Some(last), Some(next)) => last.boundary_cost(next),
        _ => 0,
    };
    entry + exit
}
