//! End-to-end tree diffing scenarios.

use domdelta::{DiffRecord, Element, Node, diff_html, diff_trees, parse_body};
use pretty_assertions::assert_eq;

/// Parse a snippet and return its first element, so selectors are rooted
/// at the fragment instead of at `body`.
fn fragment(html: &str) -> Element {
    parse_body(html)
        .children
        .into_iter()
        .find_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
        .expect("fragment should contain an element")
}

fn diff(before: &str, after: &str) -> Vec<DiffRecord> {
    diff_trees(&fragment(before), &fragment(after)).expect("diff should succeed")
}

fn brief(records: &[DiffRecord]) -> Vec<(&'static str, String)> {
    records
        .iter()
        .map(|r| (r.kind.as_str(), r.selector.clone()))
        .collect()
}

#[test]
fn identical_trees_yield_no_records() {
    assert_eq!(diff("<p>hi</p>", "<p>hi</p>"), vec![]);
}

#[test]
fn inserted_element_is_addressed_by_nth_child() {
    let records = diff("<div><p>a</p></div>", "<div><p>a</p><p>b</p></div>");
    assert_eq!(
        brief(&records),
        vec![("insert", "div > p:nth-child(2)".to_string())]
    );
    assert!(!records[0].ancestor_inserted);
    assert!(!records[0].ancestor_moved);
}

#[test]
fn inserted_subtree_reports_only_its_root() {
    let records = diff("<div></div>", "<div><ul><li>x</li></ul></div>");
    assert_eq!(brief(&records), vec![("insert", "div > ul".to_string())]);
}

#[test]
fn removed_element_reports_on_the_parent() {
    let records = diff("<ul><li>x</li></ul>", "<ul></ul>");
    assert_eq!(brief(&records), vec![("remove", "ul".to_string())]);
}

#[test]
fn swapped_siblings_report_moves_for_both() {
    let records = diff(
        "<div><span>a</span><b>b</b></div>",
        "<div><b>b</b><span>a</span></div>",
    );
    assert_eq!(
        brief(&records),
        vec![
            ("move", "div > b".to_string()),
            ("move", "div > span".to_string()),
        ]
    );
    assert!(records.iter().all(|r| !r.ancestor_inserted));
    assert!(records.iter().all(|r| !r.ancestor_moved));
}

#[test]
fn attribute_change_reports_property_not_remove_insert() {
    let records = diff("<div id=\"1\"></div>", "<div id=\"2\"></div>");
    assert_eq!(brief(&records), vec![("property", "div".to_string())]);
}

#[test]
fn attribute_change_on_nested_element() {
    let records = diff(
        "<div><a href=\"x\">t</a></div>",
        "<div><a href=\"y\">t</a></div>",
    );
    assert_eq!(brief(&records), vec![("property", "div > a".to_string())]);
}

#[test]
fn text_change_reports_change_string() {
    let records = diff("<p>hello</p>", "<p>world</p>");
    assert_eq!(brief(&records), vec![("change-string", "p".to_string())]);
}

#[test]
fn changed_text_in_second_list_item() {
    let records = diff(
        "<ul><li>a</li><li>b</li></ul>",
        "<ul><li>a</li><li>c</li></ul>",
    );
    assert_eq!(
        brief(&records),
        vec![("change-string", "ul > li:nth-child(2)".to_string())]
    );
}

#[test]
fn removed_text_reports_removed_string() {
    let records = diff("<p>hi</p>", "<p></p>");
    assert_eq!(brief(&records), vec![("removed-string", "p".to_string())]);
}

#[test]
fn wrapping_flags_the_subtree_moved_under_the_insertion() {
    let records = diff(
        "<div><p>a</p></div>",
        "<div><section><p>a</p></section></div>",
    );
    assert_eq!(
        brief(&records),
        vec![
            ("insert", "div > section".to_string()),
            ("move", "div > section > p".to_string()),
        ]
    );
    assert!(!records[0].ancestor_inserted);
    assert!(records[1].ancestor_inserted);
    assert!(!records[1].ancestor_moved);
}

#[test]
fn swapped_text_nodes_report_string_moves() {
    // Built by hand: parsing would merge the adjacent text nodes.
    let before = {
        let mut p = Element::new("p");
        p.push_text("hello");
        p.push_text("world");
        p
    };
    let after = {
        let mut p = Element::new("p");
        p.push_text("world");
        p.push_text("hello");
        p
    };
    let records = diff_trees(&before, &after).expect("diff should succeed");
    assert_eq!(
        brief(&records),
        vec![("move-string", "p".to_string()), ("move-string", "p".to_string())]
    );
}

#[test]
fn swapping_same_tag_siblings_reports_text_changes() {
    // Both <p> elements match structurally, so the diff keeps them in
    // place and sees their text contents swap.
    let records = diff(
        "<div><p>a</p><p>b</p></div>",
        "<div><p>b</p><p>a</p></div>",
    );
    assert_eq!(
        brief(&records),
        vec![
            ("change-string", "div > p:nth-child(1)".to_string()),
            ("change-string", "div > p:nth-child(2)".to_string()),
        ]
    );
}

#[test]
fn whitespace_only_changes_are_ignored() {
    let records = diff("<ul><li>a</li><li>b</li></ul>", "<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>");
    assert_eq!(records, vec![]);
}

#[test]
fn comments_are_ignored() {
    let records = diff("<div><p>a</p></div>", "<div><!-- note --><p>a</p></div>");
    assert_eq!(records, vec![]);
}

#[test]
fn diff_html_roots_selectors_at_body() {
    let records = diff_html("<p>a</p>", "<p>a</p><p>b</p>").expect("diff should succeed");
    assert_eq!(
        brief(&records),
        vec![("insert", "body > p:nth-child(2)".to_string())]
    );
}

#[test]
fn unchanged_large_document_yields_no_records() {
    let html = "<div><h1>Title</h1><ul><li>one</li><li>two</li><li>three</li></ul>\
                <p>Some <em>emphasized</em> text</p></div>";
    assert_eq!(diff(html, html), vec![]);
}
