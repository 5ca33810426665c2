//! HTML5 parsing via html5ever's TreeSink.
//!
//! Builds the untyped DOM using html5ever's tree construction algorithm,
//! which includes browser-compatible error recovery. The diff engine never
//! parses markup itself; this adapter feeds it already-parsed trees.

use crate::untyped_dom::{Element, Node};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, QualName, parse_document};
use indexmap::IndexMap;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use tendril::StrTendril;

/// Parse an HTML string and return the `<body>` element with all its
/// children.
///
/// Accepts any HTML that browsers accept, without enforcing content model
/// rules.
pub fn parse_body(html: &str) -> Element {
    let sink = DomSink::default();
    let sink = parse_document(sink, Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .unwrap();
    sink.into_body()
}

/// A node handle for the TreeSink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct NodeHandle(usize);

/// Internal node representation during parsing.
#[derive(Clone, Debug)]
enum ParseNode {
    Document {
        children: Vec<NodeHandle>,
    },
    Element {
        name: QualName,
        attrs: Vec<(String, String)>,
        children: Vec<NodeHandle>,
    },
    Text(String),
    Comment(String),
}

/// TreeSink that builds the untyped DOM.
#[derive(Default)]
struct DomSink {
    next_id: Cell<usize>,
    nodes: RefCell<HashMap<NodeHandle, ParseNode>>,
    document_handle: Cell<Option<NodeHandle>>,
}

impl DomSink {
    fn alloc(&self, node: ParseNode) -> NodeHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let handle = NodeHandle(id);
        self.nodes.borrow_mut().insert(handle, node);
        handle
    }

    fn append_child_to(&self, parent: NodeHandle, child: NodeHandle) {
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get_mut(&parent) {
            Some(ParseNode::Element { children, .. }) => children.push(child),
            Some(ParseNode::Document { children }) => children.push(child),
            _ => {}
        }
    }

    /// Find html > body in the parsed tree and build it.
    fn into_body(self) -> Element {
        let nodes = self.nodes.into_inner();
        let doc_handle = self.document_handle.get();

        if let Some(doc) = doc_handle
            && let Some(ParseNode::Document { children }) = nodes.get(&doc)
        {
            for &child in children {
                if let Some(ParseNode::Element { name, children, .. }) = nodes.get(&child)
                    && name.local.as_ref() == "html"
                {
                    for &html_child in children {
                        if let Some(ParseNode::Element { name, .. }) = nodes.get(&html_child)
                            && name.local.as_ref() == "body"
                        {
                            return Self::build_element(&nodes, html_child);
                        }
                    }
                }
            }
        }

        Element::new("body")
    }

    fn build_element(nodes: &HashMap<NodeHandle, ParseNode>, handle: NodeHandle) -> Element {
        let Some(ParseNode::Element {
            name,
            attrs,
            children,
        }) = nodes.get(&handle)
        else {
            return Element::default();
        };

        // First occurrence wins, matching browser behavior.
        let mut attr_map = IndexMap::new();
        for (k, v) in attrs {
            attr_map.entry(k.clone()).or_insert_with(|| v.clone());
        }

        Element {
            tag: name.local.to_string(),
            attrs: attr_map,
            children: children
                .iter()
                .filter_map(|&child| Self::build_node(nodes, child))
                .collect(),
        }
    }

    fn build_node(nodes: &HashMap<NodeHandle, ParseNode>, handle: NodeHandle) -> Option<Node> {
        match nodes.get(&handle)? {
            ParseNode::Text(t) => Some(Node::Text(t.clone())),
            ParseNode::Comment(c) => Some(Node::Comment(c.clone())),
            ParseNode::Element { .. } => {
                Some(Node::Element(Self::build_element(nodes, handle)))
            }
            ParseNode::Document { .. } => None,
        }
    }
}

impl TreeSink for DomSink {
    type Handle = NodeHandle;
    type Output = Self;
    type ElemName<'a> = &'a QualName;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // Accept everything, like a browser.
    }

    fn get_document(&self) -> Self::Handle {
        if let Some(h) = self.document_handle.get() {
            h
        } else {
            let h = self.alloc(ParseNode::Document {
                children: Vec::new(),
            });
            self.document_handle.set(Some(h));
            h
        }
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        let nodes = self.nodes.borrow();
        if let Some(ParseNode::Element { name, .. }) = nodes.get(target) {
            unsafe { &*(name as *const QualName) }
        } else {
            panic!("elem_name called on non-element")
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|a| (a.name.local.to_string(), a.value.to_string()))
            .collect();
        self.alloc(ParseNode::Element {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.alloc(ParseNode::Comment(text.to_string()))
    }

    fn create_pi(&self, _target: StrTendril, data: StrTendril) -> Self::Handle {
        self.alloc(ParseNode::Comment(data.to_string()))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendNode(node) => {
                self.append_child_to(*parent, node);
            }
            NodeOrText::AppendText(text) => {
                let mut nodes = self.nodes.borrow_mut();
                // Merge adjacent text nodes.
                let last_child_id = match nodes.get(parent) {
                    Some(ParseNode::Element { children, .. }) => children.last().copied(),
                    Some(ParseNode::Document { children }) => children.last().copied(),
                    _ => None,
                };

                if let Some(last_id) = last_child_id
                    && let Some(ParseNode::Text(existing)) = nodes.get_mut(&last_id)
                {
                    existing.push_str(&text);
                    return;
                }
                drop(nodes);
                let text_id = self.alloc(ParseNode::Text(text.to_string()));
                self.append_child_to(*parent, text_id);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        _element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        self.append(prev_element, child);
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        // The doctype plays no part in diffing.
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let new_id = match new_node {
            NodeOrText::AppendNode(n) => n,
            NodeOrText::AppendText(text) => self.alloc(ParseNode::Text(text.to_string())),
        };

        let mut nodes = self.nodes.borrow_mut();
        for node in nodes.values_mut() {
            match node {
                ParseNode::Element { children, .. } | ParseNode::Document { children } => {
                    if let Some(pos) = children.iter().position(|&c| c == *sibling) {
                        children.insert(pos, new_id);
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(ParseNode::Element {
            attrs: existing, ..
        }) = nodes.get_mut(target)
        {
            for attr in attrs {
                let name = attr.name.local.to_string();
                if !existing.iter().any(|(k, _)| k == &name) {
                    existing.push((name, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        let mut nodes = self.nodes.borrow_mut();
        for node in nodes.values_mut() {
            match node {
                ParseNode::Element { children, .. } | ParseNode::Document { children } => {
                    children.retain(|&c| c != *target);
                }
                _ => {}
            }
        }
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut nodes = self.nodes.borrow_mut();
        let children = match nodes.get_mut(node) {
            Some(ParseNode::Element { children, .. }) => std::mem::take(children),
            Some(ParseNode::Document { children }) => std::mem::take(children),
            _ => return,
        };
        match nodes.get_mut(new_parent) {
            Some(ParseNode::Element {
                children: new_children,
                ..
            }) => new_children.extend(children),
            Some(ParseNode::Document {
                children: new_children,
            }) => new_children.extend(children),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_body() {
        let body = parse_body("<html><body><p>Hello</p></body></html>");
        assert_eq!(body.tag, "body");
        assert_eq!(body.children.len(), 1);
        let p = body.children[0].as_element().expect("expected element");
        assert_eq!(p.tag, "p");
        assert_eq!(p.children[0].as_text(), Some("Hello"));
    }

    #[test]
    fn parses_fragment_without_wrapper() {
        // html5ever synthesizes html/body around bare fragments.
        let body = parse_body("<div id=\"box\"><span>x</span></div>");
        assert_eq!(body.children.len(), 1);
        let div = body.children[0].as_element().expect("expected element");
        assert_eq!(div.tag, "div");
        assert_eq!(div.get_attr("id"), Some("box"));
    }

    #[test]
    fn whitespace_text_nodes_are_preserved() {
        let body = parse_body("<html><body><ul>\n  <li>A</li>\n</ul></body></html>");
        let ul = body.children[0].as_element().expect("expected element");
        // text, li, text
        assert_eq!(ul.children.len(), 3);
    }

    #[test]
    fn adjacent_text_is_merged() {
        let body = parse_body("<html><body><p>a<!--c-->b</p></body></html>");
        let p = body.children[0].as_element().expect("expected element");
        // The comment splits the text in two.
        assert_eq!(p.children.len(), 3);
        assert_eq!(p.children[0].as_text(), Some("a"));
        assert!(matches!(p.children[1], Node::Comment(_)));
        assert_eq!(p.children[2].as_text(), Some("b"));
    }

    #[test]
    fn missing_body_yields_empty_element() {
        let body = parse_body("");
        assert_eq!(body.tag, "body");
        assert!(body.children.is_empty());
    }
}
