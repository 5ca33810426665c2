//! Untyped DOM types for HTML parsing and diffing.
//!
//! A simple Element/Text/Comment tree that doesn't enforce content model
//! rules: it represents any HTML that browsers accept, which is exactly
//! what the diff engine wants to consume.

use indexmap::IndexMap;

/// DOM content - an element, a text node, or a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element node
    Element(Element),
    /// A text node
    Text(String),
    /// A comment node
    Comment(String),
}

impl Node {
    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// Get as element reference.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get as text reference.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// An HTML element.
///
/// Attributes preserve insertion order but compare order-independently,
/// matching how browsers treat attribute maps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// The tag name
    pub tag: String,
    /// Attributes as key-value pairs (preserves insertion order)
    pub attrs: IndexMap<String, String>,
    /// Child nodes
    pub children: Vec<Node>,
}

impl Element {
    /// Create a new element with the given tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Get an attribute value.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|v| v.as_str())
    }

    /// Set an attribute value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Add a child node.
    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Add a text child.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// Add an element child.
    pub fn push_element(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    /// Get text content of this element and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
                Node::Comment(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_equality_ignores_order() {
        let mut a = Element::new("div");
        a.set_attr("id", "x");
        a.set_attr("class", "y");

        let mut b = Element::new("div");
        b.set_attr("class", "y");
        b.set_attr("id", "x");

        assert_eq!(a, b);
    }

    #[test]
    fn element_text_content() {
        let mut div = Element::new("div");
        div.push_text("Hello ");
        let mut span = Element::new("span");
        span.push_text("world");
        div.push_element(span);
        div.push_text("!");

        assert_eq!(div.text_content(), "Hello world!");
    }
}
