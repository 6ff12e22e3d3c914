// ABOUTME: Generic document tree produced by the document parsers
// ABOUTME: Provides text collection and descendant lookup over typed nodes

use indexmap::IndexMap;

/// A node of a parsed document: either a tagged element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        children: Vec<Node>,
    },
    Text(String),
}

impl Node {
    /// Create an element without attributes.
    pub fn element(tag: &str, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.to_string(),
            attributes: IndexMap::new(),
            children,
        }
    }

    pub fn text_node(text: &str) -> Self {
        Node::Text(text.to_string())
    }

    /// Builder-style attribute setter; a no-op on text nodes.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        if let Node::Element { attributes, .. } = &mut self {
            attributes.insert(name.to_string(), value.to_string());
        }
        self
    }

    /// Tag name, or `None` for text.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element { tag, .. } => Some(tag),
            Node::Text(_) => None,
        }
    }

    pub fn is_element(&self, name: &str) -> bool {
        self.tag() == Some(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Node::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            Node::Text(_) => None,
        }
    }

    /// The raw `classes` attribute, empty when absent.
    pub fn classes(&self) -> &str {
        self.attribute("classes").unwrap_or("")
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element { children, .. } => children,
            Node::Text(_) => &[],
        }
    }

    /// Child elements only, skipping text runs.
    pub fn child_elements(&self) -> impl Iterator<Item = &Node> {
        self.children().iter().filter(|c| c.tag().is_some())
    }

    /// The first child that is an element.
    pub fn first_element(&self) -> Option<&Node> {
        self.child_elements().next()
    }

    /// First direct child element with the given tag.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().iter().find(|c| c.is_element(name))
    }

    /// Depth-first concatenation of every text run beneath this node.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Every descendant element with the given tag, in document order.
    /// The node itself is not included.
    pub fn find_all(&self, name: &str) -> Vec<&Node> {
        let mut found = Vec::new();
        for child in self.children() {
            child.find_into(name, &mut found);
        }
        found
    }

    fn find_into<'a>(&'a self, name: &str, found: &mut Vec<&'a Node>) {
        if self.is_element(name) {
            found.push(self);
        }
        for child in self.children() {
            child.find_into(name, found);
        }
    }
}
