// ABOUTME: Translation of a document tree into reveal.js slide markup
// ABOUTME: Produces the title, subtitle, meta tags and slide body of a document

use crate::doctree::Node;
use quick_xml::escape::escape;

/// Rendered pieces of a document the page shell is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parts {
    /// Plain text; escaped wherever it is written into markup.
    pub title: String,
    pub subtitle: String,
    pub body: String,
    /// `<meta>` tags declared by the document.
    pub meta: String,
}

/// Elements that carry metadata or nothing visible.
const SKIPPED: [&str; 8] = [
    "docinfo",
    "title",
    "subtitle",
    "substitution_definition",
    "comment",
    "target",
    "meta",
    "system_message",
];

/// Topics lifted into settings instead of being shown.
const METADATA_TOPICS: [&str; 2] = ["abstract", "dedication"];

impl Parts {
    /// Render every part of `document`.
    pub fn from_tree(document: &Node) -> Self {
        let title = document.child("title").map(Node::text).unwrap_or_default();
        let subtitle = document
            .child("subtitle")
            .map(Node::text)
            .unwrap_or_default();

        let meta = document
            .find_all("meta")
            .into_iter()
            .map(meta_tag)
            .collect::<Vec<_>>()
            .join("\n");

        let mut body = String::new();
        for child in document.children() {
            render_node(child, 0, &mut body);
        }

        Self {
            title,
            subtitle,
            body,
            meta,
        }
    }
}

fn meta_tag(node: &Node) -> String {
    let mut tag = String::from("<meta");
    if let Node::Element { attributes, .. } = node {
        for (name, value) in attributes {
            tag.push_str(&format!(r#" {}="{}""#, name, escape(value.as_str())));
        }
    }
    tag.push_str(" />");
    tag
}

fn render_children(node: &Node, depth: usize, out: &mut String) {
    for child in node.children() {
        render_node(child, depth, out);
    }
}

fn wrap(tag: &str, node: &Node, depth: usize, out: &mut String) {
    out.push_str(&format!("<{}>", tag));
    render_children(node, depth, out);
    out.push_str(&format!("</{}>", tag));
}

/// Render one node. `depth` counts enclosing sections.
fn render_node(node: &Node, depth: usize, out: &mut String) {
    let tag = match node {
        Node::Text(text) => {
            out.push_str(&escape(text.as_str()));
            return;
        }
        Node::Element { tag, .. } => tag.as_str(),
    };

    if SKIPPED.contains(&tag) {
        return;
    }

    match tag {
        "section" => {
            let id = node.attribute("ids").unwrap_or("");
            if id.is_empty() {
                out.push_str("<section>\n");
            } else {
                out.push_str(&format!("<section id=\"{}\">\n", escape(id)));
            }
            if let Some(title) = node.child("title") {
                let level = (depth + 2).min(6);
                out.push_str(&format!("<h{}>", level));
                render_children(title, depth, out);
                out.push_str(&format!("</h{}>\n", level));
            }
            render_children(node, depth + 1, out);
            out.push_str("</section>\n");
        }
        "topic" => {
            let class = node.classes().to_lowercase();
            if !METADATA_TOPICS.contains(&class.as_str()) {
                out.push_str(&format!("<div class=\"topic {}\">", escape(class.as_str())));
                render_children(node, depth, out);
                out.push_str("</div>\n");
            }
        }
        "paragraph" => {
            wrap("p", node, depth, out);
            out.push('\n');
        }
        "emphasis" => wrap("em", node, depth, out),
        "strong" => wrap("strong", node, depth, out),
        "literal" => wrap("code", node, depth, out),
        "subscript" => wrap("sub", node, depth, out),
        "superscript" => wrap("sup", node, depth, out),
        "block_quote" => wrap("blockquote", node, depth, out),
        "bullet_list" => {
            wrap("ul", node, depth, out);
            out.push('\n');
        }
        "enumerated_list" => {
            wrap("ol", node, depth, out);
            out.push('\n');
        }
        "list_item" => wrap("li", node, depth, out),
        "literal_block" => {
            out.push_str("<pre><code>");
            out.push_str(&escape(node.text().as_str()));
            out.push_str("</code></pre>\n");
        }
        "reference" => {
            let href = node.attribute("refuri").unwrap_or("#");
            out.push_str(&format!("<a href=\"{}\">", escape(href)));
            render_children(node, depth, out);
            out.push_str("</a>");
        }
        "image" => {
            let uri = node.attribute("uri").unwrap_or("");
            let alt = node.attribute("alt").unwrap_or("");
            out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" />",
                escape(uri),
                escape(alt)
            ));
        }
        "raw" => {
            if node.attribute("format").is_some_and(|f| f.split_whitespace().any(|f| f == "html")) {
                out.push_str(&node.text());
            }
        }
        "transition" => out.push_str("<hr />\n"),
        "note" | "warning" | "tip" | "important" | "attention" | "caution" | "danger"
        | "hint" | "error" | "admonition" => {
            out.push_str(&format!("<div class=\"admonition {}\">", tag));
            render_children(node, depth, out);
            out.push_str("</div>\n");
        }
        _ => render_children(node, depth, out),
    }
}
