// ABOUTME: Document parser collaborators turning source text into a tree
// ABOUTME: Reads docutils XML with quick-xml or runs an external docutils writer

use crate::doctree::Node;
use crate::errors::{Result, SlideError};
use indexmap::IndexMap;
use log::{debug, info};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::process::{Command, Stdio};

/// Anything that can turn markup source into a document tree.
pub trait DocumentParser {
    fn parse(&self, source: &str) -> Result<Node>;
}

/// Parser for the docutils XML serialization of a doctree.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlParser;

impl XmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for XmlParser {
    fn parse(&self, source: &str) -> Result<Node> {
        let mut reader = Reader::from_str(source);
        // Stack of open elements; the bottom entry collects the root.
        let mut stack: Vec<Node> = vec![Node::element("#root", Vec::new())];

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(open_element(&e)?),
                Event::Empty(e) => {
                    let node = open_element(&e)?;
                    push_child(&mut stack, node);
                }
                Event::End(_) => {
                    if stack.len() < 2 {
                        return Err(SlideError::ParseError(format!(
                            "unbalanced end tag at byte {}",
                            reader.buffer_position()
                        )));
                    }
                    if let Some(node) = stack.pop() {
                        push_child(&mut stack, node);
                    }
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    // Whitespace between block elements is formatting; inside
                    // text-bearing elements it is content.
                    if !(text.trim().is_empty() && in_structural_element(&stack)) {
                        push_child(&mut stack, Node::Text(text.into_owned()));
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    push_child(&mut stack, Node::Text(text));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() != 1 {
            return Err(SlideError::ParseError(format!(
                "{} element(s) left unclosed",
                stack.len() - 1
            )));
        }
        let root = stack.pop().map(|r| r.children().to_vec()).unwrap_or_default();
        root.into_iter()
            .find(|n| n.tag().is_some())
            .ok_or_else(|| SlideError::ParseError("document has no root element".to_string()))
    }
}

fn open_element(e: &BytesStart) -> Result<Node> {
    let tag = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| SlideError::ParseError(format!("invalid tag name: {}", err)))?
        .to_string();
    let mut attributes = IndexMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.insert(key, value);
    }
    Ok(Node::Element {
        tag,
        attributes,
        children: Vec::new(),
    })
}

/// Docutils elements whose children are elements only.
const STRUCTURAL_ELEMENTS: &[&str] = &[
    "#root",
    "document",
    "section",
    "topic",
    "sidebar",
    "docinfo",
    "authors",
    "field_list",
    "field",
    "field_body",
    "bullet_list",
    "enumerated_list",
    "list_item",
    "definition_list",
    "definition_list_item",
    "definition",
    "block_quote",
    "compound",
    "container",
    "figure",
    "table",
    "tgroup",
    "thead",
    "tbody",
    "row",
    "entry",
    "footnote",
    "citation",
    "option_list",
    "option_list_item",
    "admonition",
    "note",
];

fn in_structural_element(stack: &[Node]) -> bool {
    stack
        .last()
        .and_then(Node::tag)
        .is_some_and(|tag| STRUCTURAL_ELEMENTS.contains(&tag))
}

fn push_child(stack: &mut [Node], node: Node) {
    if let Some(Node::Element { children, .. }) = stack.last_mut() {
        children.push(node);
    }
}

/// Runs an external docutils XML writer and parses its output.
#[derive(Debug, Clone)]
pub struct Docutils {
    command: String,
}

impl Docutils {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }

    /// Whether the writer command can be found on the PATH.
    pub fn is_available(&self) -> bool {
        which::which(&self.command).is_ok()
    }
}

impl Default for Docutils {
    fn default() -> Self {
        Self::new("rst2xml")
    }
}

impl DocumentParser for Docutils {
    fn parse(&self, source: &str) -> Result<Node> {
        let program = which::which(&self.command).map_err(|e| {
            SlideError::ParserUnavailable(format!("`{}` not found: {}", self.command, e))
        })?;
        info!("Parsing document with {:?}", program);

        let mut child = Command::new(&program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes())?;
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(SlideError::ParseError(format!(
                "`{}` failed ({}): {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let xml = String::from_utf8(output.stdout)
            .map_err(|e| SlideError::ParseError(format!("non UTF-8 parser output: {}", e)))?;
        debug!("docutils produced {} bytes of XML", xml.len());
        XmlParser.parse(&xml)
    }
}
