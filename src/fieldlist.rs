// ABOUTME: Built-in reader for field-list documents such as theme files
// ABOUTME: Handles fields, bullet bodies, substitution definitions and escapes

use crate::doctree::Node;
use crate::errors::Result;
use crate::parser::DocumentParser;
use indexmap::IndexMap;
use log::warn;

const SUBSTITUTION_DIRECTIVE: &str = "replace::";
const BULLETS: [&str; 3] = ["- ", "* ", "+ "];

/// Reads documents made of field lists, substitution definitions and plain
/// paragraphs. The field list that comes before any paragraph becomes the
/// `docinfo` block, mirroring how docutils treats a leading field list.
#[derive(Debug, Clone, Default)]
pub struct FieldListParser {
    substitutions: IndexMap<String, String>,
}

#[derive(Debug)]
enum Block {
    Field { name: String, body: Vec<String> },
    Substitution { name: String, text: String },
    Paragraph(Vec<String>),
}

impl FieldListParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed substitutions that references resolve against. Definitions in
    /// the parsed source take precedence.
    pub fn with_substitutions(mut self, substitutions: IndexMap<String, String>) -> Self {
        self.substitutions = substitutions;
        self
    }

    fn blocks(source: &str) -> Vec<Block> {
        let lines: Vec<&str> = source.lines().collect();
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            if line.trim().is_empty() {
                i += 1;
                continue;
            }

            if line.starts_with(char::is_whitespace) {
                // Stray indented text with no owner reads as a paragraph.
                let (para, next) = paragraph_lines(&lines, i);
                blocks.push(Block::Paragraph(para));
                i = next;
                continue;
            }

            if let Some(rest) = line.strip_prefix("..") {
                let (continuation, next) = indented_lines(&lines, i + 1);
                if let Some((name, first)) = substitution_definition(rest) {
                    let mut text = vec![first.to_string()];
                    text.extend(continuation.iter().map(|l| l.trim().to_string()));
                    let text = text
                        .into_iter()
                        .filter(|l| !l.is_empty())
                        .collect::<Vec<_>>()
                        .join("\n");
                    blocks.push(Block::Substitution { name, text });
                }
                // Any other explicit markup is a comment here.
                i = next;
                continue;
            }

            if let Some((name, rest)) = field_marker(line) {
                let (continuation, next) = indented_lines(&lines, i + 1);
                let mut body = Vec::new();
                if !rest.trim().is_empty() {
                    body.push(rest.trim().to_string());
                }
                body.extend(continuation.iter().map(|l| l.trim().to_string()));
                while body.last().is_some_and(|l| l.is_empty()) {
                    body.pop();
                }
                blocks.push(Block::Field { name, body });
                i = next;
                continue;
            }

            let (para, next) = paragraph_lines(&lines, i);
            blocks.push(Block::Paragraph(para));
            i = next;
        }

        blocks
    }

    /// Resolve escapes and substitution references in a run of text.
    fn inline(&self, text: &str, defined: &IndexMap<String, String>) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    // Escaped whitespace disappears entirely.
                    Some(' ') | Some('\n') | None => {}
                    Some(other) => out.push(other),
                },
                '|' => {
                    let mut name = String::new();
                    let mut closed = false;
                    while let Some(&n) = chars.peek() {
                        chars.next();
                        if n == '|' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    let valid = closed && !name.is_empty() && name.trim() == name;
                    match defined.get(&name).or_else(|| self.substitutions.get(&name)) {
                        Some(value) if valid => out.push_str(value),
                        _ => {
                            if valid {
                                warn!("Undefined substitution reference |{}|", name);
                            }
                            out.push('|');
                            out.push_str(&name);
                            if closed {
                                out.push('|');
                            }
                        }
                    }
                }
                other => out.push(other),
            }
        }

        out
    }

    fn field(&self, name: &str, body: &[String], defined: &IndexMap<String, String>) -> Node {
        let name_text = self.inline(name, defined);
        let field_name = Node::element("field_name", vec![Node::Text(name_text.clone())]);

        let mut children = Vec::new();
        for chunk in body.split(|l| l.is_empty()).filter(|c| !c.is_empty()) {
            if is_bullet(&chunk[0]) {
                let mut items: Vec<Vec<&str>> = Vec::new();
                for line in chunk {
                    match strip_bullet(line) {
                        Some(item) => items.push(vec![item]),
                        None => {
                            if let Some(current) = items.last_mut() {
                                current.push(line);
                            }
                        }
                    }
                }
                let items = items
                    .into_iter()
                    .map(|lines| {
                        let text = self.inline(&lines.join("\n"), defined);
                        Node::element("list_item", vec![paragraph(text)])
                    })
                    .collect();
                children.push(Node::element("bullet_list", items));
            } else {
                children.push(paragraph(self.inline(&chunk.join("\n"), defined)));
            }
        }

        Node::element("field", vec![field_name, Node::element("field_body", children)])
    }
}

impl DocumentParser for FieldListParser {
    fn parse(&self, source: &str) -> Result<Node> {
        let blocks = Self::blocks(source);

        // Definitions apply wherever they appear in the document.
        let mut defined = IndexMap::new();
        for block in &blocks {
            if let Block::Substitution { name, text } = block {
                let value = self.inline(text, &IndexMap::new());
                defined.insert(name.clone(), value);
            }
        }

        let mut children = Vec::new();
        let mut docinfo: Option<Vec<Node>> = Some(Vec::new());
        let mut field_list: Vec<Node> = Vec::new();

        for block in &blocks {
            match block {
                Block::Field { name, body } => match docinfo.as_mut() {
                    Some(info) => info.push(self.docinfo_field(name, body, &defined)),
                    None => field_list.push(self.field(name, body, &defined)),
                },
                Block::Paragraph(lines) => {
                    if let Some(info) = docinfo.take() {
                        if !info.is_empty() {
                            children.push(Node::element("docinfo", info));
                        }
                    }
                    if !field_list.is_empty() {
                        children.push(Node::element("field_list", std::mem::take(&mut field_list)));
                    }
                    children.push(paragraph(self.inline(&lines.join("\n"), &defined)));
                }
                Block::Substitution { .. } => {}
            }
        }

        if let Some(info) = docinfo.take() {
            if !info.is_empty() {
                children.insert(0, Node::element("docinfo", info));
            }
        }
        if !field_list.is_empty() {
            children.push(Node::element("field_list", field_list));
        }

        Ok(Node::element("document", children))
    }
}

impl FieldListParser {
    /// Docinfo fields behave like plain fields except `authors`, which is
    /// split into individual `author` entries.
    fn docinfo_field(&self, name: &str, body: &[String], defined: &IndexMap<String, String>) -> Node {
        if name.trim().eq_ignore_ascii_case("authors") && !body.iter().any(|l| is_bullet(l)) {
            let text = self.inline(&body.join(" "), defined);
            let separator = if text.contains(';') { ';' } else { ',' };
            let authors = text
                .split(separator)
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(|a| Node::element("author", vec![Node::text_node(a)]))
                .collect();
            return Node::element("authors", authors);
        }
        self.field(name, body, defined)
    }
}

fn paragraph(text: String) -> Node {
    Node::element("paragraph", vec![Node::Text(text)])
}

/// `:name: rest` at the start of a line.
fn field_marker(line: &str) -> Option<(String, &str)> {
    let inner = line.strip_prefix(':')?;
    let mut escaped = false;
    for (idx, c) in inner.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            ':' if !escaped => {
                let name = &inner[..idx];
                let rest = &inner[idx + 1..];
                if name.is_empty() || !(rest.is_empty() || rest.starts_with(' ')) {
                    return None;
                }
                return Some((name.to_string(), rest));
            }
            _ => escaped = false,
        }
    }
    None
}

/// ` |name| replace:: text` after the leading `..`.
fn substitution_definition(rest: &str) -> Option<(String, &str)> {
    let rest = rest.strip_prefix(' ')?.trim_start();
    let rest = rest.strip_prefix('|')?;
    let end = rest.find('|')?;
    let name = &rest[..end];
    let text = rest[end + 1..].trim_start().strip_prefix(SUBSTITUTION_DIRECTIVE)?;
    // One separating space belongs to the directive, the rest to the text.
    Some((name.to_string(), text.strip_prefix(' ').unwrap_or(text)))
}

/// Indented (or blank) lines following `start`, with trailing blanks kept
/// out of the block.
fn indented_lines<'a>(lines: &[&'a str], start: usize) -> (Vec<&'a str>, usize) {
    let mut end = start;
    let mut last_content = start;
    while end < lines.len() {
        let line = lines[end];
        if line.trim().is_empty() {
            end += 1;
            continue;
        }
        if !line.starts_with(char::is_whitespace) {
            break;
        }
        end += 1;
        last_content = end;
    }
    (lines[start..last_content].to_vec(), last_content)
}

/// Lines up to the next blank line.
fn paragraph_lines(lines: &[&str], start: usize) -> (Vec<String>, usize) {
    let mut end = start;
    while end < lines.len() && !lines[end].trim().is_empty() {
        end += 1;
    }
    (lines[start..end].iter().map(|l| l.trim().to_string()).collect(), end)
}

fn is_bullet(line: &str) -> bool {
    strip_bullet(line).is_some()
}

fn strip_bullet(line: &str) -> Option<&str> {
    BULLETS.iter().find_map(|b| line.strip_prefix(b))
}
