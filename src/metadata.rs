// ABOUTME: Metadata extraction from docinfo blocks and classed topics
// ABOUTME: Folds field lists into the settings store using suffix dispatch

use crate::doctree::Node;
use crate::errors::{Result, SlideError};
use crate::settings::Settings;
use log::debug;

const LIST_SUFFIX: &str = "-list";
const LIST_ADD_SUFFIX: &str = "-list-add";

/// Topic classes whose text is stored under the class name.
const METADATA_TOPICS: [&str; 2] = ["abstract", "dedication"];

/// What a docinfo field does to the settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOp {
    /// `name-list`: replace `name` with a list.
    Replace(String),
    /// `name-list-add`: append to the list at `name`.
    Append(String),
    /// Anything else: replace `name` with the body text.
    Scalar(String),
}

impl FieldOp {
    /// Classify a field by its name, lower-casing it first.
    pub fn classify(field_name: &str) -> Self {
        let name = field_name.trim().to_lowercase();
        if let Some(key) = name.strip_suffix(LIST_ADD_SUFFIX) {
            FieldOp::Append(key.to_string())
        } else if let Some(key) = name.strip_suffix(LIST_SUFFIX) {
            FieldOp::Replace(key.to_string())
        } else {
            FieldOp::Scalar(name)
        }
    }

    pub fn key(&self) -> &str {
        match self {
            FieldOp::Replace(key) | FieldOp::Append(key) | FieldOp::Scalar(key) => key,
        }
    }
}

/// A value recovered from one docinfo child, before it is folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataEntry {
    Scalar { key: String, value: String },
    List { key: String, items: Vec<String> },
    Append { key: String, items: Vec<String> },
    Authors(Vec<String>),
}

impl MetadataEntry {
    /// Fold this entry into the settings store.
    pub fn apply(self, settings: &mut Settings) {
        match self {
            MetadataEntry::Scalar { key, value } => settings.set(&key, value),
            MetadataEntry::List { key, items } => settings.set(&key, items),
            MetadataEntry::Append { key, items } => settings.append(&key, items),
            MetadataEntry::Authors(authors) => settings.set("authors", authors),
        }
    }
}

/// Extract metadata from every docinfo block and every abstract or
/// dedication topic of `tree` into `settings`.
pub fn extract(tree: &Node, settings: &mut Settings) -> Result<()> {
    for docinfo in tree.find_all("docinfo") {
        for child in docinfo.child_elements() {
            let entry = read_docinfo_child(child)?;
            debug!("docinfo entry: {:?}", entry);
            entry.apply(settings);
        }
    }

    for topic in tree.find_all("topic") {
        let class = topic.classes().to_lowercase();
        if METADATA_TOPICS.contains(&class.as_str()) {
            settings.set(&class, topic.text());
        }
    }

    Ok(())
}

/// Read one direct child of a docinfo block.
pub fn read_docinfo_child(child: &Node) -> Result<MetadataEntry> {
    match child.tag() {
        Some("authors") => {
            let authors: Vec<String> = child
                .child_elements()
                .filter(|c| c.is_element("author"))
                .map(Node::text)
                .collect();
            if authors.is_empty() {
                return Err(SlideError::malformed("authors", "no author entries"));
            }
            Ok(MetadataEntry::Authors(authors))
        }
        Some("field") => read_field(child),
        Some(tag) => Ok(MetadataEntry::Scalar {
            key: tag.to_string(),
            value: child.text(),
        }),
        None => Err(SlideError::ParseError(
            "text node passed as a docinfo child".to_string(),
        )),
    }
}

fn read_field(field: &Node) -> Result<MetadataEntry> {
    let name = field
        .child("field_name")
        .ok_or_else(|| SlideError::malformed("<unnamed>", "field has no field_name"))?
        .text();
    let body = field
        .child("field_body")
        .ok_or_else(|| SlideError::malformed(&name, "field has no field_body"))?;

    Ok(match FieldOp::classify(&name) {
        FieldOp::Replace(key) => MetadataEntry::List {
            items: list_items(&name, body)?,
            key,
        },
        FieldOp::Append(key) => MetadataEntry::Append {
            items: list_items(&name, body)?,
            key,
        },
        FieldOp::Scalar(key) => MetadataEntry::Scalar {
            key,
            value: body.text(),
        },
    })
}

/// Items of a list-valued field body: one per bullet when the body opens
/// with a bullet list, otherwise the whole body text as a single item.
fn list_items(field_name: &str, body: &Node) -> Result<Vec<String>> {
    let first = body
        .first_element()
        .ok_or_else(|| SlideError::malformed(field_name, "list field has an empty body"))?;

    if first.is_element("bullet_list") {
        Ok(first
            .child_elements()
            .filter(|item| item.is_element("list_item"))
            .map(Node::text)
            .collect())
    } else {
        Ok(vec![body.text()])
    }
}
